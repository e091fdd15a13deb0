// Employee directory: fixed dataset and the queries exposed as tools

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full employee record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub title: String,
    pub manager: Option<String>,
    pub hire_date: String,
    pub status: String,
    pub location: String,
    pub phone: String,
    pub salary_band: String,
    pub benefits: Vec<String>,
    pub access_level: String,
    pub last_login: String,
}

/// Subset of an employee record returned by listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub title: String,
    pub manager: Option<String>,
    pub status: String,
}

impl From<&Employee> for EmployeeSummary {
    fn from(employee: &Employee) -> Self {
        Self {
            employee_id: employee.employee_id.clone(),
            name: employee.name.clone(),
            department: employee.department.clone(),
            title: employee.title.clone(),
            manager: employee.manager.clone(),
            status: employee.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    /// Display name; may differ from the lookup key ("HR" is "Human Resources")
    pub name: String,
    pub head: String,
    pub employee_count: u32,
    pub budget: u64,
    pub budget_used: u64,
    pub location: String,
    pub description: String,
    pub teams: u32,
    pub hiring_plan: u32,
    pub avg_tenure_years: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitEnrollment {
    pub name: String,
    pub enrollment_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitsSummary {
    pub benefits: Vec<BenefitEnrollment>,
    pub total_unique_benefits: usize,
    pub total_employees: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryBand {
    pub employees: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingPhase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingProcess {
    pub pre_boarding: OnboardingPhase,
    pub first_day: OnboardingPhase,
    pub first_week: OnboardingPhase,
    pub first_month: OnboardingPhase,
}

/// Status filter value that matches every record
pub const ALL_STATUSES: &str = "All";

/// Read-only employee directory
#[derive(Debug, Clone)]
pub struct Directory {
    employees: Vec<Employee>,
    departments: Vec<(String, Department)>,
}

impl Directory {
    pub fn new(employees: Vec<Employee>, departments: Vec<(String, Department)>) -> Self {
        Self {
            employees,
            departments,
        }
    }

    /// The built-in dataset of fifteen employees across seven departments
    pub fn fixture() -> Self {
        let employees = EMPLOYEES.iter().map(EmployeeRow::to_employee).collect();
        let departments = DEPARTMENTS
            .iter()
            .map(|row| (row.key.to_string(), row.to_department()))
            .collect();
        Self::new(employees, departments)
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Employees whose status equals `status_filter`, or every employee for `"All"`
    pub fn list_employees(&self, status_filter: &str) -> Vec<EmployeeSummary> {
        self.employees
            .iter()
            .filter(|e| status_filter == ALL_STATUSES || e.status == status_filter)
            .map(EmployeeSummary::from)
            .collect()
    }

    /// Find by employee id (case-insensitive, exact) first, then by name substring
    pub fn find_employee(&self, identifier: &str) -> Option<&Employee> {
        let needle = identifier.to_lowercase();

        self.employees
            .iter()
            .find(|e| e.employee_id.to_lowercase() == needle)
            .or_else(|| {
                self.employees
                    .iter()
                    .find(|e| e.name.to_lowercase().contains(&needle))
            })
    }

    /// Department by its exact key, e.g. `"HR"`
    pub fn department(&self, key: &str) -> Option<&Department> {
        self.departments
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, department)| department)
    }

    pub fn departments(&self) -> impl Iterator<Item = &Department> {
        self.departments.iter().map(|(_, department)| department)
    }

    pub fn department_keys(&self) -> impl Iterator<Item = &str> {
        self.departments.iter().map(|(key, _)| key.as_str())
    }

    /// Enrollment count per benefit, sorted by benefit name
    pub fn benefits_summary(&self) -> BenefitsSummary {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for benefit in self.employees.iter().flat_map(|e| &e.benefits) {
            *counts.entry(benefit.as_str()).or_default() += 1;
        }

        BenefitsSummary {
            total_unique_benefits: counts.len(),
            total_employees: self.employees.len(),
            benefits: counts
                .into_iter()
                .map(|(name, enrollment_count)| BenefitEnrollment {
                    name: name.to_string(),
                    enrollment_count,
                })
                .collect(),
        }
    }

    /// Employee names grouped by salary band
    pub fn salary_bands(&self) -> BTreeMap<String, SalaryBand> {
        let mut bands: BTreeMap<String, SalaryBand> = BTreeMap::new();
        for employee in &self.employees {
            let band = bands
                .entry(employee.salary_band.clone())
                .or_insert_with(|| SalaryBand {
                    employees: Vec::new(),
                    count: 0,
                });
            band.employees.push(employee.name.clone());
            band.count += 1;
        }
        bands
    }

    pub fn onboarding_process(&self) -> OnboardingProcess {
        let phase = |timeline: Option<&str>, steps: &[&str]| OnboardingPhase {
            timeline: timeline.map(str::to_string),
            steps: steps.iter().map(|s| s.to_string()).collect(),
        };

        OnboardingProcess {
            pre_boarding: phase(
                Some("1 week before start date"),
                &[
                    "Send welcome email with company information",
                    "Set up IT accounts and access",
                    "Schedule orientation session",
                ],
            ),
            first_day: phase(
                None,
                &[
                    "Complete HR paperwork",
                    "IT setup and equipment assignment",
                    "Department introduction",
                ],
            ),
            first_week: phase(
                None,
                &["Training sessions", "Buddy assignment", "Goal setting meeting"],
            ),
            first_month: phase(
                None,
                &[
                    "Regular check-ins",
                    "Performance review setup",
                    "Benefits enrollment",
                ],
            ),
        }
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::fixture()
    }
}

struct EmployeeRow {
    number: u32,
    name: &'static str,
    department: &'static str,
    title: &'static str,
    manager: Option<&'static str>,
    hire_date: &'static str,
    location: &'static str,
    salary_band: &'static str,
    benefits: &'static [&'static str],
    access_level: &'static str,
    last_login: &'static str,
}

impl EmployeeRow {
    fn to_employee(&self) -> Employee {
        let email = format!("{}@streamward.com", self.name.to_lowercase().replace(' ', "."));
        Employee {
            id: format!("emp-{:03}", self.number),
            employee_id: format!("EMP{:03}", self.number),
            name: self.name.to_string(),
            email,
            department: self.department.to_string(),
            title: self.title.to_string(),
            manager: self.manager.map(str::to_string),
            hire_date: self.hire_date.to_string(),
            status: "Active".to_string(),
            location: self.location.to_string(),
            phone: format!("+1-555-{:04}", 100 + self.number),
            salary_band: self.salary_band.to_string(),
            benefits: self.benefits.iter().map(|b| b.to_string()).collect(),
            access_level: self.access_level.to_string(),
            last_login: self.last_login.to_string(),
        }
    }
}

struct DepartmentRow {
    key: &'static str,
    name: &'static str,
    head: &'static str,
    employee_count: u32,
    budget: u64,
    budget_used: u64,
    location: &'static str,
    description: &'static str,
    teams: u32,
    hiring_plan: u32,
    avg_tenure_years: f64,
}

impl DepartmentRow {
    fn to_department(&self) -> Department {
        Department {
            name: self.name.to_string(),
            head: self.head.to_string(),
            employee_count: self.employee_count,
            budget: self.budget,
            budget_used: self.budget_used,
            location: self.location.to_string(),
            description: self.description.to_string(),
            teams: self.teams,
            hiring_plan: self.hiring_plan,
            avg_tenure_years: self.avg_tenure_years,
        }
    }
}

const SF: &str = "San Francisco, CA";
const NY: &str = "New York, NY";
const AUSTIN: &str = "Austin, TX";
const CHICAGO: &str = "Chicago, IL";

const EMPLOYEES: &[EmployeeRow] = &[
    EmployeeRow {
        number: 1,
        name: "Jane Doe",
        department: "Engineering",
        title: "VP of Engineering",
        manager: None,
        hire_date: "2019-06-01",
        location: SF,
        salary_band: "L7",
        benefits: &["Health Insurance", "401k", "Stock Options", "Executive Bonus"],
        access_level: "Admin",
        last_login: "2025-11-09T14:30:00Z",
    },
    EmployeeRow {
        number: 2,
        name: "John Smith",
        department: "Engineering",
        title: "Senior Software Engineer",
        manager: Some("Jane Doe"),
        hire_date: "2022-03-15",
        location: SF,
        salary_band: "L5",
        benefits: &["Health Insurance", "401k", "Stock Options", "Gym Membership"],
        access_level: "Standard",
        last_login: "2025-11-09T09:30:00Z",
    },
    EmployeeRow {
        number: 3,
        name: "Alice Kumar",
        department: "Engineering",
        title: "Software Engineer (Backend)",
        manager: Some("John Smith"),
        hire_date: "2023-07-20",
        location: SF,
        salary_band: "L4",
        benefits: &["Health Insurance", "401k", "Stock Options"],
        access_level: "Standard",
        last_login: "2025-11-09T10:15:00Z",
    },
    EmployeeRow {
        number: 4,
        name: "Marcus Thompson",
        department: "Engineering",
        title: "DevOps Engineer",
        manager: Some("Jane Doe"),
        hire_date: "2021-11-01",
        location: "Seattle, WA",
        salary_band: "L5",
        benefits: &["Health Insurance", "401k", "Stock Options", "Remote Work"],
        access_level: "Admin",
        last_login: "2025-11-09T08:45:00Z",
    },
    EmployeeRow {
        number: 5,
        name: "Mike Wilson",
        department: "Finance",
        title: "CFO",
        manager: None,
        hire_date: "2020-01-15",
        location: NY,
        salary_band: "L7",
        benefits: &[
            "Health Insurance",
            "401k",
            "Stock Options",
            "Executive Bonus",
            "Company Car",
        ],
        access_level: "Admin",
        last_login: "2025-11-09T15:00:00Z",
    },
    EmployeeRow {
        number: 6,
        name: "Sarah Johnson",
        department: "Finance",
        title: "Senior Financial Analyst",
        manager: Some("Mike Wilson"),
        hire_date: "2021-08-20",
        location: NY,
        salary_band: "L5",
        benefits: &["Health Insurance", "401k", "Stock Options", "Tuition Reimbursement"],
        access_level: "Standard",
        last_login: "2025-11-09T09:00:00Z",
    },
    EmployeeRow {
        number: 7,
        name: "Priya Patel",
        department: "Finance",
        title: "Controller",
        manager: Some("Mike Wilson"),
        hire_date: "2019-03-10",
        location: NY,
        salary_band: "L6",
        benefits: &["Health Insurance", "401k", "Stock Options", "Executive Bonus"],
        access_level: "Admin",
        last_login: "2025-11-09T11:30:00Z",
    },
    EmployeeRow {
        number: 8,
        name: "Lisa Brown",
        department: "HR",
        title: "Chief People Officer",
        manager: None,
        hire_date: "2018-09-05",
        location: AUSTIN,
        salary_band: "L7",
        benefits: &["Health Insurance", "401k", "Stock Options", "Executive Bonus"],
        access_level: "Admin",
        last_login: "2025-11-09T13:45:00Z",
    },
    EmployeeRow {
        number: 9,
        name: "David Chen",
        department: "HR",
        title: "HR Business Partner",
        manager: Some("Lisa Brown"),
        hire_date: "2020-11-10",
        location: AUSTIN,
        salary_band: "L5",
        benefits: &["Health Insurance", "401k", "Stock Options", "Flexible PTO"],
        access_level: "Elevated",
        last_login: "2025-11-09T10:20:00Z",
    },
    EmployeeRow {
        number: 10,
        name: "Jessica Martinez",
        department: "HR",
        title: "Recruiting Manager",
        manager: Some("Lisa Brown"),
        hire_date: "2022-02-14",
        location: AUSTIN,
        salary_band: "L5",
        benefits: &["Health Insurance", "401k", "Stock Options"],
        access_level: "Elevated",
        last_login: "2025-11-09T09:45:00Z",
    },
    EmployeeRow {
        number: 11,
        name: "Robert Taylor",
        department: "Legal",
        title: "General Counsel",
        manager: None,
        hire_date: "2017-05-20",
        location: CHICAGO,
        salary_band: "L7",
        benefits: &[
            "Health Insurance",
            "401k",
            "Stock Options",
            "Executive Bonus",
            "Legal Services",
        ],
        access_level: "Admin",
        last_login: "2025-11-09T14:00:00Z",
    },
    EmployeeRow {
        number: 12,
        name: "Emily Davis",
        department: "Legal",
        title: "Senior Legal Counsel",
        manager: Some("Robert Taylor"),
        hire_date: "2023-01-05",
        location: CHICAGO,
        salary_band: "L6",
        benefits: &["Health Insurance", "401k", "Stock Options", "Legal Insurance"],
        access_level: "Elevated",
        last_login: "2025-11-09T12:30:00Z",
    },
    EmployeeRow {
        number: 13,
        name: "Rachel Green",
        department: "Product",
        title: "Head of Product",
        manager: None,
        hire_date: "2020-09-01",
        location: SF,
        salary_band: "L6",
        benefits: &["Health Insurance", "401k", "Stock Options", "Executive Bonus"],
        access_level: "Elevated",
        last_login: "2025-11-09T13:15:00Z",
    },
    EmployeeRow {
        number: 14,
        name: "Kevin Lopez",
        department: "Marketing",
        title: "Marketing Manager",
        manager: None,
        hire_date: "2021-05-15",
        location: NY,
        salary_band: "L5",
        benefits: &["Health Insurance", "401k", "Stock Options"],
        access_level: "Standard",
        last_login: "2025-11-09T10:00:00Z",
    },
    EmployeeRow {
        number: 15,
        name: "Sophia Rodriguez",
        department: "Sales",
        title: "VP of Sales",
        manager: None,
        hire_date: "2019-08-10",
        location: NY,
        salary_band: "L7",
        benefits: &[
            "Health Insurance",
            "401k",
            "Stock Options",
            "Executive Bonus",
            "Car Allowance",
        ],
        access_level: "Elevated",
        last_login: "2025-11-09T15:30:00Z",
    },
];

const DEPARTMENTS: &[DepartmentRow] = &[
    DepartmentRow {
        key: "Engineering",
        name: "Engineering",
        head: "Jane Doe",
        employee_count: 45,
        budget: 5_000_000,
        budget_used: 4_200_000,
        location: SF,
        description: "Software Development, Infrastructure, DevOps",
        teams: 5,
        hiring_plan: 8,
        avg_tenure_years: 3.2,
    },
    DepartmentRow {
        key: "Finance",
        name: "Finance",
        head: "Mike Wilson",
        employee_count: 12,
        budget: 800_000,
        budget_used: 750_000,
        location: NY,
        description: "Accounting, Financial Planning, Treasury",
        teams: 3,
        hiring_plan: 2,
        avg_tenure_years: 4.1,
    },
    DepartmentRow {
        key: "HR",
        name: "Human Resources",
        head: "Lisa Brown",
        employee_count: 8,
        budget: 400_000,
        budget_used: 380_000,
        location: AUSTIN,
        description: "Talent Acquisition, Employee Relations, Compensation & Benefits",
        teams: 3,
        hiring_plan: 3,
        avg_tenure_years: 2.8,
    },
    DepartmentRow {
        key: "Legal",
        name: "Legal",
        head: "Robert Taylor",
        employee_count: 5,
        budget: 300_000,
        budget_used: 290_000,
        location: CHICAGO,
        description: "Corporate Law, Compliance, Contracts",
        teams: 2,
        hiring_plan: 1,
        avg_tenure_years: 5.3,
    },
    DepartmentRow {
        key: "Product",
        name: "Product",
        head: "Rachel Green",
        employee_count: 12,
        budget: 900_000,
        budget_used: 850_000,
        location: SF,
        description: "Product Management, Product Strategy, UX Research",
        teams: 2,
        hiring_plan: 3,
        avg_tenure_years: 2.5,
    },
    DepartmentRow {
        key: "Marketing",
        name: "Marketing",
        head: "Kevin Lopez",
        employee_count: 15,
        budget: 1_200_000,
        budget_used: 1_050_000,
        location: NY,
        description: "Digital Marketing, Content, Brand, Demand Gen",
        teams: 4,
        hiring_plan: 2,
        avg_tenure_years: 2.1,
    },
    DepartmentRow {
        key: "Sales",
        name: "Sales",
        head: "Sophia Rodriguez",
        employee_count: 28,
        budget: 3_500_000,
        budget_used: 3_200_000,
        location: NY,
        description: "Enterprise Sales, Mid-Market, Sales Engineering",
        teams: 3,
        hiring_plan: 6,
        avg_tenure_years: 3.4,
    },
];
