use anyhow::{Context, Result};
use employee_mcp_core::auth::{AuthSettings, TokenValidator};
use employee_mcp_core::{Directory, SessionManager};
use employee_mcp_protocol::tools::directory_registry;
use employee_mcp_protocol::McpHandler;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ListenConfig,

    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Sessions idle for longer than this are dropped; never when unset
    #[serde(default)]
    pub session_idle_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_timeout_secs: None,
        }
    }
}

/// Settings given on the command line or through the environment.
///
/// Each one that is set replaces the value from the configuration file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Host to bind to
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Identity provider domain, e.g. dev-123456.okta.com
    #[arg(long, env = "OKTA_DOMAIN")]
    pub okta_domain: Option<String>,

    /// Authorization server id under the identity provider domain
    #[arg(long, env = "OKTA_AUTHORIZATION_SERVER_ID")]
    pub authorization_server_id: Option<String>,

    /// Expected token audience; audience is not checked when unset
    #[arg(long, env = "OKTA_AUDIENCE")]
    pub audience: Option<String>,

    /// Space-separated scopes every token must carry
    #[arg(long, env = "OKTA_REQUIRED_SCOPES")]
    pub required_scopes: Option<String>,

    /// Full discovery endpoint URL, overriding the one derived from the domain
    #[arg(long, env = "OKTA_DISCOVERY_URL")]
    pub discovery_url: Option<String>,

    /// Drop sessions idle for this many seconds
    #[arg(long, env = "MCP_SESSION_IDLE_TIMEOUT_SECS")]
    pub session_idle_timeout_secs: Option<u64>,
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!(path = %config_path.display(), "Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            host,
            port,
            okta_domain,
            authorization_server_id,
            audience,
            required_scopes,
            discovery_url,
            session_idle_timeout_secs,
        } = overrides;

        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if session_idle_timeout_secs.is_some() {
            self.server.session_idle_timeout_secs = session_idle_timeout_secs;
        }
        if okta_domain.is_some() {
            self.auth.domain = okta_domain;
        }
        if let Some(id) = authorization_server_id {
            self.auth.authorization_server_id = id;
        }
        if audience.is_some() {
            self.auth.audience = audience;
        }
        if required_scopes.is_some() {
            self.auth.required_scopes = required_scopes;
        }
        if discovery_url.is_some() {
            self.auth.discovery_url = discovery_url;
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<TokenValidator>,
    pub sessions: Arc<SessionManager>,
    pub mcp: McpHandler,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let auth = config
            .auth
            .resolve()
            .context("Invalid identity provider configuration")?;

        tracing::info!(
            domain = %auth.domain,
            authorization_server_id = %auth.authorization_server_id,
            discovery_url = %auth.discovery_url,
            "Identity provider configured"
        );

        let validator =
            Arc::new(TokenValidator::new(&auth).context("Failed to create token validator")?);

        let registry = directory_registry(Arc::new(Directory::fixture()));
        for tool in registry.list_schemas() {
            tracing::info!(tool = %tool.name, "Registered tool: {}", tool.description);
        }

        Ok(Self::from_parts(
            validator,
            Arc::new(SessionManager::new()),
            McpHandler::new(Arc::new(registry)),
        ))
    }

    pub fn from_parts(
        validator: Arc<TokenValidator>,
        sessions: Arc<SessionManager>,
        mcp: McpHandler,
    ) -> Self {
        Self {
            validator,
            sessions,
            mcp,
        }
    }
}
