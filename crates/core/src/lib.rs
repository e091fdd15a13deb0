// Core types and functionality for the employee directory MCP server

pub mod auth;
pub mod clock;
pub mod directory;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::Directory;
pub use session::{Session, SessionManager};
