// MCP (Model Context Protocol) server implementation
// Exposes the employee directory as tools to MCP clients

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::{McpHandler, StdioServer};
