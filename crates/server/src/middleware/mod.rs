pub mod auth;

pub use auth::{authenticate, Authenticated};
