//! # Rollbook Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`cors`]: CORS allowed origins for the dashboard
//! - [`identity`]: Identity-provider token verification settings
//! - [`registry`]: Storage backend selection and student-code allocation settings
//! - [`server`]: Listener addresses
//!
//! # Example
//!
//! ```ignore
//! use rollbook_config::{CorsConfig, IdentityConfig, RegistryConfig};
//!
//! let cors = CorsConfig::from_env();
//! let identity = IdentityConfig::from_env();
//! let registry = RegistryConfig::from_env();
//! ```

pub mod cors;
pub mod identity;
pub mod registry;
pub mod server;

pub use cors::CorsConfig;
pub use identity::IdentityConfig;
pub use registry::{RegistryBackend, RegistryConfig, StudentCodeConfig};
pub use server::ServerConfig;
