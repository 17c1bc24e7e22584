//! siteconf: layered configuration resolver for static sites (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod config;
pub mod constants;
pub mod env;
pub mod layers;
pub mod logging;
pub mod models;
pub mod output;
pub mod renderer;
pub mod resolver;
pub mod schema;
