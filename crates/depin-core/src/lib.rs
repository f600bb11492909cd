pub mod catalog;
pub mod config;
pub mod types;

pub use catalog::{Catalog, CatalogError, CatalogResult};
pub use config::HubConfig;
pub use types::*;
