pub mod catalog;
pub mod http;
pub mod provider;

pub use catalog::{CatalogEntry, StaticCatalog};
pub use http::HttpContentProvider;
pub use provider::ContentProvider;
