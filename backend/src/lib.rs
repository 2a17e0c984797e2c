//! Faceted navigation over a photo catalogue: predicates, store access,
//! facet counts, diagnostics and the HTTP route that serves pages.

pub mod api;
pub mod config;
pub mod db_utils;
pub mod error;
pub mod server_extra;

pub use api::navigate::{NavigationRequest, Navigator};
pub use config::EngineConfig;
pub use error::EngineError;
