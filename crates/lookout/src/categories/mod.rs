//! News category filter.
//!
//! Renders a hierarchical, multi-select category navigation whose state
//! lives in a single URL path segment.

mod catalog;
mod filter;
mod url;

pub use catalog::{Catalog, InMemoryCatalog};
pub use filter::CategoryTreeFilter;
pub use url::TargetPage;

#[cfg(test)]
pub(crate) use catalog::testing;
