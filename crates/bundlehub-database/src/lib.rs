//! SQLite connection management, composable query filters, and the
//! bundle store for BundleHub.

pub mod connection;
pub mod filters;
pub mod migration;
pub mod store;

pub use filters::FilterParams;
pub use store::Store;
