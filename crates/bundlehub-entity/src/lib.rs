//! Domain entity models and request schemas for BundleHub.

pub mod archive;
pub mod bundle;
pub mod file;
pub mod request;
pub mod tag;
pub mod version;

pub use archive::Archive;
pub use bundle::Bundle;
pub use file::BundleFile;
pub use request::{BundleRequest, FileSpec, PathSpec};
pub use tag::Tag;
pub use version::Version;
