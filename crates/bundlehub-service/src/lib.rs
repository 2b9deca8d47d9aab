//! Workflow layer tying the bundle store to the data root.
//!
//! The database crate never touches the filesystem; everything that
//! needs both (source-file checks, inclusion, checksum bookkeeping,
//! on-disk cleanup) lives here.

pub mod archives;
pub mod bundles;
pub mod include;

pub use archives::ArchiveService;
pub use bundles::BundleService;
pub use include::InclusionEngine;
