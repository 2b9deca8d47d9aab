//! Filesystem layer: the managed data root and content checksums.

pub mod checksum;
pub mod root;

pub use checksum::sha1_checksum;
pub use root::DataRoot;
