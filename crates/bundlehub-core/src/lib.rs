//! Core configuration, error handling, and shared types for BundleHub.

pub mod config;
pub mod error;
pub mod result;
