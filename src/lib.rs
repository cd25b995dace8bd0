//! ytvideo - declarative management of YouTube videos
//!
//! Reads, imports and updates YouTube videos against the YouTube Data API v3
//! using a read/reconcile/persist cycle. See [`provider`] for the core and
//! [`youtube`] for the API plumbing.

pub mod config;
pub mod provider;
pub mod youtube;

/// Version injected at compile time via YTVIDEO_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("YTVIDEO_VERSION") {
    Some(v) => v,
    None => "dev",
};
