//! Hosted version sources with their own lookup conventions

pub mod github;
pub mod sourceforge;

pub use github::{GitHubReleases, Release, select_latest};
pub use sourceforge::SourceForgeRss;
