pub mod config;
pub mod manifest;
pub mod query;
pub mod version;
