//! Version resolution layer
//!
//! Turns a manifest's `checkver` descriptor into the latest upstream version.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Checker   │────▶│   Sources   │────▶│   Fetcher   │
//! │ (dispatch)  │     │(github, sf) │     │   (HTTP)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   Extract   │
//! │(re,json,xml)│
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`checker`]: descriptor interpreter with cancellation and timeout
//! - [`sources`]: GitHub Releases and SourceForge RSS lookups
//! - [`extract`]: regex / JSONPath / XPath extraction primitives
//! - [`fetcher`]: HTTP transport trait and reqwest implementation
//! - [`compare`]: numeric version equality
//! - [`error`]: error types for fetching and extraction

pub mod checker;
pub mod compare;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod sources;

pub use checker::VersionChecker;
pub use compare::same_version;
pub use error::{CheckError, ExtractError, FetchError};
pub use fetcher::{Fetcher, HttpFetcher};
