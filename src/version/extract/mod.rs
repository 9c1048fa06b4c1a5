//! Extraction primitives turning fetched text into a single version string

pub mod json;
pub mod pattern;
pub mod xml;

pub use json::extract_json;
pub use pattern::{extract_regex, first_group};
pub use xml::extract_xml;
