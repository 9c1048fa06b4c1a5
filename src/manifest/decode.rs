//! Manifest and install-record decoding shared by both stores

use serde::Deserialize;
use serde_json::Value;

use crate::manifest::error::ManifestError;
use crate::manifest::types::{Checkver, UNKNOWN};

/// Fields read from a package manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    version: Option<Value>,
    homepage: Option<Value>,
    description: Option<Value>,
    pub checkver: Checkver,
    bin: Option<Value>,
    shortcuts: Option<Value>,
}

impl Manifest {
    /// Decode manifest text.
    ///
    /// Some manifests are published as an array of architecture variants; the
    /// first element is used.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(strip_bom(content))?;
        let effective = match value {
            Value::Array(items) => items.into_iter().next().ok_or(ManifestError::Empty)?,
            other => other,
        };
        Ok(serde_json::from_value(effective)?)
    }

    /// `version` as text, or the unknown sentinel
    pub fn version(&self) -> String {
        match &self.version {
            Some(Value::String(version)) => version.clone(),
            Some(Value::Null) | None => UNKNOWN.to_string(),
            Some(other) => other.to_string(),
        }
    }

    pub fn homepage(&self) -> Option<String> {
        match &self.homepage {
            Some(Value::String(homepage)) => Some(homepage.clone()),
            _ => None,
        }
    }

    /// `description` as a plain string or the first string of an array
    pub fn description(&self) -> Option<String> {
        match &self.description {
            Some(Value::String(description)) => Some(description.clone()),
            Some(Value::Array(lines)) => lines.first().and_then(Value::as_str).map(String::from),
            _ => None,
        }
    }

    /// First executable or shortcut target.
    ///
    /// `shortcuts` wins whenever the key is present, even if it yields nothing.
    pub fn entry_point(&self) -> Option<String> {
        match (&self.shortcuts, &self.bin) {
            (Some(shortcuts), _) => first_entry(shortcuts),
            (None, Some(bin)) => first_entry(bin),
            (None, None) => None,
        }
    }
}

/// Normalize `"a.exe"`, `["a.exe", ...]` and `[["a.exe", "A"], ...]` to `a.exe`
fn first_entry(value: &Value) -> Option<String> {
    match value {
        Value::String(path) => Some(path.clone()),
        Value::Array(items) => match items.first()? {
            Value::String(path) => Some(path.clone()),
            Value::Array(inner) => inner.first().and_then(Value::as_str).map(String::from),
            _ => None,
        },
        _ => None,
    }
}

/// Per-install record written by Scoop next to the installed manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstallRecord {
    bucket: Option<String>,
}

impl InstallRecord {
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(strip_bom(content))?)
    }

    pub fn bucket(&self) -> String {
        self.bucket.clone().unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Drops a leading UTF-8 byte order mark
fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn manifest(value: Value) -> Manifest {
        Manifest::parse(&value.to_string()).unwrap()
    }

    #[test]
    fn parse_uses_first_element_of_array_manifest() {
        let result = manifest(json!([
            { "version": "1.0.0", "homepage": "https://a.example" },
            { "version": "2.0.0" }
        ]));

        assert_eq!(result.version(), "1.0.0");
        assert_eq!(result.homepage().as_deref(), Some("https://a.example"));
    }

    #[test]
    fn parse_rejects_empty_array() {
        assert!(matches!(Manifest::parse("[]"), Err(ManifestError::Empty)));
    }

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(matches!(
            Manifest::parse("{ \"version\": "),
            Err(ManifestError::Json(_))
        ));
    }

    #[rstest]
    #[case(json!({}), "unknown")]
    #[case(json!({ "version": null }), "unknown")]
    #[case(json!({ "version": "22.1" }), "22.1")]
    #[case(json!({ "version": 3 }), "3")]
    fn version_falls_back_to_unknown(#[case] raw: Value, #[case] expected: &str) {
        assert_eq!(manifest(raw).version(), expected);
    }

    #[rstest]
    #[case(json!({ "description": "A tool" }), Some("A tool"))]
    #[case(json!({ "description": ["First line", "Second line"] }), Some("First line"))]
    #[case(json!({ "description": [] }), None)]
    #[case(json!({ "description": [1, "x"] }), None)]
    #[case(json!({}), None)]
    fn description_accepts_string_or_array(
        #[case] raw: Value,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(manifest(raw).description().as_deref(), expected);
    }

    #[test]
    fn homepage_ignores_non_string_values() {
        assert_eq!(manifest(json!({ "homepage": ["x"] })).homepage(), None);
    }

    #[rstest]
    #[case(json!({ "bin": "tool.exe" }), Some("tool.exe"))]
    #[case(json!({ "bin": ["tool.exe", "other.exe"] }), Some("tool.exe"))]
    #[case(json!({ "bin": [["bin/tool.exe", "tool"]] }), Some("bin/tool.exe"))]
    #[case(json!({ "shortcuts": [["App.exe", "App"]], "bin": "cli.exe" }), Some("App.exe"))]
    #[case(json!({ "shortcuts": [], "bin": "cli.exe" }), None)]
    #[case(json!({ "bin": [[]] }), None)]
    #[case(json!({ "bin": 7 }), None)]
    #[case(json!({}), None)]
    fn entry_point_normalizes_all_shapes(#[case] raw: Value, #[case] expected: Option<&str>) {
        assert_eq!(manifest(raw).entry_point().as_deref(), expected);
    }

    #[test]
    fn checkver_is_decoded_at_parse_time() {
        let result = manifest(json!({ "checkver": "github" }));
        assert_eq!(result.checkver, Checkver::Literal("github".to_string()));
    }

    #[test]
    fn parse_skips_leading_byte_order_mark() {
        let result = Manifest::parse("\u{feff}{\"version\": \"1.2.3\"}").unwrap();
        assert_eq!(result.version(), "1.2.3");

        let record = InstallRecord::parse("\u{feff}{\"bucket\": \"main\"}").unwrap();
        assert_eq!(record.bucket(), "main");
    }

    #[rstest]
    #[case("{\"bucket\": \"extras\"}", "extras")]
    #[case("{}", "unknown")]
    fn install_record_bucket_defaults_to_unknown(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(InstallRecord::parse(raw).unwrap().bucket(), expected);
    }
}
