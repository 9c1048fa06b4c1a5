//! Common types for manifest stores

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Sentinel used when a version or bucket cannot be discovered
pub const UNKNOWN: &str = "unknown";

/// A package found by one of the manifest stores
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    /// App directory name (installed) or manifest file stem (bucket)
    pub name: String,
    /// Manifest version, or [`UNKNOWN`]
    pub version: String,
    /// Entry point (installed) or manifest file name (bucket)
    pub file_name: Option<String>,
    /// Owning bucket, or [`UNKNOWN`]
    pub bucket: String,
    /// `<app>/current` for installed apps, the manifest directory for bucket entries
    pub path: PathBuf,
    /// Version-check descriptor
    pub checkver: Checkver,
    pub homepage: Option<String>,
    pub description: Option<String>,
}

/// The `checkver` descriptor of a manifest
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Checkver {
    /// No descriptor in the manifest
    #[default]
    NoCheck,
    /// `"github"`, or a regex applied to the homepage content
    Literal(String),
    /// Object form naming a strategy and its extraction options
    Strategy(CheckverStrategy),
    /// Any other JSON shape; kept verbatim, never resolvable
    Unrecognized(Value),
}

impl Checkver {
    pub fn is_no_check(&self) -> bool {
        matches!(self, Checkver::NoCheck)
    }

    /// Options that refine extraction; literal descriptors carry none
    pub fn strategy(&self) -> Option<&CheckverStrategy> {
        match self {
            Checkver::Strategy(strategy) => Some(strategy),
            _ => None,
        }
    }
}

/// Object form of `checkver`.
///
/// Aliased keys are kept as separate fields. Unknown keys and known keys
/// holding the wrong JSON type land in `extra`, so serializing gives back
/// exactly the object that was read.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CheckverStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourceforge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourceforgepath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsonpath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
    #[serde(rename = "userAgent", skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub useragent: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for CheckverStrategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            github: take(&mut fields, "github"),
            sourceforge: take(&mut fields, "sourceforge"),
            sourceforgepath: take(&mut fields, "sourceforgepath"),
            url: take(&mut fields, "url"),
            jsonpath: take(&mut fields, "jsonpath"),
            jp: take(&mut fields, "jp"),
            xpath: take(&mut fields, "xpath"),
            regex: take(&mut fields, "regex"),
            re: take(&mut fields, "re"),
            replace: take(&mut fields, "replace"),
            reverse: take(&mut fields, "reverse"),
            user_agent: take(&mut fields, "userAgent"),
            useragent: take(&mut fields, "useragent"),
            extra: fields,
        })
    }
}

/// Removes `key` only when its value decodes as `T`
fn take<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = T::deserialize(fields.get(key)?).ok()?;
    fields.remove(key);
    Some(value)
}

impl CheckverStrategy {
    pub fn github(&self) -> Option<&str> {
        non_empty(self.github.as_deref())
    }

    pub fn sourceforge(&self) -> Option<&str> {
        non_empty(self.sourceforge.as_deref())
    }

    pub fn sourceforge_path(&self) -> Option<&str> {
        non_empty(self.sourceforgepath.as_deref())
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }

    pub fn json_path(&self) -> Option<&str> {
        non_empty(self.jsonpath.as_deref()).or_else(|| non_empty(self.jp.as_deref()))
    }

    pub fn xpath(&self) -> Option<&str> {
        non_empty(self.xpath.as_deref())
    }

    pub fn regex(&self) -> Option<&str> {
        non_empty(self.regex.as_deref()).or_else(|| non_empty(self.re.as_deref()))
    }

    pub fn replace(&self) -> Option<&str> {
        non_empty(self.replace.as_deref())
    }

    pub fn reverse(&self) -> bool {
        self.reverse.unwrap_or(false)
    }

    pub fn user_agent(&self) -> Option<&str> {
        non_empty(self.user_agent.as_deref()).or_else(|| non_empty(self.useragent.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
