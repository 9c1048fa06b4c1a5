//! Numeric dotted version equality

/// Whether two version strings name the same release.
///
/// One leading `v`/`V` is ignored, each dot-separated part must be an unsigned
/// integer and trailing zero parts are insignificant (`1.2` equals `1.2.0`).
/// Anything unparseable compares unequal, even to itself.
pub fn same_version(a: &str, b: &str) -> bool {
    match (numeric_parts(a), numeric_parts(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn numeric_parts(version: &str) -> Option<Vec<u64>> {
    let version = version.trim();
    let version = version
        .strip_prefix(['v', 'V'])
        .unwrap_or(version);
    if version.is_empty() {
        return None;
    }

    let mut parts = version
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    while parts.last() == Some(&0) {
        parts.pop();
    }
    Some(parts)
}
