//! Regex extraction

use fancy_regex::Regex;

use crate::version::error::ExtractError;

/// Extract a version with `pattern`.
///
/// Picks the first match, or the last one when `reverse` is set. With a
/// `replace` template the whole match is rewritten by `pattern` into the
/// template (`$1`, `${name}`); otherwise capture group 1 is returned.
/// Lookaround and backreferences are supported.
pub fn extract_regex(
    input: &str,
    pattern: &str,
    replace: Option<&str>,
    reverse: bool,
) -> Result<Option<String>, ExtractError> {
    let re = Regex::new(pattern)?;

    let chosen = if reverse {
        let mut last = None;
        for captures in re.captures_iter(input) {
            last = Some(captures?);
        }
        last
    } else {
        re.captures(input)?
    };
    let Some(captures) = chosen else {
        return Ok(None);
    };

    match replace.filter(|template| !template.is_empty()) {
        Some(template) => {
            let whole = captures.get(0).map_or("", |m| m.as_str());
            Ok(Some(re.try_replacen(whole, 0, template)?.into_owned()))
        }
        None => Ok(captures.get(1).map(|group| group.as_str().to_string())),
    }
}

/// Group 1 of the first match, ignoring replace/reverse options
pub fn first_group(input: &str, pattern: &str) -> Result<Option<String>, ExtractError> {
    extract_regex(input, pattern, None, false)
}
