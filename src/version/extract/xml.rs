//! Namespace-aware XPath extraction

use indexmap::IndexMap;
use sxd_xpath::{Context, Factory, Value};

use crate::version::error::ExtractError;

/// Prefix bound to unnamed default namespaces
pub const DEFAULT_NAMESPACE_PREFIX: &str = "ns";

/// Evaluate `xpath` against `content` and return the first node's text.
///
/// Every namespace declared anywhere in the document is bound for the query, with
/// default namespaces exposed as `ns:` so that `//ns:version` works on documents
/// that declare `xmlns="..."`.
pub fn extract_xml(content: &str, xpath: &str) -> Result<Option<String>, ExtractError> {
    let namespaces = collect_namespaces(content)?;

    let package = sxd_document::parser::parse(content)
        .map_err(|e| ExtractError::Xml(format!("{:?}", e)))?;
    let document = package.as_document();

    let expression = Factory::new()
        .build(xpath)
        .map_err(|e| ExtractError::InvalidXPath(e.to_string()))?
        .ok_or_else(|| ExtractError::InvalidXPath("empty expression".to_string()))?;

    let mut context = Context::new();
    for (prefix, uri) in &namespaces {
        context.set_namespace(prefix, uri);
    }

    let value = expression
        .evaluate(&context, document.root())
        .map_err(|e| ExtractError::InvalidXPath(e.to_string()))?;

    let text = match value {
        Value::Nodeset(nodes) => nodes.document_order_first().map(|node| node.string_value()),
        _ => None,
    };

    Ok(text.filter(|t| !t.is_empty()))
}

/// Harvest namespace declarations in document order; the first binding of a
/// prefix wins and the reserved `xml` prefix is skipped.
pub fn collect_namespaces(content: &str) -> Result<IndexMap<String, String>, ExtractError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(content, options)
        .map_err(|e| ExtractError::Xml(e.to_string()))?;

    let mut namespaces = IndexMap::new();
    for node in document.descendants().filter(|n| n.is_element()) {
        for namespace in node.namespaces() {
            let prefix = match namespace.name() {
                Some("xml") => continue,
                Some(name) => name,
                None => DEFAULT_NAMESPACE_PREFIX,
            };
            namespaces
                .entry(prefix.to_string())
                .or_insert_with(|| namespace.uri().to_string());
        }
    }

    Ok(namespaces)
}
