//! Snapshot documents: the on-disk form of an allocation tree
//!
//! JSON accepts a bare array of top-level nodes or an object with a `nodes` array.
//! TOML uses a top-level `[[nodes]]` array of tables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::SnapshotNode;

/// Serialization format of a snapshot file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Toml,
}

impl SnapshotFormat {
    pub fn from_path(path: &Path) -> ApplicationResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            _ => Err(ApplicationError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotDocument {
    Bare(Vec<SnapshotNode>),
    Wrapped { nodes: Vec<SnapshotNode> },
}

impl SnapshotDocument {
    pub fn into_nodes(self) -> Vec<SnapshotNode> {
        match self {
            SnapshotDocument::Bare(nodes) | SnapshotDocument::Wrapped { nodes } => nodes,
        }
    }
}

/// Parse snapshot `content` read from `path`.
pub fn parse_snapshot(content: &str, path: &Path) -> ApplicationResult<Vec<SnapshotNode>> {
    let invalid = |message: String| ApplicationError::InvalidSnapshot {
        path: path.to_path_buf(),
        message,
    };
    let document: SnapshotDocument = match SnapshotFormat::from_path(path)? {
        SnapshotFormat::Json => serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?,
        SnapshotFormat::Toml => toml::from_str(content).map_err(|e| invalid(e.to_string()))?,
    };
    let nodes = document.into_nodes();
    if nodes.is_empty() {
        return Err(invalid("no nodes".to_string()));
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    #[test]
    fn given_bare_json_array_when_parsing_then_returns_nodes() {
        let content = r#"[{"id": "electronics", "children": [
            {"id": "phones", "value": 800},
            {"id": "laptops", "value": 700.50}
        ]}]"#;
        let nodes = parse_snapshot(content, &PathBuf::from("budget.json")).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].children[1].value, Some(dec!(700.50)));
    }

    #[test]
    fn given_wrapped_json_when_parsing_then_returns_nodes() {
        let content = r#"{"nodes": [{"id": "misc", "value": "12.34"}]}"#;
        let nodes = parse_snapshot(content, &PathBuf::from("budget.JSON")).unwrap();
        assert_eq!(nodes[0].value, Some(dec!(12.34)));
    }

    #[test]
    fn given_toml_nodes_when_parsing_then_returns_nested_tree() {
        let content = r#"
[[nodes]]
id = "furniture"
label = "Furniture"

[[nodes.children]]
id = "tables"
value = 300

[[nodes.children]]
id = "chairs"
value = 700
baseline = 650
"#;
        let nodes = parse_snapshot(content, &PathBuf::from("budget.toml")).unwrap();
        assert_eq!(nodes[0].label.as_deref(), Some("Furniture"));
        assert_eq!(nodes[0].children.len(), 2);
        assert_eq!(nodes[0].children[1].baseline, Some(dec!(650)));
    }

    #[test]
    fn given_unknown_extension_when_parsing_then_unsupported_format() {
        let result = parse_snapshot("[]", &PathBuf::from("budget.yaml"));
        assert!(matches!(result, Err(ApplicationError::UnsupportedFormat(_))));
    }

    #[test]
    fn given_empty_document_when_parsing_then_invalid_snapshot() {
        let result = parse_snapshot("[]", &PathBuf::from("budget.json"));
        assert!(matches!(result, Err(ApplicationError::InvalidSnapshot { .. })));
    }

    #[test]
    fn given_malformed_json_when_parsing_then_invalid_snapshot() {
        let result = parse_snapshot("{not json", &PathBuf::from("budget.json"));
        assert!(matches!(result, Err(ApplicationError::InvalidSnapshot { .. })));
    }
}
