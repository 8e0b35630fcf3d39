//! Workflow loader - definition document discovery and parsing
//!
//! Documents are JSON (`.json`) or YAML (`.yaml`, `.yml`). A document's
//! workflow name is its path relative to the scanned directory with the
//! extension removed and separators turned into dots, plus a prefix:
//! `approvals/leave.json` under prefix `hr.` becomes `hr.approvals.leave`.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::types::WorkflowDefinition;
use crate::kit::{EngineError, WorkflowError};

/// Supported document encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Format implied by a file extension; `None` for non-definition files
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// A definition document found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEntry {
    pub name: String,
    pub path: PathBuf,
    pub format: DocumentFormat,
}

/// Loads workflow definitions from documents
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowLoader;

impl WorkflowLoader {
    pub fn new() -> Self {
        Self
    }

    /// List every definition document under `dir`, sorted by path.
    /// A missing directory yields nothing.
    pub fn scan<P: AsRef<Path>>(
        &self,
        dir: P,
        prefix: &str,
    ) -> Result<Vec<DocumentEntry>, EngineError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            log::debug!("Workflow directory {} does not exist", dir.display());
            return Ok(vec![]);
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(format) = DocumentFormat::from_path(path) else {
                continue;
            };
            entries.push(DocumentEntry {
                name: format!("{}{}", prefix, Self::spec_name(dir, path)),
                path: path.to_path_buf(),
                format,
            });
        }
        Ok(entries)
    }

    /// Read and parse one document
    pub fn load_file(&self, entry: &DocumentEntry) -> Result<WorkflowDefinition, EngineError> {
        let source = fs::read_to_string(&entry.path)?;
        let def = Self::parse(&entry.name, source, entry.format, Some(entry.path.clone()))?;
        Ok(def)
    }

    /// Parse a definition from its source text
    pub fn parse(
        name: &str,
        source: String,
        format: DocumentFormat,
        path: Option<PathBuf>,
    ) -> Result<WorkflowDefinition, WorkflowError> {
        let parsed = match format {
            DocumentFormat::Json => {
                serde_json::from_str::<WorkflowDefinition>(&source).map_err(|e| e.to_string())
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_str::<WorkflowDefinition>(&source).map_err(|e| e.to_string())
            }
        };

        let mut def = match parsed {
            Ok(def) => def,
            Err(message) => {
                log::error!("Failed to parse workflow '{}': {}", name, message);
                return Err(WorkflowError::DefinitionParse {
                    name: name.to_string(),
                    file: path.unwrap_or_default(),
                    content: source,
                    message,
                });
            }
        };

        if def.nodes.is_empty() {
            return Err(WorkflowError::InvalidDefinition {
                name: name.to_string(),
                message: "no nodes declared".to_string(),
            });
        }

        def.name = name.to_string();
        def.source = source;
        def.format = format;
        def.path = path;
        def.reindex();

        for (from, target) in def.dangling_targets() {
            log::warn!(
                "Workflow '{}': transition from '{}' targets unknown node '{}'",
                def.name,
                from,
                target
            );
        }
        Ok(def)
    }

    /// Re-parse a definition from the source it was loaded with
    pub fn reparse(def: &WorkflowDefinition) -> Result<WorkflowDefinition, WorkflowError> {
        Self::parse(&def.name, def.source.clone(), def.format, def.path.clone())
    }

    /// Dotted name of `file` relative to `root`, without extension
    pub fn spec_name(root: &Path, file: &Path) -> String {
        let relative = file.strip_prefix(root).unwrap_or(file);
        let stem = relative.with_extension("");
        stem.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::workflow::condition::CompareOp;

    const LEAVE_JSON: &str = r#"{
        "nodes": [
            {"name": "submit", "user": {"process": "fixed", "args": [1]}},
            {"name": "review",
             "user": {"process": "fixed", "args": [2]},
             "next": [
                {"conditions": [{"left": "$out.approved", "op": "==", "right": true}], "goto": "done"},
                {"conditions": [{"left": "$out.approved", "op": "==", "right": false}], "goto": "submit"}
             ]},
            {"name": "done"}
        ]
    }"#;

    #[test]
    fn test_parse_json_document() {
        let def =
            WorkflowLoader::parse("leave", LEAVE_JSON.to_string(), DocumentFormat::Json, None)
                .unwrap();
        assert_eq!(def.name, "leave");
        assert_eq!(def.len(), 3);
        assert_eq!(def.source, LEAVE_JSON);
        assert_eq!(def.position("done"), Some(2));

        let review = def.node("review").unwrap();
        assert_eq!(review.next.len(), 2);
        assert_eq!(review.next[1].goto, "submit");
        assert_eq!(review.next[0].conditions[0].op, CompareOp::Eq);
    }

    #[test]
    fn test_parse_yaml_document() {
        let yaml = r#"
nodes:
  - name: draft
    user:
      process: fixed
      args: [3]
  - name: approve
    next:
      - conditions:
          - { left: "$out.amount", op: "<=", right: 1000 }
        goto: archive
  - name: archive
"#;
        let def =
            WorkflowLoader::parse("expense", yaml.to_string(), DocumentFormat::Yaml, None).unwrap();
        assert_eq!(def.len(), 3);
        assert_eq!(def.nodes[1].next[0].conditions[0].op, CompareOp::Lte);
    }

    #[test]
    fn test_invalid_document_returns_parse_error() {
        let source = r#"{"nodes": [{"title": "missing name"}]}"#;
        let err = WorkflowLoader::parse(
            "bad",
            source.to_string(),
            DocumentFormat::Json,
            Some(PathBuf::from("bad.json")),
        )
        .unwrap_err();

        match err {
            WorkflowError::DefinitionParse {
                name,
                file,
                content,
                ..
            } => {
                assert_eq!(name, "bad");
                assert_eq!(file, PathBuf::from("bad.json"));
                assert_eq!(content, source);
            }
            other => panic!("Expected DefinitionParse, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_node_list_is_invalid() {
        let err = WorkflowLoader::parse("empty", r#"{"nodes": []}"#.to_string(), DocumentFormat::Json, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_reparse_identical_source() {
        let def =
            WorkflowLoader::parse("leave", LEAVE_JSON.to_string(), DocumentFormat::Json, None)
                .unwrap();
        let again = WorkflowLoader::reparse(&def).unwrap();
        assert_eq!(again.name, def.name);
        assert_eq!(again.nodes, def.nodes);
    }

    #[test]
    fn test_spec_name() {
        let root = Path::new("/srv/workflows");
        assert_eq!(
            WorkflowLoader::spec_name(root, Path::new("/srv/workflows/leave.json")),
            "leave"
        );
        assert_eq!(
            WorkflowLoader::spec_name(root, Path::new("/srv/workflows/hr/leave.yaml")),
            "hr.leave"
        );
    }

    #[test]
    fn test_document_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.JSON")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.yml")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("README.md")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_scan_recurses_and_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("hr")).unwrap();
        fs::write(dir.path().join("expense.json"), LEAVE_JSON).unwrap();
        fs::write(dir.path().join("hr/leave.json"), LEAVE_JSON).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let entries = WorkflowLoader::new().scan(dir.path(), "app.").unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["app.expense", "app.hr.leave"]);
    }

    #[test]
    fn test_scan_missing_directory_is_empty() {
        let entries = WorkflowLoader::new()
            .scan("/definitely/not/here", "")
            .unwrap();
        assert!(entries.is_empty());
    }
}
