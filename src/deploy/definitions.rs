//! Loading state-machine definitions from the project's serverless file.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Accepted project file names, tried in order
pub const PROJECT_FILE_NAMES: [&str; 2] = ["serverless.yml", "serverless.yaml"];

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Failed to serialize definition of \"{name}\": {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct ProjectDocument {
    #[serde(rename = "stepFunctions", default)]
    step_functions: Option<BTreeMap<String, serde_json::Value>>,
}

/// The `stepFunctions` section: state-machine name to its opaque definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowDefinitions {
    definitions: BTreeMap<String, serde_json::Value>,
}

impl WorkflowDefinitions {
    pub fn new(definitions: BTreeMap<String, serde_json::Value>) -> Self {
        Self { definitions }
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.definitions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// A single definition serialized to the JSON text `CreateStateMachine` expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDefinition {
    pub name: String,
    pub definition: String,
}

impl CompiledDefinition {
    pub fn compile(name: &str, document: &serde_json::Value) -> Result<Self, DefinitionError> {
        let definition =
            serde_json::to_string(document).map_err(|source| DefinitionError::Serialize {
                name: name.to_string(),
                source,
            })?;

        Ok(Self {
            name: name.to_string(),
            definition,
        })
    }
}

/// Resolve the project file inside `root`: `serverless.yml` when it exists,
/// otherwise `serverless.yaml` (whether or not that one exists).
pub fn project_file_path(root: &Path) -> PathBuf {
    let primary = root.join(PROJECT_FILE_NAMES[0]);
    if primary.exists() {
        primary
    } else {
        root.join(PROJECT_FILE_NAMES[1])
    }
}

/// Load the `stepFunctions` section of the project file.
///
/// Returns `Ok(None)` when there is no project root or the document has no
/// `stepFunctions` section.
pub fn load_definitions(project_root: Option<&Path>) -> Result<Option<WorkflowDefinitions>, DefinitionError> {
    let Some(root) = project_root else {
        debug!("No project root; skipping definition loading");
        return Ok(None);
    };

    let path = project_file_path(root);
    let content = std::fs::read_to_string(&path).map_err(|source| DefinitionError::Read {
        path: path.clone(),
        source,
    })?;

    let definitions = parse_definitions(&content).map_err(|source| DefinitionError::Parse {
        path: path.clone(),
        source,
    })?;

    if let Some(definitions) = &definitions {
        info!(
            path = %path.display(),
            count = definitions.len(),
            "Loaded state machine definitions"
        );
    }

    Ok(definitions)
}

fn parse_definitions(content: &str) -> Result<Option<WorkflowDefinitions>, serde_yaml::Error> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    if value.is_null() {
        return Ok(None);
    }

    let document: ProjectDocument = serde_yaml::from_value(value)?;
    Ok(document.step_functions.map(WorkflowDefinitions::new))
}
