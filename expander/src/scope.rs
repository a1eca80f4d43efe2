use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ExpandError, Unresolved};
use crate::value::Value;

/// The names visible to placeholder resolution during one `parse` call.
///
/// A scope is never inherited by a nested template: each template block
/// binds a fresh scope from its own input file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    variables: BTreeMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scope from a decoded JSON object.
    pub fn from_json(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Scope {
            variables: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        }
    }

    /// Decode JSON text; the top level must be an object.
    pub fn from_json_str(text: &str, path: &Path) -> Result<Self, ExpandError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|source| ExpandError::MalformedInput {
                path: path.to_path_buf(),
                source,
            })?;
        match value {
            serde_json::Value::Object(map) => Ok(Scope::from_json(map)),
            other => Err(ExpandError::InputNotObject {
                path: path.to_path_buf(),
                found: Value::from(other).type_name(),
            }),
        }
    }

    /// Read and decode an input-data file.
    pub fn from_file(path: &Path, referenced_by: &str) -> Result<Self, ExpandError> {
        if !path.is_file() {
            return Err(ExpandError::MissingFile {
                path: PathBuf::from(path),
                referenced_by: referenced_by.to_string(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| ExpandError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Scope::from_json_str(&text, path)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Look up `name` and require it to be a list.
    pub fn list(&self, name: &str) -> Result<&[Value], Unresolved> {
        match self.variables.get(name) {
            Some(Value::List(items)) => Ok(items),
            Some(other) => Err(Unresolved::NotAList {
                name: name.to_string(),
                found: other.type_name(),
            }),
            None => Err(Unresolved::Unbound(name.to_string())),
        }
    }
}
