use crate::{CatalogError, CatalogResult};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Module name under which the reaction definitions are shipped in responses
const REACTION_MODULE: &str = "DynamicUFIReactionTypes";

/// Reaction identifier → reaction name mapping
#[derive(Debug, Clone, Default)]
pub struct ReactionTable {
    names: HashMap<String, String>,
}

impl ReactionTable {
    /// Loads a table persisted as `{"reactions": {"<id>": {"name": ..}}}`
    ///
    /// The flat `{"<id>": {"name": ..}}` form is accepted as well.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        let table = Self::from_value(&value);
        tracing::debug!("Loaded {} reaction names from {}", table.len(), path.display());
        Ok(table)
    }

    /// Builds a table from a definition object, ignoring malformed entries
    pub fn from_value(value: &Value) -> Self {
        let entries = value
            .get("reactions")
            .and_then(Value::as_object)
            .or_else(|| value.as_object());

        let names = entries
            .into_iter()
            .flatten()
            .filter_map(|(id, entry)| {
                entry
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|name| (id.clone(), name.to_string()))
            })
            .collect();

        Self { names }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Scans response documents for the reaction module definition
    ///
    /// Returns `None` when no document carries the definition.
    pub fn discover(documents: &[Value]) -> Option<Self> {
        let mut found = None;
        for doc in documents {
            let Some(defines) = doc
                .pointer("/extensions/sr_payload/ddd/jsmods/define")
                .and_then(Value::as_array)
            else {
                continue;
            };

            for define in defines {
                if define.get(0).and_then(Value::as_str) == Some(REACTION_MODULE) {
                    if let Some(definition) = define.get(2) {
                        found = Some(Self::from_value(definition));
                    }
                }
            }
        }
        found.filter(|table| !table.is_empty())
    }

    /// Persists the table in the `{"reactions": ...}` form
    pub fn save(&self, path: &Path) -> CatalogResult<()> {
        let io_err = |source: std::io::Error| CatalogError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut reactions = Map::new();
        let mut ids: Vec<_> = self.names.iter().collect();
        ids.sort();
        for (id, name) in ids {
            reactions.insert(id.clone(), json!({ "name": name }));
        }

        let body = serde_json::to_string_pretty(&json!({ "reactions": reactions })).map_err(
            |source| CatalogError::Parse {
                path: path.display().to_string(),
                source,
            },
        )?;
        std::fs::write(path, body).map_err(io_err)
    }

    /// Resolves an identifier; unknown identifiers yield `None`
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
