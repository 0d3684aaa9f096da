//! Definition lookup.
//!
//! [TextureCombiner](crate::combine::TextureCombiner) fetches definitions
//! through the [DefinitionStore] trait so the backing source stays pluggable;
//! [StaticDefinitionStore] serves a parsed in-memory dump, which covers the
//! common case of loading the item schema once at startup.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{Error, Result};
use crate::schema::{DefRef, DefType, Definition};

/// Source of paint-kit definitions.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Fetches the definition for `def_ref`, or `None` if it does not exist.
    async fn definition(&self, def_ref: DefRef) -> Result<Option<Arc<Definition>>>;
}

/// In-memory definition store.
#[derive(Debug, Clone, Default)]
pub struct StaticDefinitionStore {
    definitions: HashMap<DefRef, Arc<Definition>>,
}

impl StaticDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a dump shaped `{ "<type>": { "<defindex>": { ... } } }`.
    ///
    /// Keys with an unrecognized type code are skipped with a warning; a
    /// definition that fails to parse is an error.
    pub fn from_json(dump: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(by_type) = dump else {
            return Err(Error::Schema("definition dump is not an object".into()));
        };
        let mut definitions = HashMap::new();
        for (type_key, entries) in by_type {
            let Ok(def_type) = type_key.parse::<u8>().map(DefType::try_from) else {
                warn!("Skipping non-numeric definition type key '{}'.", type_key);
                continue;
            };
            let Ok(def_type) = def_type else {
                warn!("Skipping unknown definition type key '{}'.", type_key);
                continue;
            };
            let serde_json::Value::Object(entries) = entries else {
                return Err(Error::Schema(format!(
                    "definitions of type {def_type} are not an object"
                )));
            };
            for (index_key, value) in entries {
                let defindex: u32 = index_key.trim().parse().map_err(|_| {
                    Error::Schema(format!(
                        "bad defindex {index_key:?} for definition type {def_type}"
                    ))
                })?;
                let def_ref = DefRef { def_type, defindex };
                let definition = Definition::from_value(def_type, value)
                    .map_err(|e| Error::Schema(format!("definition {def_ref}: {e}")))?;
                definitions.insert(def_ref, Arc::new(definition));
            }
        }
        Ok(Self { definitions })
    }

    pub fn from_json_str(dump: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(dump)?)
    }

    pub fn insert(&mut self, def_ref: DefRef, definition: Definition) {
        self.definitions.insert(def_ref, Arc::new(definition));
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[async_trait]
impl DefinitionStore for StaticDefinitionStore {
    async fn definition(&self, def_ref: DefRef) -> Result<Option<Arc<Definition>>> {
        Ok(self.definitions.get(&def_ref).cloned())
    }
}
