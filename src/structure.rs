use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::breakpoint::Breakpoint;
use crate::domain::RtabError;

/// Identifies a single table column and its display label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeaderDescriptor {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl HeaderDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        HeaderDescriptor {
            key: key.into(),
            label: None,
        }
    }

    pub fn labeled(key: impl Into<String>, label: impl Into<String>) -> Self {
        HeaderDescriptor {
            key: key.into(),
            label: Some(label.into()),
        }
    }

    /// The label shown in the header row, falling back to the key.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

/// One candidate header layout for a table type. A variant without a
/// breakpoint is the breakpoint independent fallback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructureVariant {
    #[serde(default)]
    pub breakpoint: Option<Breakpoint>,
    pub headers: Vec<HeaderDescriptor>,
}

/// The resolved header layout for one table type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStructure {
    pub table_type: String,
    pub headers: Vec<HeaderDescriptor>,
    pub hide_header: bool,
}

/// Maps a table type to its structure variants, in declared order.
///
/// The store is read-only after construction. Lookups treat an empty
/// variant list the same as a missing entry.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct TableConfig {
    table: HashMap<String, Vec<StructureVariant>>,
}

impl TableConfig {
    pub fn new() -> Self {
        TableConfig {
            table: HashMap::new(),
        }
    }

    pub fn insert(&mut self, table_type: impl Into<String>, variants: Vec<StructureVariant>) {
        self.table.insert(table_type.into(), variants);
    }

    pub fn get(&self, table_type: &str) -> Option<&[StructureVariant]> {
        match self.table.get(table_type) {
            Some(variants) if !variants.is_empty() => Some(variants),
            _ => None,
        }
    }

    pub fn contains(&self, table_type: &str) -> bool {
        self.get(table_type).is_some()
    }

    pub fn from_json(json: &str) -> Result<Self, RtabError> {
        let config: TableConfig = serde_json::from_str(json)?;
        debug!("Parsed table configuration for {} types", config.table.len());
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, RtabError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
