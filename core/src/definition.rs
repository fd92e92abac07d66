//! Compiled definitions emitted by the compiler.
//!
//! These are the normalized model downstream generators consume: per table a
//! [`TableDefinition`] with its compiled fields and palettes and the ordered
//! [`ContentTypeDefinition`]s that apply to it.

use std::cmp::Reverse;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::{FieldKind, TcaKind, TypeDescriptor};
use crate::document::{ContentTypeKind, RecordCapabilities};

/// One entry of a content type's display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "identifier", rename_all = "snake_case")]
pub enum ShowItem {
    Field(String),
    Palette(String),
    Tab(String),
    Linebreak,
}

impl fmt::Display for ShowItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(identifier) => f.write_str(identifier),
            Self::Palette(identifier) => write!(f, "--palette--;;{identifier}"),
            Self::Tab(identifier) => write!(f, "--div--;{identifier}"),
            Self::Linebreak => f.write_str("--linebreak--"),
        }
    }
}

/// One entry of a palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "identifier", rename_all = "snake_case")]
pub enum PaletteItem {
    Field(String),
    Linebreak,
}

/// A compiled palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteDefinition {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub label_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_path: Option<String>,
    pub items: Vec<PaletteItem>,
}

impl PaletteDefinition {
    /// Field identifiers of this palette in display order.
    pub fn field_identifiers(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            PaletteItem::Field(identifier) => Some(identifier.as_str()),
            PaletteItem::Linebreak => None,
        })
    }

    /// Renders the palette in the host's showitem notation.
    pub fn show_item(&self) -> String {
        self.items
            .iter()
            .map(|item| match item {
                PaletteItem::Field(identifier) => identifier.clone(),
                PaletteItem::Linebreak => "--linebreak--".to_string(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A fully resolved field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledField {
    /// Final, possibly prefixed, column identifier.
    pub unique_identifier: String,
    /// Identifier as authored.
    pub identifier: String,
    pub field_type: TypeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub label_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_path: Option<String>,
    /// Bound to an existing column; no storage is generated.
    pub use_existing_field: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_cond: Option<Value>,
    pub config: Map<String, Value>,
}

impl CompiledField {
    /// Structural kind of the resolved type.
    pub fn kind(&self) -> FieldKind {
        self.field_type.kind
    }

    /// Storage kind of the resolved type.
    pub fn tca(&self) -> TcaKind {
        self.field_type.tca
    }
}

/// Icon metadata of a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeIcon {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One discriminator-activated variant of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeDefinition {
    /// Owning document name, or a synthetic identifier for collection types.
    pub identifier: String,
    pub table: String,
    pub kind: ContentTypeKind,
    /// Discriminator value; `None` for synthetic collection types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_path: Option<String>,
    pub show_items: Vec<ShowItem>,
    pub override_columns: Vec<CompiledField>,
    pub vendor: String,
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<ContentTypeIcon>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl ContentTypeDefinition {
    /// Renders the show items in the host's comma separated notation.
    pub fn show_item_string(&self) -> String {
        self.show_items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Sort direction of a sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A resolved sort field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub identifier: String,
    pub order: SortOrder,
}

/// Compiled definition of one table.
///
/// During a run every pass contributes a partial definition; the merge pass
/// folds them into one and attaches the concatenated content types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub table: String,
    /// `true` if some document names this table directly.
    pub is_root_table: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_field: Option<String>,
    pub fields: IndexMap<String, CompiledField>,
    pub palettes: IndexMap<String, PaletteDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_root: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_field: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_label_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort_fields: Vec<SortField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_level_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_label: Option<bool>,
    pub capabilities: RecordCapabilities,
    pub content_types: Vec<ContentTypeDefinition>,
}

impl TableDefinition {
    /// Creates an empty definition.
    pub fn new(table: &str, is_root_table: bool) -> Self {
        Self {
            table: table.to_string(),
            is_root_table,
            type_field: None,
            fields: IndexMap::new(),
            palettes: IndexMap::new(),
            aggregate_root: None,
            label_field: Vec::new(),
            fallback_label_fields: Vec::new(),
            sort_fields: Vec::new(),
            root_level_type: None,
            append_label: None,
            capabilities: RecordCapabilities::default(),
            content_types: Vec::new(),
        }
    }

    /// Looks up a compiled field by its unique identifier.
    pub fn field(&self, unique_identifier: &str) -> Option<&CompiledField> {
        self.fields.get(unique_identifier)
    }

    /// Looks up a content type by identifier.
    pub fn content_type(&self, identifier: &str) -> Option<&ContentTypeDefinition> {
        self.content_types
            .iter()
            .find(|content_type| content_type.identifier == identifier)
    }

    /// Content types ordered by priority, highest first; ties keep
    /// contribution order.
    pub fn content_types_by_priority(&self) -> Vec<&ContentTypeDefinition> {
        let mut ordered: Vec<&ContentTypeDefinition> = self.content_types.iter().collect();
        ordered.sort_by_key(|content_type| Reverse(content_type.priority));
        ordered
    }
}
