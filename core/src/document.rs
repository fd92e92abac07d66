//! Authored schema documents and their field trees.
//!
//! A [`SchemaDocument`] is one content block as delivered by the loading
//! collaborator: a `vendor/package` name, the content type kind, the target
//! table, naming policy flags and a tree of [`FieldNode`] declarations. The
//! types deserialize from the camelCase YAML/JSON keys authors write and are
//! read-only for the lifetime of a compiler run.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{CompileError, Result};

/// Type name of the synthetic discriminator field and of select fields.
pub(crate) const SELECT_TYPE: &str = "Select";

/// Closed set of content type kinds a document can declare.
///
/// # Examples
///
/// ```
/// use content_blocks_core::ContentTypeKind;
///
/// assert_eq!(ContentTypeKind::ContentElement.default_table(), Some("tt_content"));
/// assert_eq!(ContentTypeKind::RecordType.default_table(), None);
/// assert_eq!(
///     ContentTypeKind::from_directory_name("PageTypes"),
///     Some(ContentTypeKind::PageType)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ContentTypeKind {
    /// A content element stored in `tt_content`.
    #[default]
    ContentElement,
    /// A page type stored in `pages`.
    PageType,
    /// A record type stored in an authored table.
    RecordType,
    /// A file type stored in `sys_file_reference`.
    FileType,
}

impl ContentTypeKind {
    /// All kinds in loading order.
    pub const ALL: [ContentTypeKind; 4] = [
        ContentTypeKind::ContentElement,
        ContentTypeKind::PageType,
        ContentTypeKind::RecordType,
        ContentTypeKind::FileType,
    ];

    /// Table every document of this kind targets, if fixed.
    pub fn default_table(self) -> Option<&'static str> {
        match self {
            Self::ContentElement => Some("tt_content"),
            Self::PageType => Some("pages"),
            Self::RecordType => None,
            Self::FileType => Some("sys_file_reference"),
        }
    }

    /// Discriminator field of the fixed table, if any.
    pub fn default_type_field(self) -> Option<&'static str> {
        match self {
            Self::ContentElement => Some("CType"),
            Self::PageType => Some("doktype"),
            Self::RecordType => None,
            Self::FileType => Some("type"),
        }
    }

    /// Name of the directory holding documents of this kind.
    pub fn directory_name(self) -> &'static str {
        match self {
            Self::ContentElement => "ContentElements",
            Self::PageType => "PageTypes",
            Self::RecordType => "RecordTypes",
            Self::FileType => "FileTypes",
        }
    }

    /// Resolves a kind from its directory name.
    pub fn from_directory_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.directory_name() == name)
    }

    /// Short token used in generated icon identifiers.
    pub fn icon_prefix(self) -> &'static str {
        match self {
            Self::ContentElement => "content",
            Self::PageType => "page",
            Self::RecordType => "record",
            Self::FileType => "file",
        }
    }
}

/// Style of the prefix prepended to generated identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrefixType {
    /// `vendor_package` with dashes stripped.
    #[default]
    Full,
    /// `vendor` with dashes stripped.
    Vendor,
}

/// Allowed discriminator values of file types.
pub const FILE_TYPE_NAMES: [&str; 5] = ["text", "image", "audio", "video", "application"];

/// Label field declaration: one identifier or several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelField {
    Single(String),
    Multiple(Vec<String>),
}

impl LabelField {
    /// Returns the declared identifiers in order.
    pub fn identifiers(&self) -> Vec<String> {
        match self {
            Self::Single(identifier) => vec![identifier.clone()],
            Self::Multiple(identifiers) => identifiers.clone(),
        }
    }
}

/// One entry of a sort field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortFieldEntry {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

/// Sort field declaration: one identifier or a list with explicit orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortFieldSpec {
    Single(String),
    Multiple(Vec<SortFieldEntry>),
}

impl SortFieldSpec {
    /// Returns the declared entries in order.
    pub fn entries(&self) -> Vec<SortFieldEntry> {
        match self {
            Self::Single(identifier) => vec![SortFieldEntry {
                identifier: identifier.clone(),
                order: None,
            }],
            Self::Multiple(entries) => entries.clone(),
        }
    }
}

/// Boolean record capabilities; `None` means "not declared".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_aware: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_aware: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_locking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_creation_date: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_update_date: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_ancestor_reference: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_at_copy: Option<bool>,
}

/// Table-level settings shared by documents and collection fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_field: Option<LabelField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_label_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<SortFieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_root: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_level_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_label: Option<bool>,
    #[serde(flatten)]
    pub capabilities: RecordCapabilities,
}

/// Configuration keys of [`TableSettings`]; stripped from compiled
/// collection field configuration.
pub(crate) const TABLE_SETTING_KEYS: [&str; 17] = [
    "labelField",
    "fallbackLabelFields",
    "sortField",
    "aggregateRoot",
    "rootLevelType",
    "appendLabel",
    "languageAware",
    "workspaceAware",
    "editLocking",
    "softDelete",
    "trackCreationDate",
    "trackUpdateDate",
    "trackAncestorReference",
    "sortable",
    "readOnly",
    "adminOnly",
    "hideAtCopy",
];

/// One item of a select, radio or checkbox field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldItem {
    /// Creates an item with a label and a value.
    pub fn new(label: &str, value: impl Into<Value>) -> Self {
        Self {
            label: Some(label.to_string()),
            value: Some(value.into()),
            extra: Map::new(),
        }
    }

    /// Creates an item without a value (checkbox style).
    pub fn labeled(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            value: None,
            extra: Map::new(),
        }
    }
}

/// One node of an authored field tree.
///
/// Structural nodes (palettes, tabs, line breaks, collections, FlexForms)
/// share this shape; the resolved type decides how the node is handled.
/// Anything that is not one of the named attributes lands in
/// [`config`](FieldNode::config) and is carried into the compiled field
/// definition untouched.
///
/// # Examples
///
/// ```
/// use content_blocks_core::FieldNode;
///
/// let palette = FieldNode::new("header", "Palette")
///     .with_label("Header")
///     .with_fields(vec![
///         FieldNode::new("headline", "Text"),
///         FieldNode::linebreak(),
///         FieldNode::new("subline", "Text"),
///     ]);
/// assert_eq!(palette.fields.len(), 3);
/// assert!(palette.fields[1].identifier.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Bind to a column that already exists on the target table.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub use_existing_field: bool,
    /// Per-field override of the document's prefixing policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_field: Option<bool>,
    /// Nested fields of palettes, collections, FlexForms and sheets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldNode>,
    /// Containers of a FlexForm section.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container: Vec<FieldNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<FieldItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_cond: Option<Value>,
    /// External child table of a collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_field: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub share_across_tables: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub share_across_fields: bool,
    /// Link title of a FlexForm sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_title: Option<String>,
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

impl FieldNode {
    /// Creates a field node with an identifier and a type.
    pub fn new(identifier: &str, type_name: &str) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            type_name: Some(type_name.to_string()),
            ..Default::default()
        }
    }

    /// Creates a line break marker.
    pub fn linebreak() -> Self {
        Self {
            type_name: Some("Linebreak".to_string()),
            ..Default::default()
        }
    }

    /// Creates a node bound to an existing column of the target table.
    pub fn existing(identifier: &str) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            use_existing_field: true,
            ..Default::default()
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Sets the nested fields.
    pub fn with_fields(mut self, fields: Vec<FieldNode>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the items.
    pub fn with_items(mut self, items: Vec<FieldItem>) -> Self {
        self.items = items;
        self
    }

    /// Adds a raw configuration entry.
    pub fn with_config(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    /// Returns the table settings embedded in this node's configuration.
    ///
    /// Collection fields carry `labelField`, `sortField` and friends for the
    /// child table they create.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidTableSettings`] if one of those keys
    /// holds a value of the wrong shape.
    pub fn table_settings(&self, document: &str) -> Result<TableSettings> {
        let settings: Map<String, Value> = self
            .config
            .iter()
            .filter(|(key, _)| TABLE_SETTING_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        serde_json::from_value(Value::Object(settings)).map_err(|e| {
            CompileError::InvalidTableSettings {
                document: document.to_string(),
                identifier: self.identifier.clone().unwrap_or_default(),
                message: e.to_string(),
            }
        })
    }

    /// Returns `true` if this node carries the given type name.
    pub(crate) fn has_type(&self, type_name: &str) -> bool {
        self.type_name.as_deref() == Some(type_name)
    }
}

fn default_true() -> bool {
    true
}

fn deserialize_type_name<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// A named, versioned unit of authorship.
///
/// # Examples
///
/// ```
/// use content_blocks_core::{ContentTypeKind, FieldNode, SchemaDocument};
///
/// let document = SchemaDocument::new("acme/teaser", ContentTypeKind::ContentElement)
///     .with_field(FieldNode::new("headline", "Text"));
///
/// assert_eq!(document.table_name(), Some("tt_content"));
/// assert_eq!(document.display_name(), "teaser");
/// assert!(document.prefix_fields);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    /// Qualified `vendor/package` name.
    pub name: String,
    #[serde(default)]
    pub kind: ContentTypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_field: Option<String>,
    /// Discriminator value; numbers are accepted and kept as text.
    #[serde(
        default,
        deserialize_with = "deserialize_type_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub prefix_fields: bool,
    #[serde(default)]
    pub prefix_type: PrefixType,
    /// Replaces the vendor token of generated prefixes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_prefix: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Translation file reference; derived from the name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_extension: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldNode>,
    #[serde(flatten)]
    pub settings: TableSettings,
}

impl SchemaDocument {
    /// Creates a document with default policies and no fields.
    pub fn new(name: &str, kind: ContentTypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            table: None,
            type_field: None,
            type_name: None,
            title: None,
            description: None,
            prefix_fields: true,
            prefix_type: PrefixType::Full,
            vendor_prefix: None,
            priority: 0,
            group: None,
            icon: None,
            language_file: None,
            host_extension: None,
            fields: Vec::new(),
            settings: TableSettings::default(),
        }
    }

    /// Sets the target table.
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Sets the discriminator field.
    pub fn with_type_field(mut self, type_field: &str) -> Self {
        self.type_field = Some(type_field.to_string());
        self
    }

    /// Sets the discriminator value.
    pub fn with_type_name(mut self, type_name: &str) -> Self {
        self.type_name = Some(type_name.to_string());
        self
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldNode) -> Self {
        self.fields.push(field);
        self
    }

    /// Replaces the field list.
    pub fn with_fields(mut self, fields: Vec<FieldNode>) -> Self {
        self.fields = fields;
        self
    }

    /// Splits the qualified name into `(vendor, package)`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidQualifiedName`] if the name lacks the
    /// `/` separator or either side is empty.
    pub fn vendor_and_package(&self) -> Result<(&str, &str)> {
        split_qualified_name(&self.name)
    }

    /// Package part of the name, used as fallback title.
    pub fn display_name(&self) -> &str {
        self.name
            .split_once('/')
            .map(|(_, package)| package)
            .unwrap_or(&self.name)
    }

    /// Table this document targets: the authored one, else the kind's default.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref().or(self.kind.default_table())
    }

    /// Discriminator field: the authored one, else the kind's default.
    pub fn type_field_name(&self) -> Option<&str> {
        self.type_field
            .as_deref()
            .or(self.kind.default_type_field())
    }

    /// Translation file reference used as root of all language keys.
    pub fn language_file_reference(&self) -> String {
        if let Some(file) = &self.language_file {
            return file.clone();
        }
        let extension = self
            .host_extension
            .clone()
            .unwrap_or_else(|| self.name.replace(['/', '-'], "_"));
        format!(
            "LLL:EXT:{extension}/ContentBlocks/{}/{}/language/labels.xlf",
            self.kind.directory_name(),
            self.display_name()
        )
    }
}

/// Splits `vendor/package` into its two non-empty parts.
pub(crate) fn split_qualified_name(name: &str) -> Result<(&str, &str)> {
    match name.split_once('/') {
        Some((vendor, package))
            if !vendor.is_empty() && !package.is_empty() && !package.contains('/') =>
        {
            Ok((vendor, package))
        }
        _ => Err(CompileError::InvalidQualifiedName {
            name: name.to_string(),
        }),
    }
}
