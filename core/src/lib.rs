//! Compiler for content block schema documents.
//!
//! This crate turns declarative, author-written schema documents into a
//! normalized definition model that downstream generators turn into database
//! columns, form configuration and translation files:
//!
//! - [`SchemaDocument`] / [`FieldNode`]: the authored input, one document per
//!   `vendor/package` content block.
//! - [`FieldTypeCatalog`]: the registry of field types the compiler knows.
//! - [`SchemaCompiler`]: walks each document's field tree, assigns unique
//!   identifiers, expands collections into child tables and FlexForms into
//!   data structures, then merges everything per table.
//! - [`CompiledResult`]: merged [`TableDefinition`]s, the automatic
//!   [`LanguageKeyRegistry`] and the parent reference map.
//!
//! The crate performs no I/O; loading documents from disk lives in the
//! loader crate.
//!
//! # Example
//!
//! ```
//! use content_blocks_core::*;
//!
//! let teaser = SchemaDocument::new("acme/teaser", ContentTypeKind::ContentElement)
//!     .with_field(FieldNode::new("headline", "Text"))
//!     .with_field(
//!         FieldNode::new("header", "Palette").with_fields(vec![
//!             FieldNode::existing("header"),
//!             FieldNode::linebreak(),
//!             FieldNode::existing("subheader"),
//!         ]),
//!     );
//!
//! let mut compiler = SchemaCompiler::new();
//! let result = compiler.compile(&[teaser]).unwrap();
//!
//! let table = result.table("tt_content").unwrap();
//! let content_type = table.content_type("acme/teaser").unwrap();
//! assert_eq!(content_type.type_name.as_deref(), Some("acme_teaser"));
//! assert_eq!(
//!     content_type.show_item_string(),
//!     "acme_teaser_headline,--palette--;;acme_teaser_header"
//! );
//! ```

mod base_schema;
mod catalog;
mod compiler;
mod context;
mod definition;
mod document;
mod error;
mod identifier;
mod language;
mod merge;
mod validate;

pub use base_schema::{BaseSchema, NoBaseSchema, StaticBaseSchema};
pub use catalog::{FieldKind, FieldTypeCatalog, ItemLabels, TcaKind, TypeDescriptor};
pub use compiler::{
    CompiledResult, DEFAULT_DATA_STRUCTURE_KEY, DEFAULT_FOREIGN_FIELD, DEFAULT_SHEET,
    SchemaCompiler,
};
pub use context::{ProcessedFieldsResult, ProcessingInput, SchemaFragment, resolved_type_name};
pub use definition::{
    CompiledField, ContentTypeDefinition, ContentTypeIcon, PaletteDefinition, PaletteItem,
    ShowItem, SortField, SortOrder, TableDefinition,
};
pub use document::{
    ContentTypeKind, FILE_TYPE_NAMES, FieldItem, FieldNode, LabelField, PrefixType,
    RecordCapabilities, SchemaDocument, SortFieldEntry, SortFieldSpec, TableSettings,
};
pub use error::{CompileError, ErrorCategory, IdentifierNamespace, Result};
pub use identifier::{PrefixPolicy, assign_field_identifier, assign_identifier, prefix_for};
pub use language::{LanguageKey, LanguageKeyRegistry, LanguagePath, LanguageScope};
pub use merge::{TableContributions, merge_table_definitions, merge_tables, merge_values};
pub use validate::validate_document;
