//! The schema compiler.
//!
//! [`SchemaCompiler::compile`] runs one pass per document in registration
//! order. Each pass walks the document's field tree into a partial
//! [`TableDefinition`] and one [`ContentTypeDefinition`]; collection fields
//! spawn further passes for their child tables. After the last document the
//! partial definitions are merged per table (see [`crate::merge`]).
//!
//! The compiler keeps per-run scratch state (discriminator fields per table,
//! the parent reference map and the language key registry) on the instance.
//! It is reset at the start of every run and moved into the result at the
//! end, so one instance can be reused for many sequential runs but must not
//! be shared between concurrent ones.

mod collection;
mod fields;
mod flexform;
mod resolve;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::base_schema::{BaseSchema, StaticBaseSchema};
use crate::catalog::FieldTypeCatalog;
use crate::context::ProcessingInput;
use crate::definition::{CompiledField, ContentTypeDefinition, TableDefinition};
use crate::document::SchemaDocument;
use crate::error::Result;
use crate::language::{LanguageKey, LanguageKeyRegistry, LanguagePath};
use crate::merge::{TableContributions, merge_tables};
use crate::validate::validate_document;

pub use collection::DEFAULT_FOREIGN_FIELD;
pub use flexform::{DEFAULT_DATA_STRUCTURE_KEY, DEFAULT_SHEET};

/// Output of one compiler run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompiledResult {
    /// Translation sources collected per document.
    pub language_keys: LanguageKeyRegistry,
    /// Child table name to the collection fields referencing it.
    pub parent_references: IndexMap<String, Vec<CompiledField>>,
    /// Merged definition per table, in first-contribution order.
    pub tables: IndexMap<String, TableDefinition>,
}

impl CompiledResult {
    /// Looks up a merged table definition.
    pub fn table(&self, table: &str) -> Option<&TableDefinition> {
        self.tables.get(table)
    }

    /// Finds a content type by identifier across all tables.
    pub fn content_type(&self, identifier: &str) -> Option<&ContentTypeDefinition> {
        self.tables
            .values()
            .find_map(|table| table.content_type(identifier))
    }
}

/// Compiles schema documents into merged table definitions.
///
/// # Examples
///
/// ```
/// use content_blocks_core::{ContentTypeKind, FieldNode, SchemaCompiler, SchemaDocument};
///
/// let document = SchemaDocument::new("acme/teaser", ContentTypeKind::ContentElement)
///     .with_field(FieldNode::new("headline", "Text"));
///
/// let mut compiler = SchemaCompiler::new();
/// let result = compiler.compile(&[document]).unwrap();
///
/// let table = result.table("tt_content").unwrap();
/// assert!(table.fields.contains_key("acme_teaser_headline"));
/// ```
pub struct SchemaCompiler {
    catalog: FieldTypeCatalog,
    base_schema: Box<dyn BaseSchema>,
    language_keys: LanguageKeyRegistry,
    parent_references: IndexMap<String, Vec<CompiledField>>,
    type_field_per_table: HashMap<String, String>,
}

impl SchemaCompiler {
    /// Creates a compiler with the standard catalog and the host's core
    /// columns as base schema.
    pub fn new() -> Self {
        let catalog = FieldTypeCatalog::standard();
        let base_schema = StaticBaseSchema::host_defaults(&catalog);
        Self::with_parts(catalog, base_schema)
    }

    /// Creates a compiler from an explicit catalog and base schema.
    pub fn with_parts(catalog: FieldTypeCatalog, base_schema: impl BaseSchema + 'static) -> Self {
        Self {
            catalog,
            base_schema: Box::new(base_schema),
            language_keys: LanguageKeyRegistry::new(),
            parent_references: IndexMap::new(),
            type_field_per_table: HashMap::new(),
        }
    }

    /// Replaces the base schema.
    pub fn with_base_schema(mut self, base_schema: impl BaseSchema + 'static) -> Self {
        self.base_schema = Box::new(base_schema);
        self
    }

    /// The field type catalog in use.
    pub fn catalog(&self) -> &FieldTypeCatalog {
        &self.catalog
    }

    /// Compiles documents in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompileError`](crate::CompileError) encountered in
    /// document order, then tree-walk order. No partial result is produced.
    pub fn compile(&mut self, documents: &[SchemaDocument]) -> Result<CompiledResult> {
        self.reset();
        let mut tables: IndexMap<String, TableContributions> = IndexMap::new();

        for document in documents {
            validate_document(document)?;
            let input = ProcessingInput::for_document(document)?;
            debug!(
                document = %document.name,
                table = %input.table,
                kind = ?document.kind,
                "compiling document"
            );

            let mut path = LanguagePath::new(document.language_file_reference());
            self.process_fields(&input, &mut path, &mut tables)?;

            if let Some(type_field) = &input.type_field {
                self.type_field_per_table
                    .entry(input.table.clone())
                    .or_insert_with(|| type_field.clone());
            }
        }

        let merged = merge_tables(tables);
        info!(
            documents = documents.len(),
            tables = merged.len(),
            "compiled content blocks"
        );

        let result = CompiledResult {
            language_keys: std::mem::take(&mut self.language_keys),
            parent_references: std::mem::take(&mut self.parent_references),
            tables: merged,
        };
        self.reset();
        Ok(result)
    }

    fn reset(&mut self) {
        self.language_keys = LanguageKeyRegistry::new();
        self.parent_references.clear();
        self.type_field_per_table.clear();
    }

    /// Registers an automatic language key below the current path and
    /// returns its full reference.
    fn register_key(
        &mut self,
        document: &str,
        path: &LanguagePath,
        suffix: &str,
        default: &str,
    ) -> String {
        let key = LanguageKey {
            key: path.key_for(suffix),
            path: path.path_for(suffix),
            default: default.to_string(),
        };
        let reference = key.path.clone();
        self.language_keys.add(document, key);
        reference
    }
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new()
    }
}
