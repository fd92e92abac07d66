//! Collection expansion: child tables and parent references.

use indexmap::IndexMap;
use serde_json::{Value, json};
use tracing::debug;

use crate::context::ProcessingInput;
use crate::definition::CompiledField;
use crate::document::FieldNode;
use crate::error::Result;
use crate::language::LanguagePath;
use crate::merge::TableContributions;

use super::SchemaCompiler;

/// Column on the child table pointing back to the parent record.
pub const DEFAULT_FOREIGN_FIELD: &str = "foreign_table_parent_uid";

/// Column holding the parent table name of shared child tables.
const FOREIGN_TABLE_FIELD: &str = "tablenames";

/// Column holding the parent field name of shared child tables.
const FOREIGN_MATCH_FIELD: &str = "fieldname";

impl SchemaCompiler {
    /// Links a collection field to its child table and compiles the embedded
    /// field list into that table.
    ///
    /// The child table is the authored `table`, or a new table named after
    /// the field's unique identifier.
    pub(super) fn expand_collection(
        &mut self,
        input: &ProcessingInput<'_>,
        path: &mut LanguagePath,
        tables: &mut IndexMap<String, TableContributions>,
        node: &FieldNode,
        field: &mut CompiledField,
    ) -> Result<()> {
        let child_table = node
            .table
            .clone()
            .unwrap_or_else(|| field.unique_identifier.clone());
        let foreign_field = node
            .foreign_field
            .clone()
            .unwrap_or_else(|| DEFAULT_FOREIGN_FIELD.to_string());

        field
            .config
            .insert("foreign_table".to_string(), Value::String(child_table.clone()));
        field
            .config
            .insert("foreign_field".to_string(), Value::String(foreign_field));
        if node.share_across_tables {
            field.config.insert(
                "foreign_table_field".to_string(),
                Value::String(FOREIGN_TABLE_FIELD.to_string()),
            );
        }
        if node.share_across_fields {
            field.config.insert(
                "foreign_match_fields".to_string(),
                json!({ FOREIGN_MATCH_FIELD: field.unique_identifier }),
            );
        }

        self.parent_references
            .entry(child_table.clone())
            .or_default()
            .push(field.clone());

        if node.fields.is_empty() {
            debug!(
                field = %field.unique_identifier,
                table = %child_table,
                "collection points at an external table"
            );
            return Ok(());
        }

        debug!(
            parent = %input.table,
            table = %child_table,
            "compiling collection table"
        );
        let child = input.for_collection(node, &child_table)?;
        self.process_fields(&child, path, tables)
    }
}
