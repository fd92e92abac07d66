//! Base schema files describing pre-existing tables and columns.
//!
//! ```yaml
//! tt_content:
//!   tx_legacy_teaser: Textarea
//! tx_news_domain_model_news:
//!   title: Text
//!   teaser: Textarea
//! ```

use std::path::Path;

use content_blocks_core::{FieldTypeCatalog, StaticBaseSchema};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{LoaderError, Result};

type BaseSchemaFile = IndexMap<String, IndexMap<String, String>>;

/// Loads a base schema file on top of the host's core columns.
///
/// # Errors
///
/// Returns [`Io`](LoaderError::Io) or [`Yaml`](LoaderError::Yaml) if the
/// file cannot be read, and [`InvalidBaseSchema`](LoaderError::InvalidBaseSchema)
/// if a column names a type missing from `catalog`.
pub fn load_base_schema(
    path: impl AsRef<Path>,
    catalog: &FieldTypeCatalog,
) -> Result<StaticBaseSchema> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let file: BaseSchemaFile =
        serde_yaml::from_str(&content).map_err(|e| LoaderError::yaml(path, e))?;
    let mut schema = StaticBaseSchema::host_defaults(catalog);
    extend_base_schema(&mut schema, &file, catalog)?;
    debug!(path = %path.display(), tables = file.len(), "loaded base schema");
    Ok(schema)
}

/// Parses base schema YAML into a fresh schema without host columns.
///
/// # Examples
///
/// ```
/// use content_blocks_core::{BaseSchema, FieldTypeCatalog};
/// use content_blocks_loader::parse_base_schema;
///
/// let catalog = FieldTypeCatalog::standard();
/// let schema = parse_base_schema("tx_news:\n  title: Text\n", &catalog).unwrap();
/// assert_eq!(schema.get("tx_news", "title").unwrap().name, "Text");
/// assert!(!schema.has("tt_content", "CType"));
/// ```
pub fn parse_base_schema(yaml: &str, catalog: &FieldTypeCatalog) -> Result<StaticBaseSchema> {
    let file: BaseSchemaFile =
        serde_yaml::from_str(yaml).map_err(|e| LoaderError::yaml("<inline>", e))?;
    let mut schema = StaticBaseSchema::new();
    extend_base_schema(&mut schema, &file, catalog)?;
    Ok(schema)
}

fn extend_base_schema(
    schema: &mut StaticBaseSchema,
    file: &BaseSchemaFile,
    catalog: &FieldTypeCatalog,
) -> Result<()> {
    for (table, columns) in file {
        for (field, type_name) in columns {
            let descriptor = catalog.get(type_name).ok_or_else(|| {
                LoaderError::InvalidBaseSchema(format!(
                    "column {table}.{field} has unknown type \"{type_name}\""
                ))
            })?;
            schema.insert(table, field, descriptor.clone());
        }
    }
    Ok(())
}
