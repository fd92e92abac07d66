//! Discovery and loading of content block schema documents.
//!
//! This crate is the filesystem side of the compiler: it finds
//! `config.yaml` documents below content block roots, parses them, checks
//! their names, and hands them to
//! [`SchemaCompiler`](content_blocks_core::SchemaCompiler) in a
//! deterministic order.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use content_blocks_core::{FieldTypeCatalog, SchemaCompiler};
//! use content_blocks_loader::{DocumentSet, ProjectConfig, load_base_schema};
//!
//! let config = ProjectConfig::load("content-blocks.yaml").unwrap();
//! let base_dir = Path::new(".");
//!
//! let catalog = FieldTypeCatalog::standard();
//! let mut compiler = match config.base_schema_path(base_dir) {
//!     Some(path) => {
//!         let base = load_base_schema(path, &catalog).unwrap();
//!         SchemaCompiler::with_parts(catalog, base)
//!     }
//!     None => SchemaCompiler::new(),
//! };
//!
//! let set = DocumentSet::from_config(&config, base_dir).unwrap();
//! let result = set.compile(&mut compiler).unwrap();
//! println!("{} tables", result.tables.len());
//! ```

mod base_schema;
mod config;
mod error;
mod loader;

pub use base_schema::{load_base_schema, parse_base_schema};
pub use config::{DEFAULT_CONFIG_FILE, OutputConfig, OutputFormat, ProjectConfig};
pub use error::{LoaderError, Result};
pub use loader::{
    DOCUMENT_FILE, DocumentSet, DocumentSetBuilder, DocumentSource, is_valid_document_name,
};
