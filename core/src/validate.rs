//! Document-level validation.
//!
//! Checks the attributes of a [`SchemaDocument`] that must hold before any
//! field is visited: the qualified name, the target table and the
//! discriminator value. Field-level rules are enforced during the tree walk.
//!
//! # Examples
//!
//! ```
//! use content_blocks_core::{ContentTypeKind, SchemaDocument, validate_document};
//!
//! let element = SchemaDocument::new("acme/teaser", ContentTypeKind::ContentElement);
//! assert!(validate_document(&element).is_ok());
//!
//! // Record types have no default table.
//! let record = SchemaDocument::new("acme/news", ContentTypeKind::RecordType);
//! assert!(validate_document(&record).is_err());
//! ```

use crate::context::resolved_type_name;
use crate::document::{ContentTypeKind, FILE_TYPE_NAMES, SchemaDocument, split_qualified_name};
use crate::error::{CompileError, Result};

/// Validates a document before compilation.
///
/// # Errors
///
/// - [`CompileError::InvalidQualifiedName`] for names without `vendor/package`.
/// - [`CompileError::MissingTable`] for an absent or empty table name.
/// - [`CompileError::MissingTypeName`] for an empty or required but absent
///   discriminator value.
/// - [`CompileError::InvalidEnumValue`] for file types outside the allowed set.
pub fn validate_document(document: &SchemaDocument) -> Result<()> {
    split_qualified_name(&document.name)?;

    match document.table_name() {
        Some(table) if !table.trim().is_empty() => {}
        _ => {
            return Err(CompileError::MissingTable {
                document: document.name.clone(),
            });
        }
    }

    if let Some(type_field) = &document.type_field {
        if type_field.trim().is_empty() {
            return Err(CompileError::MissingIdentifier {
                document: document.name.clone(),
                context: "typeField".to_string(),
            });
        }
    }

    let type_name = resolved_type_name(document)?;
    if document.kind == ContentTypeKind::FileType && !FILE_TYPE_NAMES.contains(&type_name.as_str())
    {
        return Err(CompileError::InvalidEnumValue {
            document: document.name.clone(),
            attribute: "typeName".to_string(),
            value: type_name,
            valid: FILE_TYPE_NAMES.iter().map(|name| name.to_string()).collect(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_invalid_name_is_rejected() {
        let document = SchemaDocument::new("teaser", ContentTypeKind::ContentElement);
        let err = validate_document(&document).unwrap_err();
        assert!(matches!(err, CompileError::InvalidQualifiedName { .. }));
        assert_eq!(err.category(), ErrorCategory::MissingRequiredAttribute);
    }

    #[test]
    fn test_record_type_requires_table() {
        let document = SchemaDocument::new("acme/news", ContentTypeKind::RecordType);
        assert!(matches!(
            validate_document(&document),
            Err(CompileError::MissingTable { .. })
        ));

        let empty = document.clone().with_table("  ");
        assert!(matches!(
            validate_document(&empty),
            Err(CompileError::MissingTable { .. })
        ));

        assert!(validate_document(&document.with_table("tx_acme_news")).is_ok());
    }

    #[test]
    fn test_page_type_requires_type_name() {
        let document = SchemaDocument::new("acme/blog", ContentTypeKind::PageType);
        let err = validate_document(&document).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MissingRequiredAttribute);
        assert!(validate_document(&document.with_type_name("1701")).is_ok());
    }

    #[test]
    fn test_file_type_name_must_be_known() {
        let document = SchemaDocument::new("acme/poster", ContentTypeKind::FileType);
        assert!(validate_document(&document.clone().with_type_name("image")).is_ok());

        let err = validate_document(&document.with_type_name("poster")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidEnumValue);
        assert!(err.to_string().contains("text, image, audio, video, application"));
    }

    #[test]
    fn test_empty_type_field_is_rejected() {
        let document = SchemaDocument::new("acme/news", ContentTypeKind::RecordType)
            .with_table("tx_acme_news")
            .with_type_field("");
        assert!(matches!(
            validate_document(&document),
            Err(CompileError::MissingIdentifier { .. })
        ));
    }
}
