//! Field type resolution.

use crate::catalog::{FieldKind, TypeDescriptor};
use crate::context::ProcessingInput;
use crate::document::FieldNode;
use crate::error::{CompileError, Result};

use super::SchemaCompiler;

impl SchemaCompiler {
    /// Resolves the type descriptor of a field node.
    ///
    /// Nodes bound to an existing column take the base schema's descriptor
    /// when the column is known; otherwise, and for every other node, the
    /// authored `type` is looked up in the catalog.
    pub(super) fn resolve_type(
        &self,
        input: &ProcessingInput<'_>,
        node: &FieldNode,
    ) -> Result<TypeDescriptor> {
        let document = input.document_name();

        if node.use_existing_field {
            let identifier = require_identifier(document, node, "useExistingField")?;
            if let Some(descriptor) = self.base_schema.get(&input.table, identifier) {
                return Ok(descriptor.clone());
            }
        }

        let Some(type_name) = node.type_name.as_deref() else {
            return Err(CompileError::MissingType {
                document: document.to_string(),
                identifier: node.identifier.clone().unwrap_or_default(),
                valid: self.catalog.names(),
            });
        };

        let Some(descriptor) = self.catalog.get(type_name) else {
            return Err(CompileError::UnknownType {
                document: document.to_string(),
                identifier: node.identifier.clone().unwrap_or_default(),
                type_name: type_name.to_string(),
                valid: self.catalog.names(),
            });
        };

        if descriptor.kind != FieldKind::Linebreak {
            require_identifier(document, node, type_name)?;
        }

        Ok(descriptor.clone())
    }
}

/// Returns the node's identifier or fails naming the context.
pub(super) fn require_identifier<'n>(
    document: &str,
    node: &'n FieldNode,
    context: &str,
) -> Result<&'n str> {
    match node.identifier.as_deref() {
        Some(identifier) if !identifier.trim().is_empty() => Ok(identifier),
        _ => Err(CompileError::MissingIdentifier {
            document: document.to_string(),
            context: format!("type \"{context}\""),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_schema::StaticBaseSchema;
    use crate::catalog::{FieldTypeCatalog, TcaKind};
    use crate::document::{ContentTypeKind, SchemaDocument};
    use crate::error::ErrorCategory;

    fn document() -> SchemaDocument {
        SchemaDocument::new("acme/teaser", ContentTypeKind::ContentElement)
    }

    #[test]
    fn test_existing_field_uses_base_schema() {
        let compiler = SchemaCompiler::new();
        let document = document();
        let input = ProcessingInput::for_document(&document).unwrap();

        let descriptor = compiler
            .resolve_type(&input, &FieldNode::existing("bodytext"))
            .unwrap();
        assert_eq!(descriptor.tca, TcaKind::Text);
    }

    #[test]
    fn test_unknown_existing_field_falls_back_to_type() {
        let compiler = SchemaCompiler::with_parts(FieldTypeCatalog::standard(), StaticBaseSchema::new());
        let document = document();
        let input = ProcessingInput::for_document(&document).unwrap();

        let err = compiler
            .resolve_type(&input, &FieldNode::existing("bodytext"))
            .unwrap_err();
        assert!(matches!(err, CompileError::MissingType { .. }));

        let mut node = FieldNode::existing("bodytext");
        node.type_name = Some("Textarea".into());
        assert_eq!(compiler.resolve_type(&input, &node).unwrap().name, "Textarea");
    }

    #[test]
    fn test_unknown_type_lists_sorted_names() {
        let compiler = SchemaCompiler::new();
        let document = document();
        let input = ProcessingInput::for_document(&document).unwrap();

        let err = compiler
            .resolve_type(&input, &FieldNode::new("headline", "Txt"))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnknownType);
        match err {
            CompileError::UnknownType { valid, .. } => {
                let mut sorted = valid.clone();
                sorted.sort();
                assert_eq!(valid, sorted);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_linebreak_needs_no_identifier() {
        let compiler = SchemaCompiler::new();
        let document = document();
        let input = ProcessingInput::for_document(&document).unwrap();

        let descriptor = compiler.resolve_type(&input, &FieldNode::linebreak()).unwrap();
        assert_eq!(descriptor.kind, FieldKind::Linebreak);

        let mut anonymous = FieldNode::new("x", "Text");
        anonymous.identifier = None;
        assert!(matches!(
            compiler.resolve_type(&input, &anonymous),
            Err(CompileError::MissingIdentifier { .. })
        ));
    }
}
