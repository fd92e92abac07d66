//! Inputs and working state of one compilation pass.
//!
//! A pass compiles one field list into one table: the document's root table,
//! or the child table of a collection. [`ProcessingInput`] bundles what the
//! pass reads; [`ProcessedFieldsResult`] is what it writes. The accumulator
//! is created fresh per pass and never shared between passes, which is what
//! makes identifier uniqueness a per-pass property.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::definition::{ContentTypeDefinition, ContentTypeIcon, TableDefinition};
use crate::document::{ContentTypeKind, FieldNode, SchemaDocument, TableSettings};
use crate::error::{CompileError, IdentifierNamespace, Result};
use crate::identifier::PrefixPolicy;

/// The field list and table settings one pass compiles.
#[derive(Debug, Clone)]
pub struct SchemaFragment<'a> {
    pub fields: &'a [FieldNode],
    pub settings: TableSettings,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
}

/// Immutable inputs of one compilation pass.
#[derive(Debug, Clone)]
pub struct ProcessingInput<'a> {
    pub fragment: SchemaFragment<'a>,
    pub document: &'a SchemaDocument,
    /// Table this pass writes to.
    pub table: String,
    /// Table the owning document names directly.
    pub root_table: String,
    pub kind: ContentTypeKind,
    pub type_field: Option<String>,
    pub type_name: Option<String>,
    pub policy: PrefixPolicy,
}

impl<'a> ProcessingInput<'a> {
    /// Builds the input of a document's root pass.
    ///
    /// The document must already have passed validation, which guarantees a
    /// table name and a discriminator value.
    pub fn for_document(document: &'a SchemaDocument) -> Result<Self> {
        let table = document
            .table_name()
            .filter(|table| !table.is_empty())
            .ok_or_else(|| CompileError::MissingTable {
                document: document.name.clone(),
            })?
            .to_string();

        Ok(Self {
            fragment: SchemaFragment {
                fields: &document.fields,
                settings: document.settings.clone(),
                title: document.title.as_deref(),
                description: document.description.as_deref(),
            },
            document,
            root_table: table.clone(),
            table,
            kind: document.kind,
            type_field: document.type_field_name().map(String::from),
            type_name: Some(resolved_type_name(document)?),
            policy: PrefixPolicy::from_document(document),
        })
    }

    /// Builds the input of a collection's child table pass.
    ///
    /// Collection types are anonymous record types: no discriminator, and a
    /// title inherited from the collection field's label.
    pub fn for_collection(&self, node: &'a FieldNode, child_table: &str) -> Result<Self> {
        Ok(Self {
            fragment: SchemaFragment {
                fields: &node.fields,
                settings: node.table_settings(self.document_name())?,
                title: node.label.as_deref().or(node.identifier.as_deref()),
                description: node.description.as_deref(),
            },
            document: self.document,
            table: child_table.to_string(),
            root_table: self.root_table.clone(),
            kind: ContentTypeKind::RecordType,
            type_field: None,
            type_name: None,
            policy: self.policy.clone(),
        })
    }

    /// Returns `true` when this pass writes the document's own table.
    pub fn is_root_table(&self) -> bool {
        self.table == self.root_table
    }

    /// Name of the owning document.
    pub fn document_name(&self) -> &str {
        &self.document.name
    }
}

/// Discriminator value a document activates on.
///
/// Authored values win. Content elements and record types with a type field
/// default to the full `vendor_package` prefix; record types without one use
/// `"1"`. Page and file types must author theirs.
pub fn resolved_type_name(document: &SchemaDocument) -> Result<String> {
    if let Some(type_name) = &document.type_name {
        if type_name.trim().is_empty() {
            return Err(CompileError::MissingTypeName {
                document: document.name.clone(),
            });
        }
        return Ok(type_name.clone());
    }
    match document.kind {
        ContentTypeKind::ContentElement => full_prefix(document),
        ContentTypeKind::RecordType if document.type_field.is_some() => full_prefix(document),
        ContentTypeKind::RecordType => Ok("1".to_string()),
        ContentTypeKind::PageType | ContentTypeKind::FileType => {
            Err(CompileError::MissingTypeName {
                document: document.name.clone(),
            })
        }
    }
}

fn full_prefix(document: &SchemaDocument) -> Result<String> {
    let (vendor, package) = document.vendor_and_package()?;
    Ok(format!(
        "{}_{}",
        vendor.replace('-', ""),
        package.replace('-', "")
    ))
}

/// Mutable working state of one compilation pass.
#[derive(Debug, Clone)]
pub struct ProcessedFieldsResult {
    pub table: TableDefinition,
    pub content_type: ContentTypeDefinition,
    field_identifiers: HashSet<String>,
    palette_identifiers: HashSet<String>,
    tab_identifiers: HashSet<String>,
    /// Author identifier to unique identifier of every field of this pass.
    pub identifier_map: IndexMap<String, String>,
}

impl ProcessedFieldsResult {
    /// Creates the accumulator bound to a pass.
    pub fn new(input: &ProcessingInput<'_>) -> Result<Self> {
        let (vendor, package) = input.document.vendor_and_package()?;
        let root = input.is_root_table();

        let mut table = TableDefinition::new(&input.table, root);
        table.type_field = input.type_field.clone();

        let content_type = ContentTypeDefinition {
            identifier: if root {
                input.document.name.clone()
            } else {
                format!("{}/{}", input.document.name, input.table)
            },
            table: input.table.clone(),
            kind: input.kind,
            type_name: input.type_name.clone(),
            title: None,
            description: None,
            title_path: None,
            description_path: None,
            show_items: Vec::new(),
            override_columns: Vec::new(),
            vendor: vendor.to_string(),
            package: package.to_string(),
            icon: root.then(|| ContentTypeIcon {
                identifier: format!("{}-{vendor}-{package}", input.kind.icon_prefix()),
                source: input.document.icon.clone(),
            }),
            priority: if root { input.document.priority } else { 0 },
            group: match (root, input.kind) {
                (true, ContentTypeKind::ContentElement) => Some(
                    input
                        .document
                        .group
                        .clone()
                        .unwrap_or_else(|| "default".to_string()),
                ),
                _ => None,
            },
        };

        Ok(Self {
            table,
            content_type,
            field_identifiers: HashSet::new(),
            palette_identifiers: HashSet::new(),
            tab_identifiers: HashSet::new(),
            identifier_map: IndexMap::new(),
        })
    }

    /// Claims an identifier in a namespace, failing on reuse.
    pub fn claim(
        &mut self,
        document: &str,
        namespace: IdentifierNamespace,
        identifier: &str,
    ) -> Result<()> {
        let set = match namespace {
            IdentifierNamespace::Palette => &mut self.palette_identifiers,
            IdentifierNamespace::Tab => &mut self.tab_identifiers,
            _ => &mut self.field_identifiers,
        };
        if set.insert(identifier.to_string()) {
            Ok(())
        } else {
            Err(CompileError::DuplicateIdentifier {
                document: document.to_string(),
                namespace,
                identifier: identifier.to_string(),
            })
        }
    }

    /// Consumes the accumulator, yielding the pass's contribution.
    pub fn into_parts(self) -> (TableDefinition, ContentTypeDefinition) {
        (self.table, self.content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_type_name_defaults() {
        let element = SchemaDocument::new("my-vendor/hero", ContentTypeKind::ContentElement);
        assert_eq!(resolved_type_name(&element).unwrap(), "myvendor_hero");

        let record = SchemaDocument::new("acme/news", ContentTypeKind::RecordType).with_table("tx_news");
        assert_eq!(resolved_type_name(&record).unwrap(), "1");

        let typed = record.clone().with_type_field("type");
        assert_eq!(resolved_type_name(&typed).unwrap(), "acme_news");

        let page = SchemaDocument::new("acme/blog", ContentTypeKind::PageType);
        assert!(matches!(
            resolved_type_name(&page),
            Err(CompileError::MissingTypeName { .. })
        ));
        assert_eq!(
            resolved_type_name(&page.with_type_name("1701")).unwrap(),
            "1701"
        );
    }

    #[test]
    fn test_empty_type_name_is_rejected() {
        let element = SchemaDocument::new("acme/hero", ContentTypeKind::ContentElement).with_type_name(" ");
        assert!(resolved_type_name(&element).is_err());
    }

    #[test]
    fn test_collection_input_is_anonymous_record_type() {
        let document = SchemaDocument::new("acme/hero", ContentTypeKind::ContentElement);
        let input = ProcessingInput::for_document(&document).unwrap();
        let node = FieldNode::new("slides", "Collection").with_label("Slides");

        let child = input.for_collection(&node, "acme_hero_slides").unwrap();
        assert!(!child.is_root_table());
        assert_eq!(child.kind, ContentTypeKind::RecordType);
        assert_eq!(child.type_field, None);
        assert_eq!(child.type_name, None);
        assert_eq!(child.fragment.title, Some("Slides"));
        assert_eq!(child.root_table, "tt_content");
    }

    #[test]
    fn test_claim_namespaces_are_independent() {
        let document = SchemaDocument::new("acme/hero", ContentTypeKind::ContentElement);
        let input = ProcessingInput::for_document(&document).unwrap();
        let mut result = ProcessedFieldsResult::new(&input).unwrap();

        result.claim("acme/hero", IdentifierNamespace::Field, "header").unwrap();
        result.claim("acme/hero", IdentifierNamespace::Palette, "header").unwrap();
        result.claim("acme/hero", IdentifierNamespace::Tab, "header").unwrap();
        let err = result
            .claim("acme/hero", IdentifierNamespace::Field, "header")
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::DuplicateIdentifier {
                namespace: IdentifierNamespace::Field,
                ..
            }
        ));
    }

    #[test]
    fn test_root_content_type_carries_icon_and_group() {
        let document = SchemaDocument::new("acme/hero", ContentTypeKind::ContentElement);
        let input = ProcessingInput::for_document(&document).unwrap();
        let result = ProcessedFieldsResult::new(&input).unwrap();

        assert_eq!(result.content_type.identifier, "acme/hero");
        assert_eq!(result.content_type.group.as_deref(), Some("default"));
        assert_eq!(
            result.content_type.icon.as_ref().map(|icon| icon.identifier.as_str()),
            Some("content-acme-hero")
        );
    }
}
