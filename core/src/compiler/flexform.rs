//! FlexForm data structure expansion.
//!
//! A FlexForm field holds either plain fields (one implicit default sheet) or
//! nodes of type `Sheet`, never both. Sheet leaves may be ordinary fields or
//! `Section`s; a section lists `container` templates whose fields must be
//! renderable ordinary types. Leaf identifiers are never prefixed and must be
//! unique across the whole FlexForm.

use std::collections::HashSet;

use serde_json::{Map, Value, json};

use crate::catalog::FieldKind;
use crate::context::ProcessingInput;
use crate::document::FieldNode;
use crate::error::{CompileError, IdentifierNamespace, Result};
use crate::language::LanguagePath;

use super::SchemaCompiler;
use super::resolve::require_identifier;

/// Key of the implicit sheet of FlexForms without sheets.
pub const DEFAULT_SHEET: &str = "sDEF";

/// Data structure key used when the owning table has no discriminator.
pub const DEFAULT_DATA_STRUCTURE_KEY: &str = "default";

const SHEET_TYPE: &str = "Sheet";
const SECTION_TYPE: &str = "Section";

/// Where a FlexForm leaf sits; containers are stricter than sheets.
#[derive(Clone, Copy, PartialEq, Eq)]
enum LeafScope {
    Sheet,
    Container,
}

impl SchemaCompiler {
    /// Expands a FlexForm field into its data structure.
    pub(super) fn expand_flexform(
        &mut self,
        input: &ProcessingInput<'_>,
        path: &mut LanguagePath,
        node: &FieldNode,
        identifier: &str,
    ) -> Result<Value> {
        let document = input.document_name();
        let sheet_count = node
            .fields
            .iter()
            .filter(|child| child.has_type(SHEET_TYPE))
            .count();
        if sheet_count > 0 && sheet_count < node.fields.len() {
            return Err(CompileError::FlexFormMixedSheets {
                document: document.to_string(),
                identifier: identifier.to_string(),
            });
        }

        let mut leaves = HashSet::new();
        let mut sheets = Map::new();
        if sheet_count == 0 {
            let sheet = self.flexform_sheet(input, path, identifier, None, &node.fields, &mut leaves)?;
            sheets.insert(DEFAULT_SHEET.to_string(), sheet);
        } else {
            let mut sheet_identifiers = HashSet::new();
            for sheet in &node.fields {
                let sheet_identifier = require_identifier(document, sheet, SHEET_TYPE)?;
                if !sheet_identifiers.insert(sheet_identifier) {
                    return Err(CompileError::DuplicateIdentifier {
                        document: document.to_string(),
                        namespace: IdentifierNamespace::Sheet,
                        identifier: sheet_identifier.to_string(),
                    });
                }
                let compiled = self.flexform_sheet(
                    input,
                    path,
                    identifier,
                    Some(sheet),
                    &sheet.fields,
                    &mut leaves,
                )?;
                sheets.insert(sheet_identifier.to_string(), compiled);
            }
        }

        let key = match (&input.type_field, &input.type_name) {
            (Some(_), Some(type_name)) => type_name.clone(),
            _ => DEFAULT_DATA_STRUCTURE_KEY.to_string(),
        };
        let mut data_structure = Map::new();
        data_structure.insert(key, json!({ "sheets": sheets }));
        Ok(Value::Object(data_structure))
    }

    fn flexform_sheet(
        &mut self,
        input: &ProcessingInput<'_>,
        path: &mut LanguagePath,
        flexform: &str,
        sheet: Option<&FieldNode>,
        fields: &[FieldNode],
        leaves: &mut HashSet<String>,
    ) -> Result<Value> {
        let document = input.document_name();
        let mut root = Map::new();

        if let Some(sheet) = sheet {
            let identifier = require_identifier(document, sheet, SHEET_TYPE)?;
            let label = sheet.label.as_deref().unwrap_or(identifier);
            let title = self.register_key(document, path, &format!("sheets.{identifier}.label"), label);
            root.insert("sheetTitle".to_string(), Value::String(title));
            if let Some(description) = sheet.description.as_deref() {
                let description = self.register_key(
                    document,
                    path,
                    &format!("sheets.{identifier}.description"),
                    description,
                );
                root.insert("sheetDescription".to_string(), Value::String(description));
            }
            if let Some(link_title) = sheet.link_title.as_deref() {
                let link_title = self.register_key(
                    document,
                    path,
                    &format!("sheets.{identifier}.linkTitle"),
                    link_title,
                );
                root.insert("sheetShortDescr".to_string(), Value::String(link_title));
            }
        }

        let mut elements = Map::new();
        for field in fields {
            if field.has_type(SECTION_TYPE) {
                let identifier = require_identifier(document, field, SECTION_TYPE)?;
                claim_leaf(document, leaves, identifier)?;
                let section = self.flexform_section(input, path, flexform, field, identifier)?;
                elements.insert(identifier.to_string(), section);
            } else {
                let (identifier, element) =
                    self.flexform_leaf(input, path, flexform, field, LeafScope::Sheet)?;
                claim_leaf(document, leaves, &identifier)?;
                elements.insert(identifier, element);
            }
        }

        root.insert("type".to_string(), Value::String("array".to_string()));
        root.insert("el".to_string(), Value::Object(elements));
        Ok(json!({ "ROOT": root }))
    }

    fn flexform_section(
        &mut self,
        input: &ProcessingInput<'_>,
        path: &mut LanguagePath,
        flexform: &str,
        section: &FieldNode,
        identifier: &str,
    ) -> Result<Value> {
        let document = input.document_name();
        if section.container.is_empty() {
            return Err(CompileError::FlexFormEmptySection {
                document: document.to_string(),
                identifier: flexform.to_string(),
                section: identifier.to_string(),
            });
        }

        let label = section.label.as_deref().unwrap_or(identifier);
        let title = self.register_key(document, path, &format!("sections.{identifier}.title"), label);

        let mut container_identifiers = HashSet::new();
        let mut containers = Map::new();
        for container in &section.container {
            let container_identifier = require_identifier(document, container, "Container")?;
            if !container_identifiers.insert(container_identifier) {
                return Err(CompileError::DuplicateIdentifier {
                    document: document.to_string(),
                    namespace: IdentifierNamespace::Container,
                    identifier: container_identifier.to_string(),
                });
            }
            if container.fields.is_empty() {
                return Err(CompileError::FlexFormEmptyContainer {
                    document: document.to_string(),
                    identifier: flexform.to_string(),
                    container: container_identifier.to_string(),
                });
            }

            let key = format!("sections.{identifier}.container.{container_identifier}");
            let label = container.label.as_deref().unwrap_or(container_identifier);
            let container_title = self.register_key(document, path, &format!("{key}.title"), label);

            let mut scope = path.scoped(key);
            let mut field_identifiers = HashSet::new();
            let mut elements = Map::new();
            for field in &container.fields {
                let (field_identifier, element) =
                    self.flexform_leaf(input, &mut scope, flexform, field, LeafScope::Container)?;
                if !field_identifiers.insert(field_identifier.clone()) {
                    return Err(CompileError::DuplicateIdentifier {
                        document: document.to_string(),
                        namespace: IdentifierNamespace::Field,
                        identifier: field_identifier,
                    });
                }
                elements.insert(field_identifier, element);
            }
            drop(scope);

            containers.insert(
                container_identifier.to_string(),
                json!({ "title": container_title, "type": "array", "el": elements }),
            );
        }

        Ok(json!({
            "title": title,
            "type": "array",
            "section": 1,
            "el": containers,
        }))
    }

    /// Compiles one FlexForm leaf and returns its raw identifier and element.
    fn flexform_leaf(
        &mut self,
        input: &ProcessingInput<'_>,
        path: &mut LanguagePath,
        flexform: &str,
        node: &FieldNode,
        scope: LeafScope,
    ) -> Result<(String, Value)> {
        let document = input.document_name();
        let descriptor = self.resolve_type(input, node)?;
        let allowed = descriptor.kind == FieldKind::Ordinary
            && (scope == LeafScope::Sheet || descriptor.renderable);
        if !allowed {
            return Err(CompileError::FlexFormDisallowedField {
                document: document.to_string(),
                identifier: flexform.to_string(),
                field: node.identifier.clone().unwrap_or_default(),
                type_name: descriptor.name.clone(),
            });
        }

        let identifier = require_identifier(document, node, &descriptor.name)?;
        let leaf = path.scoped(identifier);
        let (label_path, description_path) =
            self.register_labels(document, &leaf, node, identifier, &descriptor);

        let mut config = node.config.clone();
        if let Some(items) = self.register_items(document, &leaf, node, &descriptor) {
            config.insert("items".to_string(), items);
        }

        let mut element = Map::new();
        element.insert("label".to_string(), Value::String(label_path));
        if let Some(description_path) = description_path {
            element.insert("description".to_string(), Value::String(description_path));
        }
        element.insert("type".to_string(), Value::String(descriptor.name.clone()));
        if let Some(condition) = &node.display_cond {
            element.insert("displayCond".to_string(), condition.clone());
        }
        element.insert("config".to_string(), Value::Object(config));
        Ok((identifier.to_string(), Value::Object(element)))
    }
}

fn claim_leaf(document: &str, leaves: &mut HashSet<String>, identifier: &str) -> Result<()> {
    if leaves.insert(identifier.to_string()) {
        Ok(())
    } else {
        Err(CompileError::DuplicateIdentifier {
            document: document.to_string(),
            namespace: IdentifierNamespace::Field,
            identifier: identifier.to_string(),
        })
    }
}
