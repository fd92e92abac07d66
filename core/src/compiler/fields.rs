//! The recursive field walk of one compilation pass.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::catalog::{FieldKind, ItemLabels, TcaKind, TypeDescriptor};
use crate::context::{ProcessedFieldsResult, ProcessingInput};
use crate::definition::{
    CompiledField, PaletteDefinition, PaletteItem, ShowItem, SortField, SortOrder, TableDefinition,
};
use crate::document::{
    ContentTypeKind, FieldItem, FieldNode, SELECT_TYPE, TABLE_SETTING_KEYS, TableSettings,
};
use crate::error::{CompileError, IdentifierNamespace, Result};
use crate::identifier::assign_field_identifier;
use crate::language::LanguagePath;
use crate::merge::TableContributions;

use super::SchemaCompiler;
use super::resolve::require_identifier;

/// Identifier of the palette prepended to page types.
pub(super) const PAGE_TITLE_PALETTE: &str = "page_title";

impl SchemaCompiler {
    /// Compiles one field list into one table and content type.
    ///
    /// Collection fields recurse into this function for their child tables.
    pub(super) fn process_fields(
        &mut self,
        input: &ProcessingInput<'_>,
        path: &mut LanguagePath,
        tables: &mut IndexMap<String, TableContributions>,
    ) -> Result<()> {
        // Reserve the slot so that parent tables precede their children.
        tables.entry(input.table.clone()).or_default();

        let mut result = ProcessedFieldsResult::new(input)?;
        self.process_title(input, path, &mut result);

        let synthesized = self.synthesized_fields(input);
        for node in synthesized.iter().chain(input.fragment.fields) {
            let descriptor = self.resolve_type(input, node)?;
            match descriptor.kind {
                FieldKind::Linebreak => {
                    return Err(CompileError::LinebreakOutsidePalette {
                        document: input.document_name().to_string(),
                    });
                }
                FieldKind::Tab => self.process_tab(input, path, &mut result, node)?,
                FieldKind::Palette => {
                    self.process_palette(input, path, &mut result, tables, node)?
                }
                FieldKind::Ordinary | FieldKind::Collection | FieldKind::FlexForm => {
                    let unique =
                        self.process_field(input, path, &mut result, tables, node, descriptor)?;
                    result.content_type.show_items.push(ShowItem::Field(unique));
                }
            }
        }

        apply_table_settings(input, &result.identifier_map, &mut result.table)?;

        let type_field = input.type_field.as_deref();
        result.content_type.override_columns = result
            .table
            .fields
            .values()
            .filter(|field| Some(field.unique_identifier.as_str()) != type_field)
            .cloned()
            .collect();

        let (table, content_type) = result.into_parts();
        tables
            .entry(input.table.clone())
            .or_default()
            .contribute(table, content_type);
        Ok(())
    }

    fn process_title(
        &mut self,
        input: &ProcessingInput<'_>,
        path: &LanguagePath,
        result: &mut ProcessedFieldsResult,
    ) {
        let fragment = &input.fragment;
        let content_type = &mut result.content_type;

        if !input.is_root_table() {
            content_type.title = fragment.title.map(String::from);
            content_type.description = fragment.description.map(String::from);
            return;
        }

        let document = input.document_name();
        let title = fragment.title.unwrap_or(input.document.display_name());
        content_type.title = Some(title.to_string());
        content_type.title_path = Some(self.register_key(document, path, "title", title));
        content_type.description = fragment.description.map(String::from);
        content_type.description_path = Some(self.register_key(
            document,
            path,
            "description",
            fragment.description.unwrap_or_default(),
        ));
    }

    /// Nodes prepended to the authored field list.
    fn synthesized_fields(&self, input: &ProcessingInput<'_>) -> Vec<FieldNode> {
        let mut nodes = Vec::new();
        if !input.is_root_table() {
            return nodes;
        }

        if input.kind == ContentTypeKind::RecordType {
            if let (Some(type_field), Some(type_name)) = (&input.type_field, &input.type_name) {
                let authored = authored_identifiers(input.fragment.fields)
                    .any(|identifier| identifier == type_field);
                let known = self.base_schema.has(&input.table, type_field)
                    || self.type_field_per_table.get(&input.table) == Some(type_field);
                if !authored && !known {
                    debug!(
                        table = %input.table,
                        field = %type_field,
                        "synthesizing discriminator field"
                    );
                    nodes.push(discriminator_field(input, type_field, type_name));
                }
            }
        }

        if input.kind == ContentTypeKind::PageType {
            nodes.push(page_title_palette());
        }

        nodes
    }

    fn process_tab(
        &mut self,
        input: &ProcessingInput<'_>,
        path: &LanguagePath,
        result: &mut ProcessedFieldsResult,
        node: &FieldNode,
    ) -> Result<()> {
        let document = input.document_name();
        let identifier = require_identifier(document, node, "Tab")?;
        result.claim(document, IdentifierNamespace::Tab, identifier)?;

        let label = node.label.as_deref().unwrap_or(identifier);
        self.register_key(document, path, &format!("tabs.{identifier}"), label);
        result
            .content_type
            .show_items
            .push(ShowItem::Tab(identifier.to_string()));
        Ok(())
    }

    fn process_palette(
        &mut self,
        input: &ProcessingInput<'_>,
        path: &mut LanguagePath,
        result: &mut ProcessedFieldsResult,
        tables: &mut IndexMap<String, TableContributions>,
        node: &FieldNode,
    ) -> Result<()> {
        let document = input.document_name();
        let identifier = require_identifier(document, node, "Palette")?;
        result.claim(document, IdentifierNamespace::Palette, identifier)?;

        if node.fields.is_empty() {
            warn!(document, palette = identifier, "skipping empty palette");
            return Ok(());
        }

        let unique = assign_field_identifier(
            document,
            &input.policy,
            node,
            identifier,
            input.is_root_table(),
        )?;
        let label = node.label.as_deref().unwrap_or(identifier);
        let label_path =
            self.register_key(document, path, &format!("palettes.{identifier}.label"), label);
        let description_path = node.description.as_deref().map(|description| {
            self.register_key(
                document,
                path,
                &format!("palettes.{identifier}.description"),
                description,
            )
        });

        let mut items = Vec::with_capacity(node.fields.len());
        for child in &node.fields {
            let descriptor = self.resolve_type(input, child)?;
            match descriptor.kind {
                FieldKind::Palette | FieldKind::Tab => {
                    return Err(CompileError::NestedInPalette {
                        document: document.to_string(),
                        palette: identifier.to_string(),
                        identifier: child.identifier.clone().unwrap_or_default(),
                        kind: descriptor.name.to_lowercase(),
                    });
                }
                FieldKind::Linebreak => items.push(PaletteItem::Linebreak),
                FieldKind::Ordinary | FieldKind::Collection | FieldKind::FlexForm => {
                    let field =
                        self.process_field(input, path, result, tables, child, descriptor)?;
                    items.push(PaletteItem::Field(field));
                }
            }
        }

        result.table.palettes.insert(
            unique.clone(),
            PaletteDefinition {
                identifier: unique.clone(),
                label: node.label.clone(),
                description: node.description.clone(),
                label_path,
                description_path,
                items,
            },
        );
        result.content_type.show_items.push(ShowItem::Palette(unique));
        Ok(())
    }

    /// Runs the per-field pipeline and returns the field's unique identifier.
    pub(super) fn process_field(
        &mut self,
        input: &ProcessingInput<'_>,
        path: &mut LanguagePath,
        result: &mut ProcessedFieldsResult,
        tables: &mut IndexMap<String, TableContributions>,
        node: &FieldNode,
        descriptor: TypeDescriptor,
    ) -> Result<String> {
        let document = input.document_name();
        let identifier = require_identifier(document, node, &descriptor.name)?;
        result.claim(document, IdentifierNamespace::Field, identifier)?;

        let is_discriminator =
            input.is_root_table() && input.type_field.as_deref() == Some(identifier);
        let unique = if is_discriminator {
            identifier.to_string()
        } else {
            assign_field_identifier(
                document,
                &input.policy,
                node,
                identifier,
                input.is_root_table(),
            )?
        };

        let mut scope = path.scoped(identifier);
        let (label_path, description_path) =
            self.register_labels(document, &scope, node, identifier, &descriptor);

        let mut config: Map<String, Value> = node
            .config
            .iter()
            .filter(|(key, _)| {
                descriptor.kind != FieldKind::Collection
                    || !TABLE_SETTING_KEYS.contains(&key.as_str())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if descriptor.kind == FieldKind::FlexForm {
            let data_structure = self.expand_flexform(input, &mut scope, node, identifier)?;
            config.insert("ds".to_string(), data_structure);
        }
        if let Some(items) = self.register_items(document, &scope, node, &descriptor) {
            config.insert("items".to_string(), items);
        }

        let mut field = CompiledField {
            unique_identifier: unique.clone(),
            identifier: identifier.to_string(),
            field_type: descriptor,
            label: node.label.clone(),
            description: node.description.clone(),
            label_path,
            description_path,
            use_existing_field: node.use_existing_field,
            display_cond: node.display_cond.clone(),
            config,
        };

        if field.tca() == TcaKind::Inline {
            self.expand_collection(input, &mut scope, tables, node, &mut field)?;
        }
        drop(scope);

        result
            .identifier_map
            .insert(identifier.to_string(), unique.clone());
        result.table.fields.insert(unique.clone(), field);
        Ok(unique)
    }

    /// Registers label and description keys of a field below `path`.
    ///
    /// Passthrough fields have no form presence and register nothing; their
    /// label path is still computed so the compiled field stays uniform.
    pub(super) fn register_labels(
        &mut self,
        document: &str,
        path: &LanguagePath,
        node: &FieldNode,
        identifier: &str,
        descriptor: &TypeDescriptor,
    ) -> (String, Option<String>) {
        if descriptor.tca == TcaKind::Passthrough {
            return (path.path_for("label"), None);
        }
        let label = node.label.as_deref().unwrap_or(identifier);
        let label_path = self.register_key(document, path, "label", label);
        let description_path = node
            .description
            .as_deref()
            .map(|description| self.register_key(document, path, "description", description));
        (label_path, description_path)
    }

    /// Registers item labels and returns the compiled item list, if any.
    pub(super) fn register_items(
        &mut self,
        document: &str,
        path: &LanguagePath,
        node: &FieldNode,
        descriptor: &TypeDescriptor,
    ) -> Option<Value> {
        if descriptor.items == ItemLabels::None || node.items.is_empty() {
            return None;
        }

        let mut compiled = Vec::with_capacity(node.items.len());
        for (index, item) in node.items.iter().enumerate() {
            let mut entry = item_entry(item);
            if let Some(label) = &item.label {
                let key = match (descriptor.items, &item.value) {
                    (ItemLabels::ByValue, Some(value)) => item_key(value),
                    _ => index.to_string(),
                };
                let label_path =
                    self.register_key(document, path, &format!("items.{key}.label"), label);
                entry.insert("labelPath".to_string(), Value::String(label_path));
            }
            compiled.push(Value::Object(entry));
        }
        Some(Value::Array(compiled))
    }
}

/// Identifiers of authored top-level fields and palette children.
fn authored_identifiers<'a>(fields: &'a [FieldNode]) -> impl Iterator<Item = &'a str> {
    fields
        .iter()
        .flat_map(|node| std::iter::once(node).chain(node.fields.iter()))
        .filter_map(|node| node.identifier.as_deref())
}

fn discriminator_field(input: &ProcessingInput<'_>, type_field: &str, type_name: &str) -> FieldNode {
    let title = input
        .fragment
        .title
        .unwrap_or(input.document.display_name());
    let mut node = FieldNode::new(type_field, SELECT_TYPE)
        .with_items(vec![FieldItem::new(title, type_name)])
        .with_config("default", type_name);
    node.prefix_field = Some(false);
    node
}

fn page_title_palette() -> FieldNode {
    let existing = |identifier: &str, type_name: &str| {
        let mut node = FieldNode::existing(identifier);
        node.type_name = Some(type_name.to_string());
        node
    };
    let mut palette = FieldNode::new(PAGE_TITLE_PALETTE, "Palette")
        .with_label("Title")
        .with_fields(vec![
            existing("title", "Text"),
            FieldNode::linebreak(),
            existing("slug", "Slug"),
            FieldNode::linebreak(),
            existing("nav_title", "Text"),
        ]);
    palette.prefix_field = Some(false);
    palette
}

fn item_entry(item: &FieldItem) -> Map<String, Value> {
    let mut entry = item.extra.clone();
    if let Some(label) = &item.label {
        entry.insert("label".to_string(), Value::String(label.clone()));
    }
    if let Some(value) = &item.value {
        entry.insert("value".to_string(), value.clone());
    }
    entry
}

fn item_key(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}

/// Copies table-level settings into the pass's table definition, rewriting
/// author identifiers to the unique identifiers of this pass.
fn apply_table_settings(
    input: &ProcessingInput<'_>,
    identifier_map: &IndexMap<String, String>,
    table: &mut TableDefinition,
) -> Result<()> {
    let settings: &TableSettings = &input.fragment.settings;
    let resolve = |identifier: &str| {
        identifier_map
            .get(identifier)
            .cloned()
            .unwrap_or_else(|| identifier.to_string())
    };

    if let Some(label_field) = &settings.label_field {
        table.label_field = label_field
            .identifiers()
            .iter()
            .map(|identifier| resolve(identifier.as_str()))
            .collect();
    }
    table.fallback_label_fields = settings
        .fallback_label_fields
        .iter()
        .map(|identifier| resolve(identifier.as_str()))
        .collect();

    if let Some(sort_field) = &settings.sort_field {
        let mut sort_fields = Vec::new();
        for entry in sort_field.entries() {
            let order = match entry.order.as_deref().map(str::to_ascii_lowercase).as_deref() {
                None | Some("asc") => SortOrder::Asc,
                Some("desc") => SortOrder::Desc,
                Some(_) => {
                    return Err(CompileError::InvalidSortOrder {
                        document: input.document_name().to_string(),
                        field: entry.identifier.clone(),
                        value: entry.order.clone().unwrap_or_default(),
                    });
                }
            };
            sort_fields.push(SortField {
                identifier: resolve(entry.identifier.as_str()),
                order,
            });
        }
        table.sort_fields = sort_fields;
    }

    table.aggregate_root = settings.aggregate_root;
    table.root_level_type = settings.root_level_type.clone();
    table.append_label = settings.append_label;
    table.capabilities = settings.capabilities.clone();

    for field in table.fields.values_mut() {
        if let Some(condition) = &mut field.display_cond {
            rewrite_display_cond(condition, identifier_map);
        }
    }
    Ok(())
}

/// Rewrites `FIELD:<identifier>:...` conditions to unique identifiers.
fn rewrite_display_cond(condition: &mut Value, identifier_map: &IndexMap<String, String>) {
    match condition {
        Value::String(text) => {
            if let Some(rewritten) = rewrite_field_condition(text, identifier_map) {
                *text = rewritten;
            }
        }
        Value::Array(conditions) => {
            for condition in conditions {
                rewrite_display_cond(condition, identifier_map);
            }
        }
        Value::Object(conditions) => {
            for condition in conditions.values_mut() {
                rewrite_display_cond(condition, identifier_map);
            }
        }
        _ => {}
    }
}

fn rewrite_field_condition(text: &str, identifier_map: &IndexMap<String, String>) -> Option<String> {
    let rest = text.strip_prefix("FIELD:")?;
    let (identifier, tail) = match rest.split_once(':') {
        Some((identifier, tail)) => (identifier, Some(tail)),
        None => (rest, None),
    };
    let unique = identifier_map.get(identifier)?;
    Some(match tail {
        Some(tail) => format!("FIELD:{unique}:{tail}"),
        None => format!("FIELD:{unique}"),
    })
}
