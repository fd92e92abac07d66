//! Merging of partial table definitions.
//!
//! Every compilation pass contributes one partial [`TableDefinition`] and one
//! [`ContentTypeDefinition`] per table it touches. [`merge_tables`] folds the
//! partial definitions of each table in contribution order so that the last
//! document wins for every scalar and nested setting, while content types are
//! concatenated unchanged.
//!
//! # Examples
//!
//! ```
//! use content_blocks_core::{TableDefinition, merge_table_definitions};
//!
//! let mut first = TableDefinition::new("tx_news", true);
//! first.aggregate_root = Some(true);
//! let mut second = TableDefinition::new("tx_news", true);
//! second.aggregate_root = Some(false);
//!
//! let merged = merge_table_definitions(&first, &second);
//! assert_eq!(merged.aggregate_root, Some(false));
//! ```

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::definition::{CompiledField, ContentTypeDefinition, TableDefinition};
use crate::document::RecordCapabilities;

/// Everything contributed to one table during a run.
#[derive(Debug, Clone, Default)]
pub struct TableContributions {
    /// Partial table definitions in contribution order.
    pub tables: Vec<TableDefinition>,
    /// Content types in contribution order.
    pub content_types: Vec<ContentTypeDefinition>,
}

impl TableContributions {
    /// Appends one pass's output.
    pub fn contribute(&mut self, table: TableDefinition, content_type: ContentTypeDefinition) {
        self.tables.push(table);
        self.content_types.push(content_type);
    }
}

/// Merges the contributions of every table.
///
/// Tables keep the order in which they were first touched.
pub fn merge_tables(
    contributions: IndexMap<String, TableContributions>,
) -> IndexMap<String, TableDefinition> {
    contributions
        .into_iter()
        .filter_map(|(name, contribution)| {
            let mut partials = contribution.tables.into_iter();
            let first = partials.next()?;
            let mut merged = partials.fold(first, |base, overlay| {
                merge_table_definitions(&base, &overlay)
            });
            merged.content_types = contribution.content_types;
            debug!(
                table = %name,
                fields = merged.fields.len(),
                content_types = merged.content_types.len(),
                "merged table"
            );
            Some((name, merged))
        })
        .collect()
}

/// Merges two partial definitions of the same table; `overlay` wins.
///
/// Content types are not touched; they are concatenated by [`merge_tables`].
pub fn merge_table_definitions(base: &TableDefinition, overlay: &TableDefinition) -> TableDefinition {
    let mut merged = base.clone();

    merged.is_root_table = base.is_root_table || overlay.is_root_table;
    merged.type_field = overlay.type_field.clone().or_else(|| base.type_field.clone());
    merged.aggregate_root = overlay.aggregate_root.or(base.aggregate_root);
    merged.root_level_type = overlay
        .root_level_type
        .clone()
        .or_else(|| base.root_level_type.clone());
    merged.append_label = overlay.append_label.or(base.append_label);

    if !overlay.label_field.is_empty() {
        merged.label_field = overlay.label_field.clone();
    }
    if !overlay.fallback_label_fields.is_empty() {
        merged.fallback_label_fields = overlay.fallback_label_fields.clone();
    }
    if !overlay.sort_fields.is_empty() {
        merged.sort_fields = overlay.sort_fields.clone();
    }

    merged.capabilities = merge_capabilities(&base.capabilities, &overlay.capabilities);

    for (identifier, field) in &overlay.fields {
        match merged.fields.get_mut(identifier) {
            Some(existing) => *existing = merge_field(existing, field),
            None => {
                merged.fields.insert(identifier.clone(), field.clone());
            }
        }
    }

    for (identifier, palette) in &overlay.palettes {
        merged.palettes.insert(identifier.clone(), palette.clone());
    }

    merged
}

fn merge_field(base: &CompiledField, overlay: &CompiledField) -> CompiledField {
    let mut config = Value::Object(base.config.clone());
    merge_values(&mut config, &Value::Object(overlay.config.clone()));

    CompiledField {
        unique_identifier: overlay.unique_identifier.clone(),
        identifier: overlay.identifier.clone(),
        field_type: overlay.field_type.clone(),
        label: overlay.label.clone().or_else(|| base.label.clone()),
        description: overlay.description.clone().or_else(|| base.description.clone()),
        label_path: overlay.label_path.clone(),
        description_path: overlay
            .description_path
            .clone()
            .or_else(|| base.description_path.clone()),
        use_existing_field: overlay.use_existing_field,
        display_cond: overlay
            .display_cond
            .clone()
            .or_else(|| base.display_cond.clone()),
        config: match config {
            Value::Object(map) => map,
            _ => overlay.config.clone(),
        },
    }
}

fn merge_capabilities(base: &RecordCapabilities, overlay: &RecordCapabilities) -> RecordCapabilities {
    RecordCapabilities {
        language_aware: overlay.language_aware.or(base.language_aware),
        workspace_aware: overlay.workspace_aware.or(base.workspace_aware),
        edit_locking: overlay.edit_locking.or(base.edit_locking),
        soft_delete: overlay.soft_delete.or(base.soft_delete),
        track_creation_date: overlay.track_creation_date.or(base.track_creation_date),
        track_update_date: overlay.track_update_date.or(base.track_update_date),
        track_ancestor_reference: overlay
            .track_ancestor_reference
            .or(base.track_ancestor_reference),
        sortable: overlay.sortable.or(base.sortable),
        read_only: overlay.read_only.or(base.read_only),
        admin_only: overlay.admin_only.or(base.admin_only),
        hide_at_copy: overlay.hide_at_copy.or(base.hide_at_copy),
    }
}

/// Recursively merges `overlay` into `base`.
///
/// Objects merge key by key; any other value in `overlay` replaces the one in
/// `base`, arrays included.
///
/// # Examples
///
/// ```
/// use content_blocks_core::merge_values;
/// use serde_json::json;
///
/// let mut base = json!({"size": 10, "nested": {"a": 1, "b": 2}});
/// merge_values(&mut base, &json!({"nested": {"b": 3}, "required": true}));
/// assert_eq!(base, json!({"size": 10, "nested": {"a": 1, "b": 3}, "required": true}));
/// ```
pub fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::catalog::{FieldTypeCatalog, TcaKind};
    use crate::definition::{PaletteDefinition, SortField, SortOrder};
    use crate::document::ContentTypeKind;

    fn field(identifier: &str, config: Value) -> CompiledField {
        CompiledField {
            unique_identifier: identifier.into(),
            identifier: identifier.into(),
            field_type: FieldTypeCatalog::standard().get("Text").unwrap().clone(),
            label: None,
            description: None,
            label_path: format!("LLL:test:{identifier}.label"),
            description_path: None,
            use_existing_field: false,
            display_cond: None,
            config: match config {
                Value::Object(map) => map,
                _ => Default::default(),
            },
        }
    }

    fn content_type(identifier: &str) -> ContentTypeDefinition {
        ContentTypeDefinition {
            identifier: identifier.into(),
            table: "tx_news".into(),
            kind: ContentTypeKind::RecordType,
            type_name: Some("1".into()),
            title: None,
            description: None,
            title_path: None,
            description_path: None,
            show_items: Vec::new(),
            override_columns: Vec::new(),
            vendor: "acme".into(),
            package: identifier.into(),
            icon: None,
            priority: 0,
            group: None,
        }
    }

    #[test]
    fn test_later_contribution_wins_scalars() {
        let mut first = TableDefinition::new("tx_news", true);
        first.aggregate_root = Some(true);
        first.root_level_type = Some("onlyOnPages".into());
        first.capabilities.language_aware = Some(false);
        first.capabilities.sortable = Some(true);

        let mut second = TableDefinition::new("tx_news", false);
        second.aggregate_root = Some(false);
        second.capabilities.language_aware = Some(true);

        let merged = merge_table_definitions(&first, &second);
        assert_eq!(merged.aggregate_root, Some(false));
        assert_eq!(merged.root_level_type.as_deref(), Some("onlyOnPages"));
        assert_eq!(merged.capabilities.language_aware, Some(true));
        assert_eq!(merged.capabilities.sortable, Some(true));
        assert!(merged.is_root_table);
    }

    #[test]
    fn test_undeclared_settings_do_not_reset() {
        let mut first = TableDefinition::new("tx_news", true);
        first.aggregate_root = Some(true);
        first.label_field = vec!["title".into()];
        first.sort_fields = vec![SortField {
            identifier: "date".into(),
            order: SortOrder::Desc,
        }];

        let second = TableDefinition::new("tx_news", true);
        let merged = merge_table_definitions(&first, &second);
        assert_eq!(merged.aggregate_root, Some(true));
        assert_eq!(merged.label_field, vec!["title".to_string()]);
        assert_eq!(merged.sort_fields.len(), 1);
    }

    #[test]
    fn test_fields_merge_config_recursively() {
        let mut first = TableDefinition::new("tx_news", true);
        first.fields.insert(
            "title".into(),
            field("title", json!({"size": 20, "eval": {"trim": true}})),
        );
        first.fields.insert("teaser".into(), field("teaser", json!({})));

        let mut second = TableDefinition::new("tx_news", true);
        second.fields.insert(
            "title".into(),
            field("title", json!({"eval": {"required": true}})),
        );
        second.fields.insert("date".into(), field("date", json!({})));

        let merged = merge_table_definitions(&first, &second);
        let keys: Vec<&str> = merged.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "teaser", "date"]);
        assert_eq!(
            Value::Object(merged.fields["title"].config.clone()),
            json!({"size": 20, "eval": {"trim": true, "required": true}})
        );
    }

    #[test]
    fn test_overlay_field_type_replaces_base() {
        let mut first = TableDefinition::new("tx_news", true);
        first.fields.insert("body".into(), field("body", json!({})));

        let mut overlay_field = field("body", json!({}));
        overlay_field.field_type = FieldTypeCatalog::standard().get("Textarea").unwrap().clone();
        let mut second = TableDefinition::new("tx_news", true);
        second.fields.insert("body".into(), overlay_field);

        let merged = merge_table_definitions(&first, &second);
        assert_eq!(merged.fields["body"].tca(), TcaKind::Text);
    }

    #[test]
    fn test_palettes_are_replaced_wholesale() {
        let palette = |label: &str| PaletteDefinition {
            identifier: "header".into(),
            label: Some(label.into()),
            description: None,
            label_path: "LLL:test:palettes.header.label".into(),
            description_path: None,
            items: Vec::new(),
        };
        let mut first = TableDefinition::new("tt_content", true);
        first.palettes.insert("header".into(), palette("First"));
        let mut second = TableDefinition::new("tt_content", true);
        second.palettes.insert("header".into(), palette("Second"));

        let merged = merge_table_definitions(&first, &second);
        assert_eq!(merged.palettes["header"].label.as_deref(), Some("Second"));
    }

    #[test]
    fn test_merge_tables_concatenates_content_types() {
        // Table-driven over several contribution orders: the last declared
        // aggregate root always wins and content types keep their order.
        let cases: [&[(&str, Option<bool>)]; 3] = [
            &[("acme/a", Some(true)), ("acme/b", Some(false))],
            &[("acme/b", Some(false)), ("acme/a", Some(true))],
            &[("acme/a", Some(true)), ("acme/b", None), ("acme/c", Some(false))],
        ];

        for case in cases {
            let mut contributions: IndexMap<String, TableContributions> = IndexMap::new();
            for (identifier, aggregate_root) in case {
                let mut table = TableDefinition::new("tx_news", true);
                table.aggregate_root = *aggregate_root;
                contributions
                    .entry("tx_news".into())
                    .or_default()
                    .contribute(table, content_type(identifier));
            }

            let merged = merge_tables(contributions);
            let table = &merged["tx_news"];
            let expected = case.iter().rev().find_map(|(_, flag)| *flag);
            assert_eq!(table.aggregate_root, expected);

            let order: Vec<&str> = table
                .content_types
                .iter()
                .map(|ct| ct.identifier.as_str())
                .collect();
            let declared: Vec<&str> = case.iter().map(|(identifier, _)| *identifier).collect();
            assert_eq!(order, declared);
        }
    }

    #[test]
    fn test_merge_values_replaces_arrays() {
        let mut base = json!({"items": [1, 2, 3]});
        merge_values(&mut base, &json!({"items": [4]}));
        assert_eq!(base, json!({"items": [4]}));
    }
}
