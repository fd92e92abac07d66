use std::path::Path;

use content_blocks_core::{
    BaseSchema, ContentTypeKind, ErrorCategory, FieldNode, FieldTypeCatalog, SchemaCompiler, SchemaDocument,
};
use content_blocks_loader::{
    DocumentSet, DocumentSource, LoaderError, ProjectConfig, load_base_schema,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_document(root: &Path, kind_dir: &str, folder: &str, yaml: &str) {
    let dir = root.join(kind_dir).join(folder);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.yaml"), yaml).unwrap();
}

const TEASER: &str = r#"
name: acme/teaser
title: Teaser
group: marketing
priority: 10
fields:
  - identifier: header
    useExistingField: true
  - identifier: link
    type: Link
    label: Read more
"#;

const SLIDER: &str = r#"
name: acme/slider
fields:
  - identifier: slides
    type: Collection
    label: Slides
    fields:
      - identifier: image
        type: File
      - identifier: caption
        type: Text
"#;

const PERSON: &str = r#"
name: acme/person
table: tx_acme_person
typeField: record_type
labelField: name
fields:
  - identifier: name
    type: Text
"#;

// ---------------------------------------------------------------------------
// Directory loading
// ---------------------------------------------------------------------------

#[test]
fn test_directory_loading_and_compile() {
    let root = tempfile::tempdir().unwrap();
    write_document(root.path(), "ContentElements", "teaser", TEASER);
    write_document(root.path(), "ContentElements", "slider", SLIDER);
    write_document(root.path(), "RecordTypes", "person", PERSON);

    let set = DocumentSet::from_dir(root.path()).unwrap();
    let names: Vec<&str> = set.names().collect();
    assert_eq!(names, vec!["acme/slider", "acme/teaser", "acme/person"]);

    let mut compiler = SchemaCompiler::new();
    let result = set.compile(&mut compiler).unwrap();

    let content = result.table("tt_content").unwrap();
    assert!(content.field("header").is_some());
    assert!(content.field("acme_teaser_link").is_some());
    assert!(content.field("acme_slider_slides").is_some());
    assert!(result.table("acme_slider_slides").is_some());

    let person = result.table("tx_acme_person").unwrap();
    assert!(person.field("acme_person_name").is_some());
    assert!(person.field("record_type").is_some());

    let teaser = result.content_type("acme/teaser").unwrap();
    assert_eq!(teaser.priority, 10);
    assert_eq!(teaser.group.as_deref(), Some("marketing"));
}

#[test]
fn test_multiple_roots_keep_source_order() {
    let site = tempfile::tempdir().unwrap();
    let shared = tempfile::tempdir().unwrap();
    write_document(site.path(), "ContentElements", "teaser", TEASER);
    write_document(shared.path(), "ContentElements", "slider", SLIDER);

    let set = DocumentSet::builder()
        .from_dir(site.path())
        .from_dir(shared.path())
        .build()
        .unwrap();

    let names: Vec<&str> = set.names().collect();
    assert_eq!(names, vec!["acme/teaser", "acme/slider"]);
    assert!(matches!(set.source(), DocumentSource::Multiple(sources) if sources.len() == 2));
}

#[test]
fn test_duplicate_across_roots_is_rejected() {
    let site = tempfile::tempdir().unwrap();
    let shared = tempfile::tempdir().unwrap();
    write_document(site.path(), "ContentElements", "teaser", TEASER);
    write_document(shared.path(), "ContentElements", "teaser-copy", TEASER);

    let err = DocumentSet::builder()
        .from_dir(site.path())
        .from_dir(shared.path())
        .build()
        .unwrap_err();

    match err {
        LoaderError::DuplicateDocument {
            name,
            first,
            second,
        } => {
            assert_eq!(name, "acme/teaser");
            assert!(first.starts_with(site.path()));
            assert!(second.starts_with(shared.path()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_root_is_io_error() {
    let err = DocumentSet::from_dir("/nonexistent/content-blocks").unwrap_err();
    assert!(matches!(err, LoaderError::Io(_)));
}

// ---------------------------------------------------------------------------
// Bundles
// ---------------------------------------------------------------------------

#[test]
fn test_bundle_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.json");
    let documents = vec![
        SchemaDocument::new("acme/teaser", ContentTypeKind::ContentElement)
            .with_field(FieldNode::new("headline", "Text")),
        SchemaDocument::new("acme/blog", ContentTypeKind::PageType).with_type_name("942"),
    ];
    std::fs::write(&path, serde_json::to_string_pretty(&documents).unwrap()).unwrap();

    let set = DocumentSet::from_bundle(&path).unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.get("acme/blog").unwrap().kind, ContentTypeKind::PageType);
    assert_eq!(set.documents(), documents.as_slice());
}

#[test]
fn test_malformed_bundle_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = DocumentSet::from_bundle(&path).unwrap_err();
    assert!(matches!(err, LoaderError::Json(_)));
}

// ---------------------------------------------------------------------------
// Project configuration
// ---------------------------------------------------------------------------

#[test]
fn test_from_config_resolves_sources_and_exclusions() {
    let project = tempfile::tempdir().unwrap();
    let blocks = project.path().join("blocks");
    write_document(&blocks, "ContentElements", "teaser", TEASER);
    write_document(&blocks, "ContentElements", "slider", SLIDER);

    let config: ProjectConfig =
        serde_yaml::from_str("version: \"1.0\"\nsources: [blocks]\nexclude: [acme/slider]\n")
            .unwrap();
    let set = DocumentSet::from_config(&config, project.path()).unwrap();

    assert!(set.contains("acme/teaser"));
    assert!(!set.contains("acme/slider"));
}

#[test]
fn test_empty_sources_fail() {
    let project = tempfile::tempdir().unwrap();
    let config: ProjectConfig = serde_yaml::from_str("version: \"1.0\"\nsources: []\n").unwrap();

    let err = DocumentSet::from_config(&config, project.path()).unwrap_err();
    assert!(matches!(err, LoaderError::NoSourcesAvailable));
}

// ---------------------------------------------------------------------------
// Base schema and compile errors
// ---------------------------------------------------------------------------

#[test]
fn test_base_schema_enables_existing_fields() {
    let project = tempfile::tempdir().unwrap();
    let base_path = project.path().join("base-schema.yaml");
    std::fs::write(&base_path, "tt_content:\n  tx_legacy_teaser: Textarea\n").unwrap();
    write_document(
        project.path(),
        "ContentElements",
        "teaser",
        "name: acme/teaser\nfields:\n  - identifier: tx_legacy_teaser\n    useExistingField: true\n",
    );

    let catalog = FieldTypeCatalog::standard();
    let base = load_base_schema(&base_path, &catalog).unwrap();
    assert!(base.has("tt_content", "tx_legacy_teaser"));

    let set = DocumentSet::from_dir(project.path()).unwrap();
    let mut compiler = SchemaCompiler::with_parts(catalog, base);
    let result = set.compile(&mut compiler).unwrap();

    let field = result.table("tt_content").unwrap().field("tx_legacy_teaser").unwrap();
    assert_eq!(field.field_type.name, "Textarea");
    assert!(field.use_existing_field);
}

#[test]
fn test_compile_error_is_transparent() {
    let root = tempfile::tempdir().unwrap();
    write_document(
        root.path(),
        "ContentElements",
        "teaser",
        "name: acme/teaser\nfields:\n  - identifier: headline\n    type: Headline\n",
    );

    let set = DocumentSet::from_dir(root.path()).unwrap();
    let mut compiler = SchemaCompiler::new();
    let err = set.compile(&mut compiler).unwrap_err();

    match err {
        LoaderError::Compile(inner) => {
            assert_eq!(inner.category(), ErrorCategory::UnknownType);
            assert!(inner.to_string().contains("Headline"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
