//! Content block discovery and loading with a builder for multiple sources.
//!
//! Provides [`DocumentSet`] for name-indexed access to loaded documents and
//! [`DocumentSetBuilder`] for combining several roots, kind directories and
//! JSON bundles into one set.
//!
//! # Directory layout
//!
//! ```text
//! ContentBlocks/
//!   ContentElements/
//!     teaser/config.yaml
//!     slider/config.yaml
//!   PageTypes/
//!     blog-article/config.yaml
//!   RecordTypes/
//!     person/config.yaml
//!   FileTypes/
//!     image/config.yaml
//! ```
//!
//! The directory a document sits in decides its content type kind. Documents
//! are ordered by kind (content elements, page types, record types, file
//! types), then by folder name, then by source in the order added.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use content_blocks_core::{CompiledResult, ContentTypeKind, SchemaCompiler, SchemaDocument};
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::ProjectConfig;
use crate::error::{LoaderError, Result};

/// File holding the document inside each content block folder.
pub const DOCUMENT_FILE: &str = "config.yaml";

static DOCUMENT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*/[a-z0-9][a-z0-9-]*$").expect("static regex must compile")
});

/// Returns `true` if `name` is a valid lowercase `vendor/package` name.
///
/// # Examples
///
/// ```
/// use content_blocks_loader::is_valid_document_name;
///
/// assert!(is_valid_document_name("acme/teaser-2"));
/// assert!(!is_valid_document_name("Acme/teaser"));
/// assert!(!is_valid_document_name("acme"));
/// assert!(!is_valid_document_name("acme/-teaser"));
/// ```
pub fn is_valid_document_name(name: &str) -> bool {
    DOCUMENT_NAME_RE.is_match(name)
}

/// Describes where a [`DocumentSet`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// A content block root holding kind directories.
    Directory(PathBuf),
    /// A single kind directory such as `ContentElements/`.
    KindDirectory(PathBuf),
    /// A JSON array of documents.
    Bundle(PathBuf),
    /// Several sources combined by the builder.
    Multiple(Vec<DocumentSource>),
}

/// Loaded documents in compile order, indexed by name.
///
/// # Examples
///
/// ```no_run
/// use content_blocks_core::SchemaCompiler;
/// use content_blocks_loader::DocumentSet;
///
/// let set = DocumentSet::from_dir("packages/site/ContentBlocks").unwrap();
/// println!("Loaded {} content blocks", set.len());
///
/// let mut compiler = SchemaCompiler::new();
/// let result = set.compile(&mut compiler).unwrap();
/// println!("{} tables", result.tables.len());
/// ```
#[derive(Debug)]
pub struct DocumentSet {
    documents: Vec<SchemaDocument>,
    paths: Vec<PathBuf>,
    index: HashMap<String, usize>,
    source: DocumentSource,
}

impl DocumentSet {
    fn empty(source: DocumentSource) -> Self {
        Self {
            documents: Vec::new(),
            paths: Vec::new(),
            index: HashMap::new(),
            source,
        }
    }

    /// Returns a new [`DocumentSetBuilder`].
    pub fn builder() -> DocumentSetBuilder {
        DocumentSetBuilder::new()
    }

    /// Loads every content block below a root directory.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Io`] if a directory or file cannot be read,
    /// [`LoaderError::Yaml`] if a document is malformed, and
    /// [`LoaderError::InvalidDocumentName`] or
    /// [`LoaderError::DuplicateDocument`] for naming violations.
    pub fn from_dir(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().from_dir(path).build()
    }

    /// Loads a single kind directory; its name decides the kind.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::UnknownContentTypeDirectory`] if the directory
    /// name is not one of the kind directory names, plus the errors of
    /// [`from_dir`](Self::from_dir).
    pub fn from_kind_dir(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().from_kind_dir(path).build()
    }

    /// Loads a JSON array of documents.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Io`] if the file cannot be read, or
    /// [`LoaderError::Json`] if parsing fails.
    pub fn from_bundle(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().from_bundle(path).build()
    }

    /// Loads the sources of a project configuration, honoring its exclusion
    /// list. Relative paths are resolved against `base_dir`.
    pub fn from_config(config: &ProjectConfig, base_dir: &Path) -> Result<Self> {
        let mut builder = Self::builder().exclude(config.exclude.iter().cloned());
        for root in config.source_roots(base_dir) {
            builder = builder.from_dir(root);
        }
        builder.build()
    }

    /// Looks up a document by name.
    pub fn get(&self, name: &str) -> Option<&SchemaDocument> {
        self.index.get(name).map(|&i| &self.documents[i])
    }

    /// Path of the file a document was loaded from.
    pub fn path(&self, name: &str) -> Option<&Path> {
        self.index.get(name).map(|&i| self.paths[i].as_path())
    }

    /// Returns `true` if a document with `name` is loaded.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the number of loaded documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if no document was loaded.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in compile order.
    pub fn documents(&self) -> &[SchemaDocument] {
        &self.documents
    }

    /// Returns an iterator over document names in compile order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.name.as_str())
    }

    /// Returns a reference to the source metadata.
    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    /// Consumes the set, returning the documents in compile order.
    pub fn into_documents(self) -> Vec<SchemaDocument> {
        self.documents
    }

    /// Compiles all documents with `compiler`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Compile`] with the first compile error.
    pub fn compile(&self, compiler: &mut SchemaCompiler) -> Result<CompiledResult> {
        Ok(compiler.compile(&self.documents)?)
    }

    fn insert(&mut self, path: PathBuf, document: SchemaDocument, exclude: &[String]) -> Result<()> {
        if !is_valid_document_name(&document.name) {
            return Err(LoaderError::InvalidDocumentName {
                name: document.name,
                path,
            });
        }
        if exclude.iter().any(|name| *name == document.name) {
            debug!(document = %document.name, "skipping excluded content block");
            return Ok(());
        }
        if let Some(&existing) = self.index.get(&document.name) {
            return Err(LoaderError::DuplicateDocument {
                name: document.name,
                first: self.paths[existing].clone(),
                second: path,
            });
        }
        self.index.insert(document.name.clone(), self.documents.len());
        self.documents.push(document);
        self.paths.push(path);
        Ok(())
    }
}

/// Builder combining several sources into one [`DocumentSet`].
///
/// Unlike a fallback chain every source is loaded; documents are appended
/// in source order and names must stay unique across all of them.
///
/// # Example
///
/// ```no_run
/// use content_blocks_loader::DocumentSet;
///
/// let set = DocumentSet::builder()
///     .from_dir("packages/site/ContentBlocks")
///     .from_dir("packages/shared/ContentBlocks")
///     .exclude(["acme/legacy-teaser".to_string()])
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct DocumentSetBuilder {
    sources: Vec<DocumentSource>,
    exclude: Vec<String>,
}

impl DocumentSetBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a content block root.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DocumentSource::Directory(path.into()));
        self
    }

    /// Adds a single kind directory.
    pub fn from_kind_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DocumentSource::KindDirectory(path.into()));
        self
    }

    /// Adds a JSON bundle.
    pub fn from_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DocumentSource::Bundle(path.into()));
        self
    }

    /// Skips documents with the given names.
    pub fn exclude(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.exclude.extend(names);
        self
    }

    /// Loads every configured source in order.
    ///
    /// Returns [`LoaderError::NoSourcesAvailable`] if no source was added.
    pub fn build(self) -> Result<DocumentSet> {
        let source = match self.sources.as_slice() {
            [] => return Err(LoaderError::NoSourcesAvailable),
            [single] => single.clone(),
            _ => DocumentSource::Multiple(self.sources.clone()),
        };
        let mut set = DocumentSet::empty(source);

        for source in &self.sources {
            let loaded = match source {
                DocumentSource::Directory(root) => parse_all(discover_root(root)?)?,
                DocumentSource::KindDirectory(dir) => {
                    let name = dir
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or_default();
                    let kind = ContentTypeKind::from_directory_name(name).ok_or_else(|| {
                        LoaderError::UnknownContentTypeDirectory {
                            name: name.to_string(),
                        }
                    })?;
                    parse_all(discover_kind_dir(dir, kind)?)?
                }
                DocumentSource::Bundle(path) => load_bundle(path)?,
                DocumentSource::Multiple(_) => continue,
            };
            for (path, document) in loaded {
                set.insert(path, document, &self.exclude)?;
            }
        }

        info!(
            documents = set.len(),
            sources = self.sources.len(),
            "loaded content blocks"
        );
        Ok(set)
    }
}

fn discover_root(root: &Path) -> Result<Vec<(PathBuf, ContentTypeKind)>> {
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if path.is_dir()
            && !name.starts_with('.')
            && ContentTypeKind::from_directory_name(name).is_none()
        {
            warn!(path = %path.display(), "ignoring directory that is not a content type directory");
        }
    }

    let mut candidates = Vec::new();
    for kind in ContentTypeKind::ALL {
        let dir = root.join(kind.directory_name());
        if dir.is_dir() {
            candidates.extend(discover_kind_dir(&dir, kind)?);
        }
    }
    Ok(candidates)
}

fn discover_kind_dir(dir: &Path, kind: ContentTypeKind) -> Result<Vec<(PathBuf, ContentTypeKind)>> {
    let mut folders = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            folders.push(path);
        } else {
            warn!(path = %path.display(), "ignoring file outside a content block folder");
        }
    }
    folders.sort();

    let mut candidates = Vec::new();
    for folder in folders {
        let file = folder.join(DOCUMENT_FILE);
        if file.is_file() {
            candidates.push((file, kind));
        } else {
            warn!(path = %folder.display(), "ignoring content block folder without config.yaml");
        }
    }
    Ok(candidates)
}

/// Parses documents in parallel, keeping discovery order.
fn parse_all(candidates: Vec<(PathBuf, ContentTypeKind)>) -> Result<Vec<(PathBuf, SchemaDocument)>> {
    candidates
        .into_par_iter()
        .map(|(path, kind)| {
            let document = parse_document(&path, kind)?;
            Ok((path, document))
        })
        .collect()
}

fn parse_document(path: &Path, kind: ContentTypeKind) -> Result<SchemaDocument> {
    let content = std::fs::read_to_string(path)?;
    let mut document: SchemaDocument =
        serde_yaml::from_str(&content).map_err(|e| LoaderError::yaml(path, e))?;
    document.kind = kind;
    debug!(document = %document.name, path = %path.display(), "parsed content block");
    Ok(document)
}

fn load_bundle(path: &Path) -> Result<Vec<(PathBuf, SchemaDocument)>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let documents: Vec<SchemaDocument> = serde_json::from_reader(reader)?;
    Ok(documents
        .into_iter()
        .map(|document| (path.to_path_buf(), document))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_document(root: &Path, kind_dir: &str, folder: &str, yaml: &str) {
        let dir = root.join(kind_dir).join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DOCUMENT_FILE), yaml).unwrap();
    }

    #[test]
    fn test_from_dir_sets_kind_from_directory() {
        let root = tempfile::tempdir().unwrap();
        write_document(root.path(), "ContentElements", "teaser", "name: acme/teaser\n");
        write_document(root.path(), "PageTypes", "blog", "name: acme/blog\ntypeName: 942\n");

        let set = DocumentSet::from_dir(root.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("acme/teaser").unwrap().kind, ContentTypeKind::ContentElement);
        let blog = set.get("acme/blog").unwrap();
        assert_eq!(blog.kind, ContentTypeKind::PageType);
        assert_eq!(blog.type_name.as_deref(), Some("942"));
        assert!(set.path("acme/blog").unwrap().ends_with("PageTypes/blog/config.yaml"));
    }

    #[test]
    fn test_order_is_kind_then_folder() {
        let root = tempfile::tempdir().unwrap();
        write_document(root.path(), "RecordTypes", "a-person", "name: acme/person\ntable: tx_person\n");
        write_document(root.path(), "ContentElements", "zeta", "name: acme/zeta\n");
        write_document(root.path(), "ContentElements", "alpha", "name: acme/alpha\n");

        let set = DocumentSet::from_dir(root.path()).unwrap();
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["acme/alpha", "acme/zeta", "acme/person"]);
    }

    #[test]
    fn test_folder_without_document_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("ContentElements/empty")).unwrap();
        std::fs::write(root.path().join("ContentElements/README.md"), "notes").unwrap();
        write_document(root.path(), "ContentElements", "teaser", "name: acme/teaser\n");

        let set = DocumentSet::from_dir(root.path()).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        write_document(root.path(), "ContentElements", "teaser", "name: Acme/Teaser\n");

        let err = DocumentSet::from_dir(root.path()).unwrap_err();
        assert!(matches!(err, LoaderError::InvalidDocumentName { ref name, .. } if name == "Acme/Teaser"));
    }

    #[test]
    fn test_kind_dir_name_must_be_known() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Widgets");
        std::fs::create_dir_all(&dir).unwrap();

        let err = DocumentSet::from_kind_dir(&dir).unwrap_err();
        assert!(matches!(err, LoaderError::UnknownContentTypeDirectory { ref name } if name == "Widgets"));
    }

    #[test]
    fn test_kind_dir_loads_its_documents() {
        let root = tempfile::tempdir().unwrap();
        write_document(root.path(), "FileTypes", "image", "name: acme/image\ntypeName: image\n");

        let set = DocumentSet::from_kind_dir(root.path().join("FileTypes")).unwrap();
        assert_eq!(set.get("acme/image").unwrap().kind, ContentTypeKind::FileType);
        assert_eq!(
            set.source(),
            &DocumentSource::KindDirectory(root.path().join("FileTypes"))
        );
    }

    #[test]
    fn test_builder_without_sources() {
        let err = DocumentSet::builder().build().unwrap_err();
        assert!(matches!(err, LoaderError::NoSourcesAvailable));
    }

    #[test]
    fn test_malformed_yaml_names_file() {
        let root = tempfile::tempdir().unwrap();
        write_document(root.path(), "ContentElements", "broken", "name: [acme\n");

        let err = DocumentSet::from_dir(root.path()).unwrap_err();
        assert!(matches!(err, LoaderError::Yaml { .. }));
        assert!(err.to_string().contains("broken"));
    }
}
