//! Error types for schema compilation.
//!
//! Every failure raised by the compiler is rejected input: the first
//! violation encountered in tree-walk order aborts the whole
//! [`compile`](crate::SchemaCompiler::compile) call. Each variant names the
//! offending document, carries a stable numeric [`code`](CompileError::code)
//! and maps into one [`ErrorCategory`].

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    /// A required attribute (`identifier`, `type`, `table`, ...) is absent.
    MissingRequiredAttribute,
    /// A type name is not registered in the field type catalog.
    UnknownType,
    /// A field, palette, tab or sheet identifier is reused within one pass.
    DuplicateIdentifier,
    /// The tree shape is invalid (misplaced line breaks, nested palettes, ...).
    StructuralViolation,
    /// A value is outside its closed set of allowed values.
    InvalidEnumValue,
}

/// Identifier namespace in which a duplicate was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierNamespace {
    Field,
    Palette,
    Tab,
    Sheet,
    Container,
}

impl fmt::Display for IdentifierNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Field => "field",
            Self::Palette => "palette",
            Self::Tab => "tab",
            Self::Sheet => "sheet",
            Self::Container => "container",
        };
        f.write_str(name)
    }
}

/// Errors raised while compiling schema documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The document name does not follow the `vendor/package` format.
    #[error("content block name \"{name}\" must have the format \"vendor/package\"")]
    InvalidQualifiedName { name: String },

    /// A document that requires an explicit table does not declare one.
    #[error("content block \"{document}\" must declare a non-empty \"table\"")]
    MissingTable { document: String },

    /// A document declares an empty discriminator value or none where one is required.
    #[error("content block \"{document}\" must declare a non-empty \"typeName\"")]
    MissingTypeName { document: String },

    /// A field node has no `identifier`.
    #[error("a field in content block \"{document}\" is missing the required \"identifier\" ({context})")]
    MissingIdentifier { document: String, context: String },

    /// A field node has no `type`.
    #[error(
        "field \"{identifier}\" in content block \"{document}\" is missing the required \"type\"; valid types are: {}",
        .valid.join(", ")
    )]
    MissingType {
        document: String,
        identifier: String,
        valid: Vec<String>,
    },

    /// A field node names a type that is not registered.
    #[error(
        "type \"{type_name}\" of field \"{identifier}\" in content block \"{document}\" does not exist; valid types are: {}",
        .valid.join(", ")
    )]
    UnknownType {
        document: String,
        identifier: String,
        type_name: String,
        valid: Vec<String>,
    },

    /// An identifier is used twice within one compilation pass.
    #[error("{namespace} identifier \"{identifier}\" in content block \"{document}\" is used more than once")]
    DuplicateIdentifier {
        document: String,
        namespace: IdentifierNamespace,
        identifier: String,
    },

    /// A line break appears outside of a palette.
    #[error("line breaks are only allowed inside palettes (content block \"{document}\")")]
    LinebreakOutsidePalette { document: String },

    /// A palette or tab is nested inside a palette.
    #[error("palette \"{palette}\" in content block \"{document}\" must not contain the {kind} \"{identifier}\"")]
    NestedInPalette {
        document: String,
        palette: String,
        identifier: String,
        kind: String,
    },

    /// A FlexForm mixes sheets with plain fields on its first level.
    #[error("FlexForm field \"{identifier}\" in content block \"{document}\" mixes sheets with plain fields")]
    FlexFormMixedSheets { document: String, identifier: String },

    /// A FlexForm section defines no containers.
    #[error("section \"{section}\" of FlexForm field \"{identifier}\" in content block \"{document}\" must define at least one container")]
    FlexFormEmptySection {
        document: String,
        identifier: String,
        section: String,
    },

    /// A FlexForm container defines no fields.
    #[error("container \"{container}\" of FlexForm field \"{identifier}\" in content block \"{document}\" must define at least one field")]
    FlexFormEmptyContainer {
        document: String,
        identifier: String,
        container: String,
    },

    /// A FlexForm sheet, section or container holds a field kind it cannot render.
    #[error("field \"{field}\" of type \"{type_name}\" is not allowed inside FlexForm field \"{identifier}\" in content block \"{document}\"")]
    FlexFormDisallowedField {
        document: String,
        identifier: String,
        field: String,
        type_name: String,
    },

    /// Table settings embedded in a collection field do not parse.
    #[error("table settings of collection \"{identifier}\" in content block \"{document}\" are invalid: {message}")]
    InvalidTableSettings {
        document: String,
        identifier: String,
        message: String,
    },

    /// A sort order other than ascending/descending.
    #[error("sort order \"{value}\" for field \"{field}\" in content block \"{document}\" is invalid; use \"asc\" or \"desc\"")]
    InvalidSortOrder {
        document: String,
        field: String,
        value: String,
    },

    /// A value outside a closed set (for example a file type name).
    #[error("\"{value}\" is not a valid {attribute} in content block \"{document}\"; valid values are: {}", .valid.join(", "))]
    InvalidEnumValue {
        document: String,
        attribute: String,
        value: String,
        valid: Vec<String>,
    },
}

impl CompileError {
    /// Returns the stable numeric code of this error.
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidQualifiedName { .. } => 1_700_000_101,
            Self::MissingTable { .. } => 1_700_000_102,
            Self::MissingTypeName { .. } => 1_700_000_103,
            Self::MissingIdentifier { .. } => 1_700_000_104,
            Self::MissingType { .. } => 1_700_000_105,
            Self::UnknownType { .. } => 1_700_000_201,
            Self::DuplicateIdentifier { .. } => 1_700_000_301,
            Self::LinebreakOutsidePalette { .. } => 1_700_000_401,
            Self::NestedInPalette { .. } => 1_700_000_402,
            Self::FlexFormMixedSheets { .. } => 1_700_000_403,
            Self::FlexFormEmptySection { .. } => 1_700_000_404,
            Self::FlexFormEmptyContainer { .. } => 1_700_000_405,
            Self::FlexFormDisallowedField { .. } => 1_700_000_406,
            Self::InvalidTableSettings { .. } => 1_700_000_407,
            Self::InvalidSortOrder { .. } => 1_700_000_501,
            Self::InvalidEnumValue { .. } => 1_700_000_502,
        }
    }

    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidQualifiedName { .. }
            | Self::MissingTable { .. }
            | Self::MissingTypeName { .. }
            | Self::MissingIdentifier { .. }
            | Self::MissingType { .. } => ErrorCategory::MissingRequiredAttribute,
            Self::UnknownType { .. } => ErrorCategory::UnknownType,
            Self::DuplicateIdentifier { .. } => ErrorCategory::DuplicateIdentifier,
            Self::LinebreakOutsidePalette { .. }
            | Self::NestedInPalette { .. }
            | Self::FlexFormMixedSheets { .. }
            | Self::FlexFormEmptySection { .. }
            | Self::FlexFormEmptyContainer { .. }
            | Self::FlexFormDisallowedField { .. }
            | Self::InvalidTableSettings { .. } => ErrorCategory::StructuralViolation,
            Self::InvalidSortOrder { .. } | Self::InvalidEnumValue { .. } => {
                ErrorCategory::InvalidEnumValue
            }
        }
    }
}

/// Convenience alias for results with [`CompileError`].
pub type Result<T> = std::result::Result<T, CompileError>;
