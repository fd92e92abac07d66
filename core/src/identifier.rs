//! Column-safe unique identifiers.
//!
//! Author-facing field identifiers are local to a document. When a field
//! lands on a shared root table (for example `tt_content`) the identifier is
//! namespaced with a prefix derived from the document's `vendor/package`
//! name so that two documents can both declare a `headline` field.
//!
//! # Examples
//!
//! ```
//! use content_blocks_core::{PrefixPolicy, PrefixType, assign_identifier};
//!
//! let full = PrefixPolicy::new(true, PrefixType::Full);
//! assert_eq!(assign_identifier("vendor/pkg", &full, "title").unwrap(), "vendor_pkg_title");
//!
//! let vendor = PrefixPolicy::new(true, PrefixType::Vendor);
//! assert_eq!(assign_identifier("my-vendor/pkg", &vendor, "title").unwrap(), "myvendor_title");
//!
//! let off = PrefixPolicy::new(false, PrefixType::Full);
//! assert_eq!(assign_identifier("vendor/pkg", &off, "title").unwrap(), "title");
//! ```

use serde::{Deserialize, Serialize};

use crate::document::{FieldNode, PrefixType, SchemaDocument, split_qualified_name};
use crate::error::Result;

/// A document's naming policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixPolicy {
    pub enabled: bool,
    pub style: PrefixType,
    /// Replaces the vendor token in both styles.
    pub vendor_prefix: Option<String>,
}

impl PrefixPolicy {
    /// Creates a policy without a vendor override.
    pub fn new(enabled: bool, style: PrefixType) -> Self {
        Self {
            enabled,
            style,
            vendor_prefix: None,
        }
    }

    /// Reads the policy declared by a document.
    pub fn from_document(document: &SchemaDocument) -> Self {
        Self {
            enabled: document.prefix_fields,
            style: document.prefix_type,
            vendor_prefix: document.vendor_prefix.clone(),
        }
    }

    fn with_enabled(&self, enabled: bool) -> Self {
        Self {
            enabled,
            ..self.clone()
        }
    }
}

/// Computes the prefix for a qualified name, ignoring `policy.enabled`.
///
/// # Errors
///
/// Returns [`InvalidQualifiedName`](crate::CompileError::InvalidQualifiedName)
/// if `name` is not of the form `vendor/package`.
pub fn prefix_for(name: &str, policy: &PrefixPolicy) -> Result<String> {
    let (vendor, package) = split_qualified_name(name)?;
    let vendor = policy.vendor_prefix.as_deref().unwrap_or(vendor).replace('-', "");
    Ok(match policy.style {
        PrefixType::Full => format!("{vendor}_{}", package.replace('-', "")),
        PrefixType::Vendor => vendor,
    })
}

/// Applies a naming policy to a raw identifier.
///
/// A pure function of its inputs: the same name, policy and identifier
/// always produce the same result.
///
/// # Errors
///
/// Returns [`InvalidQualifiedName`](crate::CompileError::InvalidQualifiedName)
/// if prefixing is enabled and `owner` is not of the form `vendor/package`.
pub fn assign_identifier(owner: &str, policy: &PrefixPolicy, raw: &str) -> Result<String> {
    if !policy.enabled {
        return Ok(raw.to_string());
    }
    Ok(format!("{}_{raw}", prefix_for(owner, policy)?))
}

/// Computes the unique identifier of a field node.
///
/// Fields outside the pass's root table are namespaced by their child table
/// and keep their identifier; fields bound to an existing column are never
/// prefixed; a per-field `prefixField` overrides the document default.
pub fn assign_field_identifier(
    owner: &str,
    policy: &PrefixPolicy,
    node: &FieldNode,
    raw: &str,
    on_root_table: bool,
) -> Result<String> {
    if !on_root_table || node.use_existing_field {
        return Ok(raw.to_string());
    }
    let enabled = node.prefix_field.unwrap_or(policy.enabled);
    assign_identifier(owner, &policy.with_enabled(enabled), raw)
}
