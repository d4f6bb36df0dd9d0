//! Mapping data model shared by the document and runtime pipelines.
//!
//! A mapping file enumerates the addressable points of the test rig: one
//! `Mapping` element per point, carrying a dotted label, a wire address
//! (`NodeId`) and a data-kind code (`DataTypeId`).

use serde::{Deserialize, Serialize};

/// Declared value type of a mapping entry.
///
/// The code set on the wire is closed: `1` boolean, `4` 32-bit integer,
/// `6` double, `7` byte. Every other code is carried through verbatim as
/// [`DataKind::Unknown`] so a re-emitted document is byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataKind {
    Boolean,
    Int32,
    Double,
    Byte,
    /// Unrecognized code, preserved as-is.
    Unknown(String),
}

impl DataKind {
    /// Parse a wire code from the `DataTypeId` attribute.
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Self::Boolean,
            "4" => Self::Int32,
            "6" => Self::Double,
            "7" => Self::Byte,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The wire code this kind serializes back to.
    pub fn code(&self) -> &str {
        match self {
            Self::Boolean => "1",
            Self::Int32 => "4",
            Self::Double => "6",
            Self::Byte => "7",
            Self::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Int32 => write!(f, "int32"),
            Self::Double => write!(f, "double"),
            Self::Byte => write!(f, "byte"),
            Self::Unknown(raw) => write!(f, "unknown({raw})"),
        }
    }
}

/// One addressable point definition, immutable once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Dotted label, e.g. `Block1.DB_AllgemeineParameter.Zykluszeit`.
    /// Labels are UTF-8 text and may contain non-ASCII unit names.
    pub label: String,
    /// Raw wire address (`ns=<n>;i=<id>` or `ns=<n>;s=<token>`). May be
    /// empty for entries that exist only in the document.
    pub node_id: String,
    /// Declared value type.
    pub data_kind: DataKind,
    /// Free-text comment that immediately preceded this entry in the file.
    pub annotation: Option<String>,
}

impl MappingEntry {
    pub fn new(label: impl Into<String>, node_id: impl Into<String>, data_kind: DataKind) -> Self {
        Self {
            label: label.into(),
            node_id: node_id.into(),
            data_kind,
            annotation: None,
        }
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Display name for a live node: last label segment, or a synthesized
    /// placeholder when the label is empty.
    pub fn display_name(&self) -> Option<&str> {
        if self.label.is_empty() {
            None
        } else {
            Some(self.label.rsplit('.').next().unwrap_or(&self.label))
        }
    }
}

/// A parsed mapping file: the opaque namespace declarations plus the entry
/// list in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Namespace URIs, copied through unchanged by the emitter.
    pub namespace_uris: Vec<String>,
    /// Entries in file order, annotations already attached.
    pub entries: Vec<MappingEntry>,
}
