//! Error and warning taxonomy for the GPIF decoder: structural failures
//! abort the decode, field-level failures are recovered in place and
//! reported alongside the result instead.

use thiserror::Error;

/// Fatal decode failures. Field-level issues are never represented here —
/// see `DecodeWarning`.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a valid GPIF container: {0}")]
    InvalidContainer(String),

    #[error("XML is not well-formed: {0}")]
    InvalidXml(#[from] quick_xml::Error),

    #[error("failed to read container bytes: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Non-fatal issue recovered during decode. Accumulated by `DecodeContext`
/// and returned alongside the successfully-produced `Song`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DecodeWarning {
    /// An id was referenced (e.g. a Bar id in a MasterBar's `Bars` list)
    /// but no element with that id and tag exists in the index.
    DanglingReference { tag: String, id: String },
    /// A numeric or enum field failed to parse; a default was substituted.
    MalformedField { field: String, reason: String },
}

impl std::fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeWarning::DanglingReference { tag, id } => {
                write!(f, "dangling reference: no <{tag} id=\"{id}\"> in index")
            }
            DecodeWarning::MalformedField { field, reason } => {
                write!(f, "malformed field {field}: {reason}")
            }
        }
    }
}

/// Accumulates warnings during a decode pass without failing it.
#[derive(Debug, Default)]
pub struct DecodeContext {
    warnings: Vec<DecodeWarning>,
}

impl DecodeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dangling_reference(&mut self, tag: &str, id: &str) {
        log::warn!("dangling reference: no <{tag} id=\"{id}\"> in index, skipping");
        self.warnings.push(DecodeWarning::DanglingReference {
            tag: tag.to_string(),
            id: id.to_string(),
        });
    }

    pub fn malformed_field(&mut self, field: &str, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("malformed field {field}: {reason}, substituting default");
        self.warnings.push(DecodeWarning::MalformedField {
            field: field.to_string(),
            reason,
        });
    }

    pub fn warnings(self) -> Vec<DecodeWarning> {
        self.warnings
    }
}
