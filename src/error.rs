use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The recognition report is malformed.
    Format,
    /// Geometry or text that cannot be rendered.
    Domain,
    /// An image, font, backend process or file could not be used.
    Resource,
    /// The caller asked for an occurrence that was never extracted.
    Lookup,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("report is empty (no header line)")]
    EmptyReport,

    #[error("report header is missing column `{column}`")]
    MissingColumn { column: &'static str },

    #[error("report line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("report line {line}: field `{field}` is not an integer: {value:?}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("degenerate occurrence: {reason}")]
    Domain { reason: String },

    #[error("no occurrence with id {id}")]
    UnknownOccurrence { id: usize },

    #[error("{context}")]
    Resource {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyReport
            | Error::MissingColumn { .. }
            | Error::FieldCount { .. }
            | Error::InvalidField { .. } => ErrorKind::Format,
            Error::Domain { .. } => ErrorKind::Domain,
            Error::Resource { .. } => ErrorKind::Resource,
            Error::UnknownOccurrence { .. } => ErrorKind::Lookup,
        }
    }

    pub fn is_domain(&self) -> bool {
        self.kind() == ErrorKind::Domain
    }

    pub(crate) fn domain(reason: impl Into<String>) -> Self {
        Error::Domain {
            reason: reason.into(),
        }
    }

    pub(crate) fn resource(context: impl Into<String>) -> Self {
        Error::Resource {
            context: context.into(),
            source: None,
        }
    }

    pub(crate) fn resource_with<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Resource {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}
