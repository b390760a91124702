//! Error type shared by all datatable crates.

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum DataTableError {
    /// Strict append-style operation on tables with incompatible headers.
    #[error("headers don't match. Expected: {expected:?}, found: {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// The join key mapping is not a proper field-to-field mapping.
    #[error("invalid join specification: {0}")]
    InvalidJoinSpecification(String),

    /// Merging two hierarchies whose key headers differ.
    #[error("cannot merge hierarchies with different keys: {left:?} and {right:?}")]
    IncompatibleHierarchyMerge {
        left: Vec<String>,
        right: Vec<String>,
    },

    /// Access to a header not present in a table, row, hierarchy or config.
    #[error("missing field: {0}")]
    MissingField(String),

    /// An operation received values it can't combine (e.g. summing text).
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A hierarchy key path that doesn't fit the hierarchy's depth.
    #[error("invalid key path: {0}")]
    InvalidKeyPath(String),

    /// A single-pass stream was opened a second time.
    #[error("stream already consumed and its source is not replayable")]
    StreamConsumed,

    /// Error raised by a caller-supplied function.
    #[error(transparent)]
    External(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Fmt(#[from] fmt::Error),

    #[error("internal: {0}")]
    Internal(String),
}

impl DataTableError {
    /// Wrap an error produced by user code so it can be returned through the
    /// engine unchanged.
    pub fn external<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DataTableError::External(Box::new(err))
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        DataTableError::MissingField(field.into())
    }

    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        DataTableError::TypeMismatch(msg.into())
    }
}

pub type Result<T, E = DataTableError> = std::result::Result<T, E>;

/// Extension for turning lookups into `MissingField` errors.
pub trait OptionExt<T> {
    /// Return the inner value or a `MissingField` error naming `field`.
    fn required(self, field: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, field: &str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(DataTableError::missing_field(field)),
        }
    }
}

#[macro_export]
macro_rules! internal {
    ($($arg:tt)*) => {
        $crate::DataTableError::Internal(std::format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_on_none_is_missing_field() {
        let v: Option<i32> = None;
        let err = v.required("amount").unwrap_err();
        assert!(matches!(err, DataTableError::MissingField(f) if f == "amount"));
    }

    #[test]
    fn external_error_is_transparent() {
        let io = std::io::Error::other("boom");
        let err = DataTableError::external(io);
        assert_eq!("boom", err.to_string());
    }

    #[test]
    fn internal_macro_formats() {
        let err = internal!("bad state {}", 3);
        assert_eq!("internal: bad state 3", err.to_string());
    }
}
