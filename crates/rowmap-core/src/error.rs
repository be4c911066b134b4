//! Error types for rowmap operations.

use crate::component::ComponentKind;
use std::fmt;

/// The primary error type for all rowmap operations.
#[derive(Debug)]
pub enum Error {
    /// A required construction parameter (usually the model name) was omitted
    MissingParameter(String),
    /// A model argument is not of the type the component is bound to
    TypeMismatch(TypeMismatchError),
    /// No implementation, model, converter or association could be found
    Unresolved(UnresolvedError),
    /// An exactly-one fetch matched zero or several rows
    Cardinality(CardinalityError),
    /// An unrecognized return mode was given to a raw query
    InvalidMode(String),
    /// Cascading save/clear went deeper than the configured limit
    CascadeDepthExceeded { model: String, limit: usize },
    /// Database adapter failures
    Query(QueryError),
    /// Value conversion errors
    Type(TypeError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct TypeMismatchError {
    /// Operation that performed the check (`save`, `clear`, ...)
    pub operation: &'static str,
    /// Model name the component is bound to
    pub expected: String,
    /// Model name (or type name) that was supplied
    pub actual: String,
}

#[derive(Debug)]
pub struct UnresolvedError {
    pub kind: UnresolvedKind,
    pub name: String,
    /// Model the lookup was made for, when there is one
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedKind {
    /// Model was never registered
    Model,
    /// No component implementation at any tier
    Component(ComponentKind),
    /// Field converter not found at any tier
    Converter,
    /// Model does not declare the association
    Association,
}

#[derive(Debug)]
pub struct CardinalityError {
    pub kind: CardinalityKind,
    pub model: String,
    pub operation: &'static str,
    /// Number of rows actually matched
    pub found: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityKind {
    /// Zero rows where exactly one was required
    NotFound,
    /// More than one row where exactly one was required
    TooMany,
}

#[derive(Debug)]
pub struct QueryError {
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Is this an exactly-one fetch that matched nothing?
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Cardinality(CardinalityError {
                kind: CardinalityKind::NotFound,
                ..
            })
        )
    }

    /// Is this an exactly-one fetch that matched several rows?
    pub fn is_too_many(&self) -> bool {
        matches!(
            self,
            Error::Cardinality(CardinalityError {
                kind: CardinalityKind::TooMany,
                ..
            })
        )
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }

    /// Zero rows where exactly one was required (also used for primary-key lookups).
    pub fn not_found(model: &str, operation: &'static str) -> Self {
        Error::Cardinality(CardinalityError {
            kind: CardinalityKind::NotFound,
            model: model.to_string(),
            operation,
            found: 0,
        })
    }

    /// Build the cardinality error for an exactly-one fetch that matched `found` rows.
    ///
    /// Returns `None` when `found == 1`.
    pub fn expect_one(model: &str, operation: &'static str, found: usize) -> Option<Self> {
        match found {
            0 => Some(Self::not_found(model, operation)),
            1 => None,
            _ => Some(Error::Cardinality(CardinalityError {
                kind: CardinalityKind::TooMany,
                model: model.to_string(),
                operation,
                found,
            })),
        }
    }

    pub fn type_mismatch(
        operation: &'static str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch(TypeMismatchError {
            operation,
            expected: expected.into(),
            actual: actual.into(),
        })
    }

    pub fn unresolved(kind: UnresolvedKind, name: impl Into<String>) -> Self {
        Error::Unresolved(UnresolvedError {
            kind,
            name: name.into(),
            model: None,
        })
    }

    pub fn unresolved_for(
        kind: UnresolvedKind,
        name: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Error::Unresolved(UnresolvedError {
            kind,
            name: name.into(),
            model: Some(model.into()),
        })
    }

    /// Wrap an adapter failure together with the SQL that triggered it.
    pub fn query(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Query(QueryError {
            sql: Some(sql.into()),
            message: message.into(),
            source: None,
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingParameter(name) => {
                write!(f, "Missing parameter: \"{}\" is required", name)
            }
            Error::TypeMismatch(e) => write!(f, "Type mismatch: {}", e),
            Error::Unresolved(e) => write!(f, "Unresolved dependency: {}", e),
            Error::Cardinality(e) => write!(f, "Cardinality violation: {}", e),
            Error::InvalidMode(mode) => write!(f, "Invalid return mode \"{}\"", mode),
            Error::CascadeDepthExceeded { model, limit } => write!(
                f,
                "Cascade from {} exceeded the maximum depth of {}",
                model, limit
            ),
            Error::Query(e) => write!(f, "Query error: {}", e),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}() must be passed a model of type {}, got {}",
            self.operation, self.expected, self.actual
        )
    }
}

impl fmt::Display for UnresolvedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            UnresolvedKind::Model => "model".to_string(),
            UnresolvedKind::Component(kind) => format!("{} implementation", kind),
            UnresolvedKind::Converter => "field converter".to_string(),
            UnresolvedKind::Association => "association".to_string(),
        };
        match &self.model {
            Some(model) => write!(f, "{} \"{}\" not found for {}", what, self.name, model),
            None => write!(f, "{} \"{}\" not found", what, self.name),
        }
    }
}

impl fmt::Display for CardinalityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CardinalityKind::NotFound => write!(
                f,
                "{}() on {} expected one row, found none",
                self.operation, self.model
            ),
            CardinalityKind::TooMany => write!(
                f,
                "{}() on {} expected one row, found {}",
                self.operation, self.model, self.found
            ),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sql) = &self.sql {
            write!(f, "{} (SQL: {})", self.message, sql)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Type(TypeError {
            expected: "JSON document",
            actual: err.to_string(),
            column: None,
        })
    }
}

/// Result type alias for rowmap operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_one_distinguishes_none_from_many() {
        let none = Error::expect_one("User", "fetch_one", 0).unwrap();
        assert!(none.is_not_found());
        assert!(!none.is_too_many());

        assert!(Error::expect_one("User", "fetch_one", 1).is_none());

        let many = Error::expect_one("User", "fetch_one", 3).unwrap();
        assert!(many.is_too_many());
        assert_eq!(
            many.to_string(),
            "Cardinality violation: fetch_one() on User expected one row, found 3"
        );
    }

    #[test]
    fn display_messages() {
        let err = Error::type_mismatch("save", "User", "Post");
        assert_eq!(
            err.to_string(),
            "Type mismatch: save() must be passed a model of type User, got Post"
        );

        let err = Error::unresolved_for(UnresolvedKind::Converter, "Money", "Invoice");
        assert_eq!(
            err.to_string(),
            "Unresolved dependency: field converter \"Money\" not found for Invoice"
        );

        let err = Error::unresolved(UnresolvedKind::Component(ComponentKind::Persistor), "Ghost");
        assert!(err.to_string().contains("Persistor implementation \"Ghost\""));
    }

    #[test]
    fn query_error_keeps_sql() {
        let err = Error::query("SELECT 1", "syntax error");
        assert_eq!(err.sql(), Some("SELECT 1"));
        assert!(err.to_string().contains("syntax error"));
    }
}
