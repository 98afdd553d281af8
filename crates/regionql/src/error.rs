//! Error types for regionql

use thiserror::Error;

/// Result type alias for regionql operations
pub type OqlResult<T> = Result<T, OqlError>;

/// Error types for query compilation, paging and execution
#[derive(Debug, Error)]
pub enum OqlError {
    /// A derived method name could not be parsed
    #[error("Invalid method name '{name}': {message}")]
    InvalidMethodName { name: String, message: String },

    /// A criterion names a property the entity does not declare
    #[error("No property '{property}' found on region '{region}'")]
    NoSuchProperty { property: String, region: String },

    /// An operator was applied to a property whose type cannot support it
    #[error("Operator {operator} is not supported for property '{property}' of type {kind}")]
    IncompatibleOperator {
        property: String,
        kind: String,
        operator: String,
    },

    /// A derived method has no criteria and no explicit query
    #[error("No criteria derived from the method name and no explicit query declared")]
    EmptyCriteria,

    /// More placeholders were requested than the method declares parameters
    #[error("Placeholder overflow: method declares {max} bindable parameter(s)")]
    PlaceholderOverflow { max: usize },

    /// Registration-time error, tagged with the offending method
    #[error("Query method '{method}': {source}")]
    Method {
        method: String,
        #[source]
        source: Box<OqlError>,
    },

    /// Validation error (blank query text, invalid page request, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// No executor in a chain accepted the query
    #[error("No executor was able to run query: {0}")]
    UnsupportedExecution(String),

    /// A hook aborted the query before execution
    #[error("Query aborted: {0}")]
    Aborted(String),

    /// Error raised by the external execution engine
    #[error("Engine error: {0}")]
    Engine(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OqlError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid method name error
    pub fn invalid_method_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMethodName {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Wrap this error with the name of the query method it belongs to.
    ///
    /// Already-wrapped errors are returned unchanged.
    pub fn in_method(self, method: impl Into<String>) -> Self {
        match self {
            err @ Self::Method { .. } => err,
            err => Self::Method {
                method: method.into(),
                source: Box::new(err),
            },
        }
    }

    /// Name of the query method this error was raised for, if known
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Method { method, .. } => Some(method),
            _ => None,
        }
    }

    /// The underlying error, looking through a [`OqlError::Method`] wrapper
    pub fn root(&self) -> &OqlError {
        match self {
            Self::Method { source, .. } => source.root(),
            err => err,
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self.root(), Self::Validation(_))
    }

    /// Check if this is a registration-time configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.root(),
            Self::InvalidMethodName { .. }
                | Self::NoSuchProperty { .. }
                | Self::IncompatibleOperator { .. }
                | Self::EmptyCriteria
                | Self::PlaceholderOverflow { .. }
        )
    }
}

impl From<serde_json::Error> for OqlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
