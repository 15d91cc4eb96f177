use quadbatch_test_utils::ShaderError;

/// Errors returned by the sprite batcher.
///
/// Apart from [`BatchError::Shader`], every variant is a contract violation by the caller
/// (or, for [`BatchError::CapacityExceeded`], by the batcher itself) and should be
/// surfaced rather than retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// An operation was called in the wrong session state.
    InvalidState {
        operation: &'static str,
        /// Whether the batch was drawing when the operation was attempted.
        drawing: bool,
    },
    /// A vertex was appended to a full buffer.
    CapacityExceeded { capacity: usize },
    /// Raw vertex data had the wrong length.
    InvalidVertexData(String),
    /// The shader program rejected a uniform upload or failed to compile.
    Shader(ShaderError),
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidState {
                operation,
                drawing: true,
            } => write!(f, "{}() must not be called while drawing", operation),
            Self::InvalidState {
                operation,
                drawing: false,
            } => write!(f, "{}() requires begin() to be called first", operation),
            Self::CapacityExceeded { capacity } => {
                write!(f, "Vertex buffer capacity of {} vertices exceeded", capacity)
            }
            Self::InvalidVertexData(msg) => write!(f, "Invalid vertex data: {}", msg),
            Self::Shader(err) => write!(f, "Shader error: {}", err),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Shader(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for BatchError {
    fn from(err: ShaderError) -> Self {
        Self::Shader(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_invalid_state_display() {
        let begin = BatchError::InvalidState {
            operation: "begin",
            drawing: true,
        };
        assert_eq!(begin.to_string(), "begin() must not be called while drawing");

        let end = BatchError::InvalidState {
            operation: "end",
            drawing: false,
        };
        assert_eq!(end.to_string(), "end() requires begin() to be called first");
    }

    #[test]
    fn test_shader_error_is_source() {
        let err = BatchError::from(ShaderError::Driver("lost context".into()));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("lost context"));
    }
}
