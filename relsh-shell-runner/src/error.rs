use thiserror::Error;

/// Failure of a dispatched operation.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Generic execution exited non-zero. Displays as the captured output
    /// alone; the exit code is kept for callers that want it.
    #[error("{output}")]
    Execution { output: String, code: i32 },

    /// A built-in, a direct call or the executor itself raised an error.
    #[error("{operation}: {source:#}")]
    Capability {
        operation: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    pub fn capability(operation: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Capability {
            operation: operation.into(),
            source,
        }
    }

    /// Captured output of a failed execution.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Execution { output, .. } => Some(output),
            Self::Capability { .. } => None,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Execution { code, .. } => Some(*code),
            Self::Capability { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_failure_displays_output_only() {
        let err = DispatchError::Execution {
            output: "npm ERR! 403\n".to_owned(),
            code: 1,
        };
        assert_eq!(err.to_string(), "npm ERR! 403\n");
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(err.output(), Some("npm ERR! 403\n"));
    }

    #[test]
    fn capability_failure_names_the_operation() {
        let err = DispatchError::capability("popd", anyhow::anyhow!("directory stack empty"));
        assert_eq!(err.to_string(), "popd: directory stack empty");
        assert!(err.output().is_none());
    }
}
