use std::path::PathBuf;

use thiserror::Error;

/// Fatal content or configuration errors. These stop the frame loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("component type `{0}` not found in any resource directory")]
    MissingComponentType(String),

    #[error("actor template `{0}` not found")]
    MissingTemplate(String),

    #[error("scene `{0}` not found")]
    MissingScene(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("component type script {path}: {message}")]
    Script { path: PathBuf, message: String },

    #[error("component `{key}` has no type and nothing to inherit from")]
    UntypedComponent { key: String },

    #[error("game.config is missing required key `{0}`")]
    MissingConfigKey(&'static str),

    #[error("{component}.{property}: unknown value `{value}`")]
    InvalidProperty {
        component: &'static str,
        property: String,
        value: String,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfacing from a behavior callback.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A recoverable error raised by game code. Logged at the call site.
    #[error("{0}")]
    Raised(String),

    /// A fatal condition hit while running game code.
    #[error(transparent)]
    Fatal(#[from] EngineError),
}

impl ScriptError {
    pub fn raised(message: impl Into<String>) -> Self {
        ScriptError::Raised(message.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ScriptError::Fatal(_))
    }
}

pub type ScriptResult<T = ()> = Result<T, ScriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_convert_to_fatal_script_errors() {
        fn load() -> ScriptResult {
            Err(EngineError::MissingComponentType("Shield".into()))?
        }
        let err = load().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Shield"));
    }

    #[test]
    fn raised_errors_are_recoverable() {
        let err = ScriptError::raised("attempt to index a nil value");
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "attempt to index a nil value");
    }
}
