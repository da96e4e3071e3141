use std::path::PathBuf;

pub type DailiesResult<T> = Result<T, DailiesError>;

/// Failure taxonomy for the synthesis and tracking pipeline.
///
/// Media-synthesis errors abort the current request; identity-resolution
/// failures stay non-fatal until a downstream operation actually requires
/// the missing ID, at which point they surface as [`DailiesError::MissingIdentity`].
#[derive(thiserror::Error, Debug)]
pub enum DailiesError {
    #[error("input not found: '{path}'")]
    InputNotFound { path: PathBuf },

    #[error("extension '{extension}' is not supported by the {engine} engine")]
    UnsupportedExtension {
        extension: String,
        engine: &'static str,
    },

    #[error("no frame sequence found for pattern '{pattern}'")]
    SequenceNotFound { pattern: String },

    #[error("slate render error: {0}")]
    SlateRenderError(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("unsupported option: {0}")]
    UnsupportedOption(String),

    #[error("execution failure running `{command}`: {detail}")]
    ExecutionFailure { command: String, detail: String },

    #[error("template '{path}' is not a valid graph document: {reason}")]
    TemplateInvalid { path: PathBuf, reason: String },

    #[error("node '{node}' not found in template '{template}'")]
    TemplateNodeMissing { node: String, template: PathBuf },

    #[error("missing identity: no {slot} id could be resolved")]
    MissingIdentity { slot: &'static str },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("tracking error: {0}")]
    Tracking(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DailiesError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn slate(msg: impl Into<String>) -> Self {
        Self::SlateRenderError(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking(msg.into())
    }

    pub fn execution(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ExecutionFailure {
            command: command.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            DailiesError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            DailiesError::slate("x")
                .to_string()
                .contains("slate render error:")
        );
        assert!(
            DailiesError::unavailable("x")
                .to_string()
                .contains("backend unavailable:")
        );
    }

    #[test]
    fn execution_failure_carries_command_and_detail() {
        let err = DailiesError::execution("ffmpeg -i in.mov out.mov", "exit status 1");
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg -i in.mov out.mov"));
        assert!(msg.contains("exit status 1"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = DailiesError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
