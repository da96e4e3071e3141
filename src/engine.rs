use std::{path::PathBuf, str::FromStr};

use crate::{
    error::{DailiesError, DailiesResult},
    frames::FrameRange,
    request::MediaRequest,
    scratch::ScratchDir,
    tables::CodecSpec,
};

/// The interchangeable media-synthesis implementations.
///
/// A closed set selected once at construction; unknown names fail typed at
/// parse time instead of falling through a string-keyed registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineKind {
    /// Stream-mux via the ffmpeg concat demuxer.
    Ffmpeg,
    /// Node-graph pipeline evaluated by Nuke in terminal mode.
    Nuke,
    /// Pre-authored Nuke graph with deterministically named Read/Write nodes.
    NukeTemplate,
}

impl EngineKind {
    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Ffmpeg => "ffmpeg",
            EngineKind::Nuke => "nuke",
            EngineKind::NukeTemplate => "nuke-template",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = DailiesError;

    fn from_str(s: &str) -> DailiesResult<Self> {
        match s.to_lowercase().as_str() {
            "ffmpeg" => Ok(EngineKind::Ffmpeg),
            "nuke" => Ok(EngineKind::Nuke),
            "nuke-template" => Ok(EngineKind::NukeTemplate),
            other => Err(DailiesError::validation(format!(
                "unknown engine '{other}' (expected ffmpeg, nuke or nuke-template)"
            ))),
        }
    }
}

/// Inputs the synthesizer has already resolved before delegating to an engine.
#[derive(Debug)]
pub struct SynthesisContext<'a> {
    pub scratch: &'a ScratchDir,
    /// Detected span for sequence inputs; `None` for video containers.
    pub frame_range: Option<FrameRange>,
    /// Rendered slate frame, present only when the request carries a slate
    /// and the engine supports slate compositing.
    pub slate_asset: Option<PathBuf>,
    /// Negotiated codec; `None` in pure-extraction mode.
    pub codec: Option<CodecSpec>,
}

/// Capability contract of one synthesis backend.
///
/// Implementations build and execute a synthesis plan for an already
/// validated request. Execution is synchronous and blocking; the success
/// criterion is the artifact existing at `request.output_path` afterwards.
pub trait MediaEngine {
    fn kind(&self) -> EngineKind;

    fn supports_extension(&self, extension: &str) -> bool {
        crate::tables::is_supported(self.kind(), extension)
    }

    /// Whether this engine can prepend a rendered slate frame.
    fn supports_slate(&self) -> bool;

    fn create_media(
        &self,
        request: &MediaRequest,
        ctx: &SynthesisContext<'_>,
    ) -> DailiesResult<PathBuf>;
}

/// Renders a `Command` as a shell-style line for diagnostics.
pub fn command_line(cmd: &std::process::Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Constructs the engine for `kind`.
pub fn create_engine(kind: EngineKind) -> Box<dyn MediaEngine> {
    match kind {
        EngineKind::Ffmpeg => Box::new(crate::engine_ffmpeg::FfmpegEngine),
        EngineKind::Nuke => Box::new(crate::engine_nuke::NukeEngine),
        EngineKind::NukeTemplate => Box::new(crate::engine_nuke_template::NukeTemplateEngine),
    }
}
