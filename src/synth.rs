use std::path::PathBuf;

use crate::{
    engine::{EngineKind, MediaEngine, SynthesisContext, create_engine},
    error::{DailiesError, DailiesResult},
    frames::{self, FrameRange},
    request::MediaRequest,
    scratch::ScratchDir,
    slate::SlateCompositor,
    tables,
};

/// Orchestrates one synthesis request end to end: validation, optional slate
/// render, frame-range detection, then delegation to the selected engine.
pub struct MediaSynthesizer {
    engine: Box<dyn MediaEngine>,
    scratch: ScratchDir,
}

impl MediaSynthesizer {
    pub fn new(kind: EngineKind) -> DailiesResult<Self> {
        Ok(Self {
            engine: create_engine(kind),
            scratch: ScratchDir::ensure()?,
        })
    }

    /// Injection point for tests and embedders with a custom engine.
    pub fn with_engine(engine: Box<dyn MediaEngine>, scratch: ScratchDir) -> Self {
        Self { engine, scratch }
    }

    /// Creates the media artifact and returns its output path.
    #[tracing::instrument(skip(self, request), fields(engine = %self.engine.kind(), output = %request.output_path.display()))]
    pub fn create(&self, request: &MediaRequest) -> DailiesResult<PathBuf> {
        // Existence is validated against the sequence start index; execution
        // itself consumes the pattern, not this substituted path.
        let probe = frames::substitute_frame(&request.input_path, frames::FRAME_START_NUMBER);
        if !probe.exists() {
            return Err(DailiesError::InputNotFound { path: probe });
        }

        // Capability check happens before the engine is ever invoked.
        if !self.engine.supports_extension(&request.extension) {
            return Err(DailiesError::UnsupportedExtension {
                extension: request.extension.clone(),
                engine: self.engine.kind().name(),
            });
        }

        let slate_asset = match (&request.slate, self.engine.supports_slate()) {
            (Some(spec), true) => {
                // The slate frame format matches the input sequence so the
                // downstream concatenation accepts it.
                let extension = match request.input_extension() {
                    ext if ext.is_empty() => request.extension.clone(),
                    ext => ext,
                };
                let compositor = SlateCompositor::new(&self.scratch);
                Some(compositor.render(spec, request.resolution, &extension)?)
            }
            (Some(_), false) => {
                tracing::warn!(
                    "{} engine does not composite slates; skipping slate render",
                    self.engine.kind()
                );
                None
            }
            (None, _) => None,
        };

        let frame_range = self.detect_frame_range(request)?;
        let codec = negotiate_codec(self.engine.kind(), request);

        let ctx = SynthesisContext {
            scratch: &self.scratch,
            frame_range,
            slate_asset,
            codec,
        };
        self.engine.create_media(request, &ctx)
    }

    fn detect_frame_range(&self, request: &MediaRequest) -> DailiesResult<Option<FrameRange>> {
        if !frames::is_sequence_pattern(&request.input_path) {
            return Ok(None);
        }
        let range = frames::detect_range(&request.input_path)?;
        tracing::info!("detected frame range {range}");
        Ok(Some(range))
    }
}

/// Codec/pixel-format negotiation.
///
/// Only the stream-mux engine consumes a codec pair. Negotiation is skipped
/// in pure-extraction mode: a video container decomposed into an image
/// sequence copies frames without re-encoding.
fn negotiate_codec(kind: EngineKind, request: &MediaRequest) -> Option<tables::CodecSpec> {
    if kind != EngineKind::Ffmpeg {
        return None;
    }
    let extraction = tables::is_video_extension(&request.input_extension())
        && tables::is_image_sequence_extension(&request.extension);
    if extraction {
        tracing::info!("pure extraction mode, skipping codec negotiation");
        return None;
    }
    tables::ffmpeg_codec(&request.extension)
}
