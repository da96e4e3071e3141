use std::path::PathBuf;

use crate::{
    engine::{EngineKind, MediaEngine, SynthesisContext},
    error::{DailiesError, DailiesResult},
    frames::{FrameRange, substitute_frame, to_graph_pattern},
    nk::{GraphDocument, GraphNode, READ_NODE, WRITE_NODE, is_nuke_on_path},
    request::{MediaRequest, OptionMap, Resolution},
};

/// Node-graph engine: composes a linear `Read -> [Reformat] -> Write` script
/// and evaluates it with Nuke in terminal mode.
pub struct NukeEngine;

/// Per-format sink configuration strategy.
///
/// Each variant knows the `file_type` knob value, the frame-rate knob (when
/// the container has one) and the knob names it recognizes from free-form
/// request options. Unrecognized option keys are logged and skipped, never
/// fatal; digit-only string values are coerced before assignment (knob
/// storage is typed on the Nuke side).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkConfigurator {
    Mov,
    Exr,
    Dnx,
    Jpeg,
    Gif,
    Mxf,
    Png,
    Targa,
    Tiff,
    Xpm,
    Yuv,
}

impl SinkConfigurator {
    pub fn for_extension(extension: &str) -> Option<Self> {
        match extension {
            "mov" => Some(Self::Mov),
            "exr" => Some(Self::Exr),
            "dnx" => Some(Self::Dnx),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "mxf" => Some(Self::Mxf),
            "png" => Some(Self::Png),
            "targa" => Some(Self::Targa),
            "tiff" => Some(Self::Tiff),
            "xpm" => Some(Self::Xpm),
            "yuv" => Some(Self::Yuv),
            _ => None,
        }
    }

    fn file_type(self) -> &'static str {
        match self {
            Self::Mov => "mov",
            Self::Exr => "exr",
            Self::Dnx => "dnxhd",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Mxf => "mxf",
            Self::Png => "png",
            Self::Targa => "targa",
            Self::Tiff => "tiff",
            Self::Xpm => "xpm",
            Self::Yuv => "yuv",
        }
    }

    fn fps_knob(self) -> Option<&'static str> {
        match self {
            Self::Mov => Some("mov64_fps"),
            Self::Gif | Self::Mxf => Some("fps"),
            _ => None,
        }
    }

    fn known_knobs(self) -> &'static [&'static str] {
        match self {
            Self::Mov => &["mov64_codec", "mov64_quality", "mov64_bitrate", "mov64_fps"],
            Self::Exr => &["compression", "datatype", "metadata"],
            Self::Dnx => &["mov64_dnxhd_codec_profile"],
            Self::Jpeg => &["_jpeg_quality", "_jpeg_sub_sampling"],
            Self::Gif => &["fps"],
            Self::Mxf => &["mxf_codec_profile", "fps"],
            Self::Png => &["datatype"],
            Self::Targa => &["compression"],
            Self::Tiff => &["compression", "datatype"],
            Self::Xpm => &[],
            Self::Yuv => &[],
        }
    }

    /// Applies file type, frame rate and recognized option knobs to the sink.
    pub fn configure(self, sink: &mut GraphNode, fps: Option<u32>, options: &OptionMap) {
        sink.set_knob("file_type", self.file_type());
        if let (Some(knob), Some(fps)) = (self.fps_knob(), fps) {
            sink.set_knob(knob, fps.to_string());
        }

        for (key, value) in options {
            if !self.known_knobs().contains(&key.as_str()) {
                tracing::warn!(
                    "skipping unknown option '{key}' for {} sink configuration",
                    self.file_type()
                );
                continue;
            }
            let value = match value {
                Some(v) => coerce_value(v),
                None => "true".to_string(),
            };
            tracing::debug!("setting sink knob {key}={value}");
            sink.set_knob(key, value);
        }
    }
}

/// Digit-only strings assign as integers on the graph side; everything else
/// passes through as-is.
fn coerce_value(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        match value.parse::<u64>() {
            Ok(n) => n.to_string(),
            Err(_) => value.to_string(),
        }
    } else {
        value.to_string()
    }
}

/// Probes the first frame of the sequence for its pixel dimensions.
/// Returns `None` for containers and unreadable frames; the caller then
/// resizes unconditionally.
fn probe_source_resolution(request: &MediaRequest, range: FrameRange) -> Option<Resolution> {
    let first = substitute_frame(&request.input_path, range.first);
    match image::image_dimensions(&first) {
        Ok((width, height)) => Some(Resolution { width, height }),
        Err(e) => {
            tracing::debug!("could not probe '{}': {e}", first.display());
            None
        }
    }
}

/// Builds the linear synthesis pipeline as a graph document.
pub fn build_pipeline(
    request: &MediaRequest,
    range: FrameRange,
    source_resolution: Option<Resolution>,
) -> DailiesResult<GraphDocument> {
    let configurator = SinkConfigurator::for_extension(&request.extension).ok_or_else(|| {
        DailiesError::UnsupportedOption(format!(
            "no sink configurator for extension '{}'",
            request.extension
        ))
    })?;

    let mut doc = GraphDocument::default();

    let mut read = GraphNode::new("Read");
    read.set_knob("name", READ_NODE);
    read.set_knob(
        "file",
        to_graph_pattern(&request.input_path).to_string_lossy(),
    );
    read.set_knob("first", range.first.to_string());
    read.set_knob("last", range.last.to_string());
    doc.push(read);

    // Resize only when the source measurably differs from the target;
    // fit-to-box scaling preserves aspect.
    let mut upstream = READ_NODE.to_string();
    if source_resolution != Some(request.resolution) {
        let mut resize = GraphNode::new("Reformat");
        resize.set_knob("name", "Reformat1");
        resize.set_knob("type", "to box");
        resize.set_knob("resize", "fit");
        resize.set_knob("box_width", request.resolution.width.to_string());
        resize.set_knob("box_height", request.resolution.height.to_string());
        resize.set_knob("input", &upstream);
        doc.push(resize);
        upstream = "Reformat1".to_string();
    }

    let mut write = GraphNode::new("Write");
    write.set_knob("name", WRITE_NODE);
    write.set_knob("file", request.output_path.to_string_lossy());
    write.set_knob("first", range.first.to_string());
    write.set_knob("last", range.last.to_string());
    write.set_knob("input", &upstream);
    configurator.configure(&mut write, request.fps, &request.options);
    doc.push(write);

    Ok(doc)
}

impl MediaEngine for NukeEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Nuke
    }

    fn supports_slate(&self) -> bool {
        // The generated pipeline has no slate branch; declining here makes
        // the orchestrator warn and skip instead of rendering a frame this
        // engine would never consume.
        false
    }

    fn create_media(
        &self,
        request: &MediaRequest,
        ctx: &SynthesisContext<'_>,
    ) -> DailiesResult<PathBuf> {
        if !is_nuke_on_path() {
            return Err(DailiesError::unavailable("nuke was not found on PATH"));
        }

        let range = ctx.frame_range.ok_or_else(|| DailiesError::SequenceNotFound {
            pattern: request.input_path.to_string_lossy().into_owned(),
        })?;

        let source_resolution = probe_source_resolution(request, range);
        let doc = build_pipeline(request, range, source_resolution)?;

        let script = ctx.scratch.unique_path("pipeline", "nk");
        doc.write_to(&script)?;
        tracing::debug!("generated graph script:\n{}", doc.to_script());

        crate::nk::evaluate(&script, range)?;
        tracing::info!("media created at {}", request.output_path.display());
        Ok(request.output_path.clone())
    }
}
