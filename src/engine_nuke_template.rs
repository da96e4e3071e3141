use std::path::{Path, PathBuf};

use crate::{
    engine::{EngineKind, MediaEngine, SynthesisContext},
    error::{DailiesError, DailiesResult},
    frames::{FrameRange, to_graph_pattern},
    nk::{GraphDocument, READ_NODE, WRITE_NODE, is_nuke_on_path},
    request::MediaRequest,
};

/// Template-backed node-graph engine.
///
/// Opens a pre-authored graph script, rebinds the deterministically named
/// source and sink nodes to the request's paths, applies the detected frame
/// range, and evaluates the rebound script. The template's own grading or
/// burn-in nodes between the two are left untouched.
pub struct NukeTemplateEngine;

/// Rebinds `Read1`/`Write1` in a parsed template document.
pub fn rebind_template(
    doc: &mut GraphDocument,
    template: &Path,
    request: &MediaRequest,
    range: FrameRange,
) -> DailiesResult<()> {
    for (name, file) in [
        (READ_NODE, to_graph_pattern(&request.input_path)),
        (WRITE_NODE, request.output_path.clone()),
    ] {
        let node = doc
            .node_by_name_mut(name)
            .ok_or_else(|| DailiesError::TemplateNodeMissing {
                node: name.to_string(),
                template: template.to_path_buf(),
            })?;
        node.set_knob("file", file.to_string_lossy());
        node.set_knob("first", range.first.to_string());
        node.set_knob("last", range.last.to_string());
    }
    Ok(())
}

impl MediaEngine for NukeTemplateEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::NukeTemplate
    }

    fn supports_slate(&self) -> bool {
        // Slates come from the template itself, not from the compositor.
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

        let template = request.template_path.as_deref().ok_or_else(|| {
            DailiesError::validation("the nuke-template engine requires a template path")
        })?;
        let range = ctx.frame_range.ok_or_else(|| DailiesError::SequenceNotFound {
            pattern: request.input_path.to_string_lossy().into_owned(),
        })?;

        tracing::info!("opening graph template {}", template.display());
        let mut doc = GraphDocument::load(template)?;
        rebind_template(&mut doc, template, request, range)?;

        let script = ctx.scratch.unique_path("template_rebound", "nk");
        doc.write_to(&script)?;

        crate::nk::evaluate(&script, range)?;
        tracing::info!("media created at {}", request.output_path.display());
        Ok(request.output_path.clone())
    }
}
