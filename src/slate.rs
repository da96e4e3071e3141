use std::{path::PathBuf, process::Command};

use crate::{
    engine::command_line,
    engine_ffmpeg::is_ffmpeg_on_path,
    error::{DailiesError, DailiesResult},
    request::{Resolution, SlateSpec},
    scratch::ScratchDir,
};

pub const SLATE_FONT_SIZE: u32 = 18;
pub const SLATE_LINE_SPACING: u32 = 8;
/// Nudges the centered block down so it clears the top-edge review overlays.
const SLATE_VERTICAL_OFFSET: i64 = 10;
const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Renders a [`SlateSpec`] into a standalone single-frame asset.
///
/// The slate is generated by ffmpeg from a black `lavfi` source with one
/// `drawtext` filter per template line. The output format is chosen by the
/// caller to match the main input so the concat step downstream accepts it.
pub struct SlateCompositor<'a> {
    scratch: &'a ScratchDir,
}

impl<'a> SlateCompositor<'a> {
    pub fn new(scratch: &'a ScratchDir) -> Self {
        Self { scratch }
    }

    /// Renders the slate and returns the path of the generated frame.
    pub fn render(
        &self,
        spec: &SlateSpec,
        resolution: Resolution,
        extension: &str,
    ) -> DailiesResult<PathBuf> {
        if !is_ffmpeg_on_path() {
            return Err(DailiesError::unavailable(
                "ffmpeg is required for slate rendering but was not found on PATH",
            ));
        }

        let out = self.scratch.unique_path("slate", extension);
        let filter = drawtext_filter(spec, resolution, &font_path());

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-loglevel", "error", "-f", "lavfi", "-t", "0.001", "-i"])
            .arg(format!("color=c=black:s={resolution}"))
            .arg("-vf")
            .arg(&filter)
            .args(["-frames:v", "1", "-update", "1", "-y"])
            .arg(&out);

        let rendered = command_line(&cmd);
        tracing::info!("rendering slate: {rendered}");

        let output = cmd
            .output()
            .map_err(|e| DailiesError::slate(format!("failed to spawn ffmpeg: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DailiesError::slate(format!(
                "ffmpeg exited with {} while rendering slate (`{rendered}`): {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::info!("slate frame written to {}", out.display());
        Ok(out)
    }
}

fn font_path() -> String {
    std::env::var("DAILIES_SLATE_FONT").unwrap_or_else(|_| DEFAULT_FONT_PATH.to_string())
}

/// Formats the fixed slate template with the supplied fields.
pub fn slate_text(spec: &SlateSpec) -> String {
    format!(
        "VERSION: {}\nFILE: {}\nDESCRIPTION: {}\nARTIST: {}\nLINK: {}\nTASK: {}\nPROJECT: {}\nRESOLUTION: {}\nFPS: {}",
        spec.version,
        spec.file,
        spec.description,
        spec.artist,
        spec.link,
        spec.task,
        spec.project,
        spec.resolution,
        spec.fps,
    )
}

/// Vertical pixel offsets, one per line, centering the whole block.
///
/// `line_height = font_size + spacing`; the block's total height drops the
/// trailing spacing, and the start offset biases the centered block by
/// [`SLATE_VERTICAL_OFFSET`].
pub fn line_offsets(line_count: usize, canvas_height: u32) -> Vec<i64> {
    let line_height = i64::from(SLATE_FONT_SIZE + SLATE_LINE_SPACING);
    let total = line_height * line_count as i64 - i64::from(SLATE_LINE_SPACING);
    let start_y = (i64::from(canvas_height) - total) / 2 + SLATE_VERTICAL_OFFSET;
    (0..line_count as i64).map(|i| start_y + i * line_height).collect()
}

/// Strips characters that collide with drawtext's `key=value:key=value`
/// filter syntax. Colons are the known offender.
pub fn sanitize_line(line: &str) -> String {
    line.replace([':', '\''], "")
}

fn drawtext_filter(spec: &SlateSpec, resolution: Resolution, font: &str) -> String {
    let text = slate_text(spec);
    let lines: Vec<&str> = text.lines().collect();
    let offsets = line_offsets(lines.len(), resolution.height);

    let filters: Vec<String> = lines
        .iter()
        .zip(&offsets)
        .map(|(line, y)| {
            format!(
                "drawtext=fontsize={SLATE_FONT_SIZE}:fontcolor=White:fontfile='{font}':text='{}':x=(w-text_w)/2:y={y}",
                sanitize_line(line)
            )
        })
        .collect();

    filters.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SlateSpec {
        SlateSpec {
            version: "v003".into(),
            file: "plate.%03d.exr".into(),
            description: "final comp: approved".into(),
            artist: "ada".into(),
            link: "sq01_sh010".into(),
            task: "comp".into(),
            project: "mr".into(),
            resolution: "1920x1080".into(),
            fps: "24".into(),
        }
    }

    #[test]
    fn template_renders_all_fields_in_order() {
        let text = slate_text(&spec());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "VERSION: v003");
        assert_eq!(lines[3], "ARTIST: ada");
        assert_eq!(lines[8], "FPS: 24");
    }

    #[test]
    fn offsets_increase_by_exactly_one_line_height() {
        let offsets = line_offsets(9, 1080);
        let line_height = i64::from(SLATE_FONT_SIZE + SLATE_LINE_SPACING);
        for pair in offsets.windows(2) {
            assert_eq!(pair[1] - pair[0], line_height);
        }
    }

    #[test]
    fn block_midpoint_stays_near_canvas_midpoint() {
        let canvas_height = 1080u32;
        let offsets = line_offsets(9, canvas_height);
        let line_height = i64::from(SLATE_FONT_SIZE + SLATE_LINE_SPACING);

        let top = offsets[0];
        let bottom = offsets[offsets.len() - 1] + i64::from(SLATE_FONT_SIZE);
        let block_mid = (top + bottom) / 2;
        let canvas_mid = i64::from(canvas_height) / 2;
        assert!(
            (block_mid - canvas_mid).abs() <= line_height,
            "block midpoint {block_mid} drifted from canvas midpoint {canvas_mid}"
        );
    }

    #[test]
    fn sanitize_strips_filter_delimiters() {
        assert_eq!(sanitize_line("DESCRIPTION final: v2 'ok'"), "DESCRIPTION final v2 ok");
    }

    #[test]
    fn filter_contains_one_drawtext_per_line() {
        let filter = drawtext_filter(&spec(), Resolution { width: 1920, height: 1080 }, "font.ttf");
        assert_eq!(filter.matches("drawtext=").count(), 9);
        assert!(filter.contains("x=(w-text_w)/2"));
        // Colon in the description must not leak into the filter text value.
        assert!(!filter.contains("comp: approved"));
    }
}
