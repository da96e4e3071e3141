use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::Context as _;

use crate::{
    engine::{EngineKind, MediaEngine, SynthesisContext, command_line},
    error::{DailiesError, DailiesResult},
    request::MediaRequest,
    tables::CodecSpec,
};

/// Stream-mux engine built on the ffmpeg concat demuxer.
///
/// The synthesis plan is an ordered concatenation list `[slate?, input]`
/// written to a scratch manifest, consumed by a single ffmpeg invocation.
pub struct FfmpegEngine;

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Concat manifest body: one `file '<path>'` line per entry, slate first.
pub fn concat_manifest(slate: Option<&Path>, input: &Path) -> String {
    let mut body = String::new();
    if let Some(slate) = slate {
        body.push_str(&format!("file '{}'\n", slate.display()));
    }
    body.push_str(&format!("file '{}'\n", input.display()));
    body
}

fn build_command(
    manifest: &Path,
    request: &MediaRequest,
    codec: Option<CodecSpec>,
) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-loglevel", "info", "-f", "concat", "-safe", "0", "-i"])
        .arg(manifest)
        .arg("-s")
        .arg(request.resolution.to_string())
        .args(["-threads", "4"]);

    if let Some(codec) = codec {
        cmd.args(["-c:v", codec.codec, "-pix_fmt", codec.pix_fmt]);
    }

    if let Some(fps) = request.fps {
        cmd.arg("-r").arg(fps.to_string());
    }

    // Pass-through options become raw flag/value pairs; a flag with no value
    // is emitted bare (boolean-switch semantics).
    for (key, value) in &request.options {
        cmd.arg(format!("-{key}"));
        if let Some(value) = value {
            cmd.arg(value);
        }
    }

    cmd.arg(&request.output_path);
    cmd
}

impl MediaEngine for FfmpegEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Ffmpeg
    }

    fn supports_slate(&self) -> bool {
        true
    }

    fn create_media(
        &self,
        request: &MediaRequest,
        ctx: &SynthesisContext<'_>,
    ) -> DailiesResult<PathBuf> {
        if !is_ffmpeg_on_path() {
            return Err(DailiesError::unavailable(
                "ffmpeg was not found on PATH",
            ));
        }

        let manifest = ctx.scratch.unique_path("concat_manifest", "txt");
        let body = concat_manifest(ctx.slate_asset.as_deref(), &request.input_path);
        std::fs::write(&manifest, &body)
            .with_context(|| format!("failed to write manifest '{}'", manifest.display()))?;
        tracing::debug!("concat manifest:\n{body}");

        let mut cmd = build_command(&manifest, request, ctx.codec);
        let rendered = command_line(&cmd);
        tracing::info!("running: {rendered}");

        let output = cmd
            .output()
            .map_err(|e| DailiesError::execution(rendered.clone(), format!("spawn failed: {e}")))?;

        if !output.status.success() {
            return Err(DailiesError::execution(
                rendered,
                format!(
                    "exit status {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        tracing::info!("media created at {}", request.output_path.display());
        Ok(request.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Resolution;

    fn request() -> MediaRequest {
        MediaRequest::new(
            "/seq/plate.%03d.jpg",
            "/out/daily.mov",
            Resolution { width: 1920, height: 1080 },
            "mov",
        )
        .with_fps(24)
    }

    #[test]
    fn manifest_without_slate_lists_only_the_input() {
        let body = concat_manifest(None, Path::new("/seq/plate.%03d.jpg"));
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines, vec!["file '/seq/plate.%03d.jpg'"]);
    }

    #[test]
    fn manifest_with_slate_lists_slate_strictly_first() {
        let body = concat_manifest(
            Some(Path::new("/tmp/slate.jpg")),
            Path::new("/seq/plate.%03d.jpg"),
        );
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "file '/tmp/slate.jpg'");
        assert_eq!(lines[1], "file '/seq/plate.%03d.jpg'");
    }

    #[test]
    fn command_includes_codec_fps_and_output() {
        let codec = CodecSpec { codec: "libx264", pix_fmt: "yuv420p" };
        let cmd = build_command(Path::new("/tmp/m.txt"), &request(), Some(codec));
        let line = command_line(&cmd);
        assert!(line.contains("-f concat -safe 0 -i /tmp/m.txt"));
        assert!(line.contains("-s 1920x1080"));
        assert!(line.contains("-c:v libx264 -pix_fmt yuv420p"));
        assert!(line.contains("-r 24"));
        assert!(line.ends_with("/out/daily.mov"));
    }

    #[test]
    fn extraction_mode_omits_codec_and_pix_fmt() {
        let cmd = build_command(Path::new("/tmp/m.txt"), &request(), None);
        let line = command_line(&cmd);
        assert!(!line.contains("-c:v"));
        assert!(!line.contains("-pix_fmt"));
    }

    #[test]
    fn bare_flags_emit_without_a_trailing_value() {
        let mut req = request();
        req.options.insert("y".to_string(), None);
        req.options.insert("crf".to_string(), Some("18".to_string()));
        let cmd = build_command(Path::new("/tmp/m.txt"), &req, None);
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let crf = args.iter().position(|a| a == "-crf").unwrap();
        assert_eq!(args[crf + 1], "18");

        let y = args.iter().position(|a| a == "-y").unwrap();
        // `-y` is a switch; the next arg is the output path, not a value.
        assert!(args[y + 1].starts_with('/'));
    }
}
