use std::{collections::BTreeMap, path::PathBuf, str::FromStr};

use crate::error::{DailiesError, DailiesResult};

/// Output resolution in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> DailiesResult<Self> {
        if width == 0 || height == 0 {
            return Err(DailiesError::validation(
                "resolution width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = DailiesError;

    /// Parses the `WIDTHxHEIGHT` CLI form, e.g. `1920x1080`.
    fn from_str(s: &str) -> DailiesResult<Self> {
        let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| {
            DailiesError::validation(format!(
                "invalid resolution '{s}': expected WIDTHxHEIGHT (e.g. 1920x1080)"
            ))
        })?;
        let width = w.trim().parse::<u32>().map_err(|_| {
            DailiesError::validation(format!("invalid resolution width '{w}' in '{s}'"))
        })?;
        let height = h.trim().parse::<u32>().map_err(|_| {
            DailiesError::validation(format!("invalid resolution height '{h}' in '{s}'"))
        })?;
        Resolution::new(width, height)
    }
}

/// Free-form engine options: `flag -> Some(value)` or `flag -> None` for a
/// bare boolean switch. Ordered so generated commands are deterministic.
pub type OptionMap = BTreeMap<String, Option<String>>;

/// Parses options given either as a JSON object or as a comma-separated list
/// of `key=value` pairs / bare flags.
pub fn parse_options(raw: &str) -> DailiesResult<OptionMap> {
    let mut options = OptionMap::new();
    if raw.trim().is_empty() {
        return Ok(options);
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        let obj = value.as_object().ok_or_else(|| {
            DailiesError::validation(format!("options JSON must be an object, got: {raw}"))
        })?;
        for (key, val) in obj {
            let entry = match val {
                serde_json::Value::Null | serde_json::Value::Bool(true) => None,
                serde_json::Value::Bool(false) => continue,
                serde_json::Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
            options.insert(key.clone(), entry);
        }
        return Ok(options);
    }

    for item in raw.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        match item.split_once('=') {
            Some((key, value)) => {
                options.insert(key.trim().to_string(), Some(value.trim().to_string()));
            }
            None => {
                options.insert(item.to_string(), None);
            }
        }
    }
    Ok(options)
}

/// Text fields rendered onto the slate frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SlateSpec {
    pub version: String,
    pub file: String,
    pub description: String,
    pub artist: String,
    pub link: String,
    pub task: String,
    pub project: String,
    pub resolution: String,
    pub fps: String,
}

impl SlateSpec {
    /// Parses slate data given as JSON or comma-separated `key=value` pairs,
    /// then fills conventional defaults for the fields reviewers expect.
    pub fn parse(raw: &str) -> DailiesResult<Self> {
        let mut spec = if let Ok(spec) = serde_json::from_str::<SlateSpec>(raw) {
            spec
        } else {
            let mut spec = SlateSpec::default();
            for item in raw.split(',') {
                let item = item.trim();
                if item.is_empty() {
                    continue;
                }
                let (key, value) = item.split_once('=').ok_or_else(|| {
                    DailiesError::validation(format!(
                        "invalid slate field '{item}': expected key=value"
                    ))
                })?;
                let value = value.trim().to_string();
                match key.trim() {
                    "version" => spec.version = value,
                    "file" => spec.file = value,
                    "description" => spec.description = value,
                    "artist" => spec.artist = value,
                    "link" => spec.link = value,
                    "task" => spec.task = value,
                    "project" => spec.project = value,
                    "resolution" => spec.resolution = value,
                    "fps" => spec.fps = value,
                    other => {
                        tracing::warn!("ignoring unknown slate field '{other}'");
                    }
                }
            }
            spec
        };
        spec.apply_defaults();
        Ok(spec)
    }

    fn apply_defaults(&mut self) {
        if self.artist.is_empty() {
            self.artist = "Unknown Artist".to_string();
        }
        if self.project.is_empty() {
            self.project = "Unnamed Project".to_string();
        }
        if self.fps.is_empty() {
            self.fps = "24 FPS".to_string();
        }
        if self.version.is_empty() {
            self.version = "v001".to_string();
        }
    }
}

/// One media-synthesis invocation. Immutable once constructed; a request is
/// built per invocation and discarded after synthesis.
#[derive(Clone, Debug)]
pub struct MediaRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub resolution: Resolution,
    pub extension: String,
    pub fps: Option<u32>,
    pub options: OptionMap,
    pub slate: Option<SlateSpec>,
    /// Pre-authored graph document, used by the template engine only.
    pub template_path: Option<PathBuf>,
}

impl MediaRequest {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        resolution: Resolution,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            resolution,
            extension: extension.into().to_lowercase(),
            fps: None,
            options: OptionMap::new(),
            slate: None,
            template_path: None,
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn with_options(mut self, options: OptionMap) -> Self {
        self.options = options;
        self
    }

    pub fn with_slate(mut self, slate: SlateSpec) -> Self {
        self.slate = Some(slate);
        self
    }

    pub fn with_template(mut self, template_path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(template_path.into());
        self
    }

    /// Extension of the input pattern, lowercased (empty when absent).
    pub fn input_extension(&self) -> String {
        self.input_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_parses_widthxheight() {
        let r: Resolution = "1920x1080".parse().unwrap();
        assert_eq!(r, Resolution { width: 1920, height: 1080 });
        assert!("1920".parse::<Resolution>().is_err());
        assert!("0x1080".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
    }

    #[test]
    fn options_parse_as_json_object() {
        let opts = parse_options(r#"{"crf": "18", "y": true, "an": null}"#).unwrap();
        assert_eq!(opts.get("crf"), Some(&Some("18".to_string())));
        assert_eq!(opts.get("y"), Some(&None));
        assert_eq!(opts.get("an"), Some(&None));
    }

    #[test]
    fn options_parse_as_comma_separated_pairs_and_flags() {
        let opts = parse_options("crf=18, y, preset=slow").unwrap();
        assert_eq!(opts.get("crf"), Some(&Some("18".to_string())));
        assert_eq!(opts.get("y"), Some(&None));
        assert_eq!(opts.get("preset"), Some(&Some("slow".to_string())));
    }

    #[test]
    fn slate_parses_pairs_and_defaults_missing_fields() {
        let spec = SlateSpec::parse("artist=paco, task=comp").unwrap();
        assert_eq!(spec.artist, "paco");
        assert_eq!(spec.task, "comp");
        assert_eq!(spec.project, "Unnamed Project");
        assert_eq!(spec.version, "v001");
        assert_eq!(spec.fps, "24 FPS");
    }

    #[test]
    fn slate_parses_json() {
        let spec = SlateSpec::parse(r#"{"artist": "ada", "project": "mr"}"#).unwrap();
        assert_eq!(spec.artist, "ada");
        assert_eq!(spec.project, "mr");
        assert_eq!(spec.version, "v001");
    }

    #[test]
    fn request_lowercases_extension_and_reads_input_extension() {
        let req = MediaRequest::new(
            "/shots/sq01/plate.%03d.EXR",
            "/shots/sq01/daily.mov",
            Resolution { width: 1920, height: 1080 },
            "MOV",
        );
        assert_eq!(req.extension, "mov");
        assert_eq!(req.input_extension(), "exr");
    }
}
