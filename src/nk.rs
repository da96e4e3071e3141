use std::path::Path;

use anyhow::Context as _;

use crate::error::{DailiesError, DailiesResult};

/// Name of the source node expected in pre-authored templates.
pub const READ_NODE: &str = "Read1";
/// Name of the sink node expected in pre-authored templates.
pub const WRITE_NODE: &str = "Write1";

/// One node in a graph script: a class and an ordered knob list. Upstream
/// wiring travels as an ordinary `input` knob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
    pub class: String,
    pub knobs: Vec<(String, String)>,
}

impl GraphNode {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            knobs: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.knob("name")
    }

    pub fn knob(&self, key: &str) -> Option<&str> {
        self.knobs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key`, replacing an existing value so rebinding a template knob
    /// does not leave the stale entry behind.
    pub fn set_knob(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.knobs.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.knobs.push((key, value));
        }
    }
}

/// A linear graph script in the node-block text form Nuke consumes:
///
/// ```text
/// Read {
///  name Read1
///  file plate.###.exr
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
}

impl GraphDocument {
    pub fn push(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    pub fn node_by_name(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name() == Some(name))
    }

    pub fn node_by_name_mut(&mut self, name: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.name() == Some(name))
    }

    /// Serializes the document back to node-block text.
    pub fn to_script(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            out.push_str(&node.class);
            out.push_str(" {\n");
            for (key, value) in &node.knobs {
                out.push(' ');
                out.push_str(key);
                if !value.is_empty() {
                    out.push(' ');
                    out.push_str(value);
                }
                out.push('\n');
            }
            out.push_str("}\n");
        }
        out
    }

    pub fn write_to(&self, path: &Path) -> DailiesResult<()> {
        std::fs::write(path, self.to_script())
            .with_context(|| format!("failed to write graph script '{}'", path.display()))?;
        Ok(())
    }

    /// Parses node-block text. Lines outside any block (version headers,
    /// comments) are skipped; a malformed block is an error.
    pub fn parse(source: &str, origin: &Path) -> DailiesResult<Self> {
        let invalid = |reason: String| DailiesError::TemplateInvalid {
            path: origin.to_path_buf(),
            reason,
        };

        let mut doc = GraphDocument::default();
        let mut current: Option<GraphNode> = None;

        for (lineno, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(class) = line.strip_suffix('{') {
                if current.is_some() {
                    return Err(invalid(format!("nested node block at line {}", lineno + 1)));
                }
                let class = class.trim();
                if class.is_empty() {
                    return Err(invalid(format!("node block with no class at line {}", lineno + 1)));
                }
                current = Some(GraphNode::new(class));
            } else if line == "}" {
                let node = current
                    .take()
                    .ok_or_else(|| invalid(format!("unmatched '}}' at line {}", lineno + 1)))?;
                doc.push(node);
            } else if let Some(node) = current.as_mut() {
                match line.split_once(char::is_whitespace) {
                    Some((key, value)) => node.set_knob(key, value.trim()),
                    None => node.set_knob(line, ""),
                }
            }
            // Lines between blocks (e.g. `version 14.0 v5`) are ignored.
        }

        if current.is_some() {
            return Err(invalid("unterminated node block at end of file".to_string()));
        }
        if doc.nodes.is_empty() {
            return Err(invalid("no node blocks found".to_string()));
        }
        Ok(doc)
    }

    pub fn load(path: &Path) -> DailiesResult<Self> {
        if path.extension().and_then(|e| e.to_str()) != Some("nk") {
            return Err(DailiesError::TemplateInvalid {
                path: path.to_path_buf(),
                reason: "not a .nk graph script".to_string(),
            });
        }
        let source = std::fs::read_to_string(path).map_err(|e| DailiesError::TemplateInvalid {
            path: path.to_path_buf(),
            reason: format!("unreadable: {e}"),
        })?;
        Self::parse(&source, path)
    }
}

/// Evaluates a graph script over an exact frame range by running Nuke in
/// terminal mode. Blocks until the render exits; stderr is attached verbatim
/// to the failure for diagnostics.
pub fn evaluate(script: &Path, range: crate::frames::FrameRange) -> DailiesResult<()> {
    let mut cmd = std::process::Command::new("nuke");
    cmd.arg("-x").arg("-F").arg(range.to_string()).arg(script);

    let rendered = crate::engine::command_line(&cmd);
    tracing::info!("evaluating graph: {rendered}");

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
    Ok(())
}

/// Whether the Nuke binary is runnable in this environment.
pub fn is_nuke_on_path() -> bool {
    std::process::Command::new("nuke")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
