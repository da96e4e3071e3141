use std::path::{Path, PathBuf};

use crate::error::{DailiesError, DailiesResult};

/// printf-style frame placeholder used in sequence patterns.
pub const FRAME_TOKEN: &str = "%03d";
/// Hash-style placeholder used by node-graph scripts for the same padding.
pub const GRAPH_FRAME_TOKEN: &str = "###";
/// Zero-padding width implied by both tokens.
pub const FRAME_PAD_WIDTH: usize = 3;
/// First frame number probed by sequence detection.
pub const FRAME_START_NUMBER: u32 = 1;
/// Detection gives up past this frame index.
const FRAME_SCAN_CEILING: u32 = 1000;

/// Inclusive span of a contiguous frame sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRange {
    pub first: u32,
    pub last: u32,
}

impl FrameRange {
    pub fn new(first: u32, last: u32) -> DailiesResult<Self> {
        if first > last {
            return Err(DailiesError::validation(format!(
                "invalid frame range: first ({first}) > last ({last})"
            )));
        }
        Ok(Self { first, last })
    }

    pub fn frame_count(&self) -> u32 {
        self.last - self.first + 1
    }
}

impl std::fmt::Display for FrameRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// True when the pattern contains a frame placeholder in either convention.
pub fn is_sequence_pattern(pattern: &Path) -> bool {
    let s = pattern.to_string_lossy();
    s.contains(FRAME_TOKEN) || s.contains(GRAPH_FRAME_TOKEN)
}

/// Substitutes the frame placeholder with a zero-padded frame number.
pub fn substitute_frame(pattern: &Path, frame: u32) -> PathBuf {
    let s = pattern.to_string_lossy();
    let padded = format!("{frame:0width$}", width = FRAME_PAD_WIDTH);
    PathBuf::from(
        s.replace(FRAME_TOKEN, &padded)
            .replace(GRAPH_FRAME_TOKEN, &padded),
    )
}

/// Rewrites a printf-style pattern into the node-graph `###` convention.
pub fn to_graph_pattern(pattern: &Path) -> PathBuf {
    PathBuf::from(
        pattern
            .to_string_lossy()
            .replace(FRAME_TOKEN, GRAPH_FRAME_TOKEN),
    )
}

/// Detects the frame span of a sequence by probing the filesystem.
///
/// Probes upward from frame 1 using the zero-padded naming convention. The
/// first frame found on disk opens the range; the first missing frame after
/// it closes the range. The scan is deliberately greedy and single-run: it
/// does not merge disjoint runs and does not look below frame 1. Sequences
/// with gaps therefore detect as the leading run only. This is a known
/// limitation kept for compatibility with existing render output layouts.
pub fn detect_range(pattern: &Path) -> DailiesResult<FrameRange> {
    detect_range_with(pattern, |p| p.exists())
}

fn detect_range_with(pattern: &Path, exists: impl Fn(&Path) -> bool) -> DailiesResult<FrameRange> {
    let mut first: Option<u32> = None;

    for frame in FRAME_START_NUMBER..FRAME_SCAN_CEILING {
        let candidate = substitute_frame(pattern, frame);
        if exists(&candidate) {
            if first.is_none() {
                first = Some(frame);
            }
        } else if let Some(first) = first {
            return FrameRange::new(first, frame - 1);
        }
    }

    match first {
        // The sequence runs into the scan ceiling.
        Some(first) => FrameRange::new(first, FRAME_SCAN_CEILING - 1),
        None => Err(DailiesError::SequenceNotFound {
            pattern: pattern.to_string_lossy().into_owned(),
        }),
    }
}
