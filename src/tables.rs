//! Static capability and codec tables consumed by the engines.
//!
//! These are configuration data, not derived values: each engine advertises
//! the extensions it can write, and the ffmpeg engine maps a target extension
//! to a `(codec, pixel format)` pair. The tables mirror what the studio
//! deploy ships and are looked up, never computed.

use crate::engine::EngineKind;

pub const FFMPEG_EXTENSIONS: &[&str] = &[
    "dpx", "exr", "gif", "hdr", "jpg", "jpeg", "mov", "mp4", "mxf", "png", "sgi", "targa", "tiff",
    "xpm", "yuv",
];

pub const NUKE_EXTENSIONS: &[&str] = &[
    "cin", "dpx", "exr", "gif", "hdr", "jpeg", "mov", "mxf", "pic", "png", "sgi", "targa", "tiff",
    "xpm", "yuv",
];

/// Extensions that denote a still-image sequence rather than a container.
pub const IMAGE_SEQUENCE_EXTENSIONS: &[&str] = &[
    "dpx", "exr", "gif", "hdr", "jpg", "jpeg", "png", "sgi", "targa", "tiff", "xpm", "yuv",
];

/// Extensions that denote a video container.
pub const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "mxf", "jpeg2000"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecSpec {
    pub codec: &'static str,
    pub pix_fmt: &'static str,
}

const FFMPEG_CODECS: &[(&str, CodecSpec)] = &[
    ("cin", CodecSpec { codec: "cin", pix_fmt: "rawvideo" }),
    ("dpx", CodecSpec { codec: "dpx", pix_fmt: "rawvideo" }),
    ("exr", CodecSpec { codec: "exr", pix_fmt: "rawvideo" }),
    ("gif", CodecSpec { codec: "gif", pix_fmt: "gif" }),
    ("hdr", CodecSpec { codec: "hdr", pix_fmt: "rawvideo" }),
    ("jpg", CodecSpec { codec: "mjpeg", pix_fmt: "mjpeg" }),
    ("jpeg", CodecSpec { codec: "mjpeg", pix_fmt: "mjpeg" }),
    ("jpeg2000", CodecSpec { codec: "jpeg2000", pix_fmt: "jpeg2000" }),
    ("mov", CodecSpec { codec: "libx264", pix_fmt: "yuv420p" }),
    ("mp4", CodecSpec { codec: "libx264", pix_fmt: "yuv420p" }),
    ("mxf", CodecSpec { codec: "dnxhd", pix_fmt: "yuv422p" }),
    ("png", CodecSpec { codec: "png", pix_fmt: "png" }),
    ("sgi", CodecSpec { codec: "sgi", pix_fmt: "rawvideo" }),
    ("targa", CodecSpec { codec: "tga", pix_fmt: "rawvideo" }),
    ("tiff", CodecSpec { codec: "tiff", pix_fmt: "tiff" }),
    ("xpm", CodecSpec { codec: "xpm", pix_fmt: "rawvideo" }),
    ("yuv", CodecSpec { codec: "yuv", pix_fmt: "rawvideo" }),
];

pub fn supported_extensions(kind: EngineKind) -> &'static [&'static str] {
    match kind {
        EngineKind::Ffmpeg => FFMPEG_EXTENSIONS,
        EngineKind::Nuke | EngineKind::NukeTemplate => NUKE_EXTENSIONS,
    }
}

pub fn is_supported(kind: EngineKind, extension: &str) -> bool {
    supported_extensions(kind).contains(&extension)
}

pub fn is_image_sequence_extension(extension: &str) -> bool {
    IMAGE_SEQUENCE_EXTENSIONS.contains(&extension)
}

pub fn is_video_extension(extension: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&extension)
}

/// Codec/pixel-format negotiation for the ffmpeg engine.
pub fn ffmpeg_codec(extension: &str) -> Option<CodecSpec> {
    FFMPEG_CODECS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, spec)| *spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ffmpeg_extension_has_a_codec() {
        for ext in FFMPEG_EXTENSIONS {
            assert!(ffmpeg_codec(ext).is_some(), "missing codec for {ext}");
        }
    }

    #[test]
    fn mov_negotiates_h264_yuv420p() {
        let spec = ffmpeg_codec("mov").unwrap();
        assert_eq!(spec.codec, "libx264");
        assert_eq!(spec.pix_fmt, "yuv420p");
    }

    #[test]
    fn capability_tables_are_engine_specific() {
        assert!(is_supported(EngineKind::Ffmpeg, "mp4"));
        assert!(!is_supported(EngineKind::Nuke, "mp4"));
        assert!(is_supported(EngineKind::Nuke, "cin"));
        assert!(!is_supported(EngineKind::Ffmpeg, "cin"));
    }

    #[test]
    fn sequence_and_video_classes_are_disjoint() {
        for ext in IMAGE_SEQUENCE_EXTENSIONS {
            assert!(!is_video_extension(ext));
        }
    }
}
