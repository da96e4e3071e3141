#![forbid(unsafe_code)]

pub mod engine;
pub mod engine_ffmpeg;
pub mod engine_nuke;
pub mod engine_nuke_template;
pub mod environment;
pub mod error;
pub mod frames;
pub mod nk;
pub mod request;
pub mod scratch;
pub mod slate;
pub mod synth;
pub mod tables;
pub mod tracking;
pub mod tracking_flow;
pub mod tracking_ftrack;
pub mod tracking_kitsu;
pub mod tracking_shotgun;

pub use engine::{EngineKind, MediaEngine, SynthesisContext, create_engine};
pub use environment::{Environment, IdentitySeed};
pub use error::{DailiesError, DailiesResult};
pub use frames::FrameRange;
pub use request::{MediaRequest, Resolution, SlateSpec};
pub use scratch::ScratchDir;
pub use synth::MediaSynthesizer;
pub use tracking::{
    EntityType, RecordId, TrackingBackend, TrackingConfig, TrackingKind, VersionContext,
    create_tracking,
};
