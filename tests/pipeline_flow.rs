use std::path::PathBuf;

use dailies::{
    DailiesError, DailiesResult, EngineKind, FrameRange, MediaEngine, MediaRequest,
    MediaSynthesizer, Resolution, ScratchDir, SlateSpec,
    engine::SynthesisContext,
    nk::{self, GraphDocument},
};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "dailies_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn write_sequence(dir: &std::path::Path, stem: &str, frames: u32) {
    std::fs::create_dir_all(dir).unwrap();
    for i in 1..=frames {
        std::fs::write(dir.join(format!("{stem}.{i:03}.jpg")), b"frame").unwrap();
    }
}

type SeenCalls = std::sync::Arc<std::sync::Mutex<Vec<(Option<FrameRange>, bool)>>>;

/// Engine double that records what the orchestrator hands it.
struct RecordingEngine {
    seen: SeenCalls,
}

impl RecordingEngine {
    fn new() -> (SeenCalls, Self) {
        let seen: SeenCalls = Default::default();
        (seen.clone(), Self { seen })
    }
}

impl MediaEngine for RecordingEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Ffmpeg
    }

    fn supports_slate(&self) -> bool {
        false
    }

    fn create_media(
        &self,
        request: &MediaRequest,
        ctx: &SynthesisContext<'_>,
    ) -> DailiesResult<PathBuf> {
        self.seen
            .lock()
            .unwrap()
            .push((ctx.frame_range, ctx.slate_asset.is_some()));
        Ok(request.output_path.clone())
    }
}

#[test]
fn full_sequence_flow_detects_range_and_skips_unsupported_slate() {
    let tmp = temp_dir("flow_range");
    write_sequence(&tmp, "plate", 4);

    let scratch = ScratchDir::ensure_under(&tmp).unwrap();
    let (seen, engine) = RecordingEngine::new();
    let synth = MediaSynthesizer::with_engine(Box::new(engine), scratch);

    let request = MediaRequest::new(
        tmp.join("plate.%03d.jpg"),
        tmp.join("daily.mov"),
        Resolution { width: 1280, height: 720 },
        "mov",
    )
    .with_fps(24)
    // The engine double declines slates, so this must be skipped, not fatal.
    .with_slate(SlateSpec::parse("artist=ada, project=mr").unwrap());

    let out = synth.create(&request).unwrap();
    assert_eq!(out, tmp.join("daily.mov"));

    let calls = seen.lock().unwrap();
    assert_eq!(
        calls.as_slice(),
        &[(Some(FrameRange { first: 1, last: 4 }), false)]
    );
    drop(calls);

    std::fs::remove_dir_all(&tmp).unwrap();
}

#[test]
fn single_file_input_gets_no_frame_range() {
    let tmp = temp_dir("flow_single");
    std::fs::create_dir_all(&tmp).unwrap();
    std::fs::write(tmp.join("source.mov"), b"container").unwrap();

    let scratch = ScratchDir::ensure_under(&tmp).unwrap();
    let (seen, engine) = RecordingEngine::new();
    let synth = MediaSynthesizer::with_engine(Box::new(engine), scratch);

    let request = MediaRequest::new(
        tmp.join("source.mov"),
        tmp.join("frames.%03d.png"),
        Resolution { width: 1920, height: 1080 },
        "png",
    );
    synth.create(&request).unwrap();
    assert_eq!(seen.lock().unwrap().as_slice(), &[(None, false)]);

    std::fs::remove_dir_all(&tmp).unwrap();
}

#[test]
fn missing_sequence_start_is_reported_with_the_probe_path() {
    let tmp = temp_dir("flow_missing");
    std::fs::create_dir_all(&tmp).unwrap();
    // Frames start at 7; the detector probes from 1 and must not find it.
    std::fs::write(tmp.join("plate.007.jpg"), b"frame").unwrap();

    let scratch = ScratchDir::ensure_under(&tmp).unwrap();
    let (_seen, engine) = RecordingEngine::new();
    let synth = MediaSynthesizer::with_engine(Box::new(engine), scratch);

    let request = MediaRequest::new(
        tmp.join("plate.%03d.jpg"),
        tmp.join("daily.mov"),
        Resolution { width: 1920, height: 1080 },
        "mov",
    );
    let err = synth.create(&request).unwrap_err();
    assert!(matches!(err, DailiesError::InputNotFound { .. }));

    std::fs::remove_dir_all(&tmp).unwrap();
}

#[test]
fn graph_documents_round_trip_through_disk() {
    let tmp = temp_dir("flow_graph");
    std::fs::create_dir_all(&tmp).unwrap();

    let source = "\
Read {
 file /shots/plate.###.exr
 first 1
 last 24
 name Read1
}
Grade {
 white 1.2
 name Grade1
}
Write {
 file /out/daily.mov
 name Write1
}
";
    let template = tmp.join("template.nk");
    std::fs::write(&template, source).unwrap();

    let doc = GraphDocument::load(&template).unwrap();
    assert!(doc.node_by_name(nk::READ_NODE).is_some());
    assert!(doc.node_by_name("Grade1").is_some());
    assert!(doc.node_by_name(nk::WRITE_NODE).is_some());

    let rewritten = tmp.join("rewritten.nk");
    doc.write_to(&rewritten).unwrap();
    let reparsed = GraphDocument::parse(&std::fs::read_to_string(&rewritten).unwrap(), &rewritten)
        .unwrap();
    assert_eq!(
        reparsed.node_by_name("Grade1").unwrap().knob("white"),
        Some("1.2")
    );

    std::fs::remove_dir_all(&tmp).unwrap();
}
