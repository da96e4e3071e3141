use std::path::PathBuf;

use clap::Parser;

use dailies::{
    EngineKind, EntityType, Environment, IdentitySeed, MediaRequest, MediaSynthesizer, Resolution,
    SlateSpec, TrackingConfig, TrackingKind,
    request::parse_options,
    tracking::{RecordId, create_tracking},
};

#[derive(Parser, Debug)]
#[command(name = "dailies", version, about = "Synthesize review media and register it with a production-tracking service.")]
struct Cli {
    /// Synthesis engine: ffmpeg, nuke or nuke-template.
    #[arg(short, long, default_value = "ffmpeg")]
    engine: String,

    /// Input file or frame-sequence pattern (%03d or ### placeholder).
    #[arg(short, long)]
    input_path: PathBuf,

    /// Output artifact path.
    #[arg(short, long)]
    output_path: PathBuf,

    /// Output container/format extension.
    #[arg(short = 'x', long, default_value = "mov")]
    extension: String,

    /// Output resolution as WIDTHxHEIGHT.
    #[arg(short, long, default_value = "1920x1080")]
    resolution: Resolution,

    /// Output frame rate.
    #[arg(short, long, default_value_t = 30)]
    fps: u32,

    /// Extra engine options: JSON object or comma-separated key=value pairs.
    #[arg(long)]
    options: Option<String>,

    /// Slate fields: JSON object or comma-separated key=value pairs.
    /// Omit to skip the slate frame entirely.
    #[arg(long)]
    slate_data: Option<String>,

    /// Pre-authored graph script, required by the nuke-template engine.
    #[arg(long)]
    template_path: Option<PathBuf>,

    /// Tracking service: shotgun, ftrack, kitsu or flow.
    #[arg(short, long, default_value = "shotgun")]
    tracking: String,

    /// Skip tracking registration after synthesis.
    #[arg(long)]
    no_tracking: bool,

    /// Version name registered with the tracking service.
    #[arg(long)]
    version_name: Option<String>,

    /// Comment attached to the registered version.
    #[arg(long, default_value = "")]
    comment: String,

    /// Project name (falls back to $PROJECT).
    #[arg(long)]
    project_name: Option<String>,

    /// Explicit project record ID, skipping the name lookup.
    #[arg(long)]
    project_id: Option<String>,

    /// Entity (shot/sequence/asset) name (falls back to $ENTITY_NAME).
    #[arg(long)]
    entity_name: Option<String>,

    /// Explicit entity record ID.
    #[arg(long)]
    entity_id: Option<String>,

    /// Entity kind: shot, sequence or asset (falls back to $ENTITY_TYPE).
    #[arg(long)]
    entity_type: Option<String>,

    /// Task name (falls back to $TASK).
    #[arg(long)]
    task_name: Option<String>,

    /// Explicit task record ID.
    #[arg(long)]
    task_id: Option<String>,

    /// Artist name (falls back to $ARTIST_NAME).
    #[arg(long)]
    artist_name: Option<String>,

    /// Explicit artist record ID.
    #[arg(long)]
    artist_id: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let request = build_request(&cli)?;

    let engine_kind: EngineKind = cli.engine.parse()?;
    let synthesizer = MediaSynthesizer::new(engine_kind)?;
    let artifact = synthesizer.create(&request)?;
    tracing::info!("created {}", artifact.display());

    if cli.no_tracking {
        return Ok(());
    }

    let tracking_kind: TrackingKind = cli.tracking.parse()?;
    let backend = create_tracking(tracking_kind, TrackingConfig::from_env(tracking_kind));
    let seed = IdentitySeed::from_env()?.overridden_by(seed_from_cli(&cli)?);
    let mut env = Environment::new(backend, seed);
    env.log_configuration();

    let version_name = cli.version_name.clone().unwrap_or_else(|| {
        artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string())
    });
    let ctx = env.version_context(version_name, &artifact, cli.comment.clone());
    env.insert_version(&ctx)?;
    tracing::info!("registered version '{}' with {tracking_kind}", ctx.version_name);

    Ok(())
}

fn build_request(cli: &Cli) -> anyhow::Result<MediaRequest> {
    let mut request = MediaRequest::new(
        &cli.input_path,
        &cli.output_path,
        cli.resolution,
        &cli.extension,
    )
    .with_fps(cli.fps);

    if let Some(raw) = &cli.options {
        request = request.with_options(parse_options(raw)?);
    }
    if let Some(raw) = &cli.slate_data {
        request = request.with_slate(SlateSpec::parse(raw)?);
    }
    if let Some(template) = &cli.template_path {
        request = request.with_template(template);
    }
    Ok(request)
}

fn seed_from_cli(cli: &Cli) -> anyhow::Result<IdentitySeed> {
    let entity_type = match &cli.entity_type {
        Some(raw) => Some(raw.parse::<EntityType>()?),
        None => None,
    };
    Ok(IdentitySeed {
        project_name: cli.project_name.clone(),
        entity_name: cli.entity_name.clone(),
        entity_type,
        task_name: cli.task_name.clone(),
        artist_name: cli.artist_name.clone(),
        project_id: cli.project_id.clone().map(RecordId),
        entity_id: cli.entity_id.clone().map(RecordId),
        task_id: cli.task_id.clone().map(RecordId),
        artist_id: cli.artist_id.clone().map(RecordId),
    })
}
