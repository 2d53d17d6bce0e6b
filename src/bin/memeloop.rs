use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use memeloop::{
    AnimationFormat, ArtifactPaths, CompositionOutput, CompositionPipeline, CompositionRequest,
    CpuSurface, Language, MemeConfig, Rgba8, TemplateCaption, TextPosition, TopicLedger,
    TopicSelector, TrendingRun, WindowedLedger,
    layout::engine::{LayoutRequest, MonospaceMeasure, TextMeasure, compute_layout},
    topics::{
        ledger::{Clock, SystemClock},
        selector::FileTopicSource,
        store::JsonFileStore,
    },
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "memeloop", version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Caption an image: writes a still PNG and a fading animation.
    Compose(ComposeArgs),
    /// Pick a fresh trending topic, caption it, compose, and record the topic.
    Trending(TrendingArgs),
    /// Print the resolved caption layout as JSON without rendering.
    Layout(LayoutArgs),
    /// Inspect or update the used-topic ledger.
    Ledger(LedgerArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// JSON config file; `MEMELOOP_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// TrueType/OpenType font used to measure and draw captions.
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Output directory for artifacts.
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct StyleArgs {
    #[arg(long, default_value_t = TextPosition::Top)]
    position: TextPosition,

    /// Caption fill color: a name (white, black, red, ...) or #RRGGBB[AA].
    #[arg(long)]
    color: Option<Rgba8>,

    /// Largest font size the layout may use.
    #[arg(long)]
    font_size: Option<u32>,

    #[arg(long)]
    max_width: Option<u32>,

    #[arg(long)]
    frames: Option<u32>,

    /// Delay between animation frames in milliseconds.
    #[arg(long)]
    delay_ms: Option<u32>,

    #[arg(long)]
    format: Option<AnimationFormat>,

    /// Keep the caption's case instead of upper-casing it.
    #[arg(long)]
    keep_case: bool,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Base image; stretched to the canvas.
    #[arg(long)]
    image: PathBuf,

    #[arg(long)]
    caption: String,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Parser, Debug)]
struct TrendingArgs {
    #[arg(long)]
    image: PathBuf,

    /// Candidate topics: a JSON array of strings or one topic per line.
    #[arg(long)]
    topics: PathBuf,

    /// Two-letter language code for the caption.
    #[arg(long, default_value = "en")]
    language: String,

    /// Caption template; `{topic}` and `{language}` are substituted.
    #[arg(long)]
    template: Option<String>,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    #[arg(long)]
    caption: String,

    #[arg(long, default_value_t = TextPosition::Top)]
    position: TextPosition,

    #[arg(long)]
    font_size: Option<u32>,

    #[arg(long)]
    max_width: Option<u32>,
}

#[derive(Parser, Debug)]
struct LedgerArgs {
    #[command(subcommand)]
    action: LedgerAction,
}

#[derive(Subcommand, Debug)]
enum LedgerAction {
    /// Print the topics used in the current window.
    Show,
    /// Exit non-zero if the topic is already used.
    Check { topic: String },
    /// Record a topic as used.
    Mark { topic: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.common)?;
    match cli.cmd {
        Command::Compose(args) => cmd_compose(cfg, args),
        Command::Trending(args) => cmd_trending(cfg, args),
        Command::Layout(args) => cmd_layout(cfg, args),
        Command::Ledger(args) => cmd_ledger(cfg, args),
    }
}

fn load_config(common: &CommonArgs) -> anyhow::Result<MemeConfig> {
    let mut cfg = MemeConfig::load(common.config.as_deref())?;
    if let Some(font) = &common.font {
        cfg.font_path = Some(font.clone());
    }
    if let Some(out_dir) = &common.out_dir {
        cfg.out_dir = out_dir.clone();
    }
    Ok(cfg)
}

fn apply_style(cfg: &mut MemeConfig, style: &StyleArgs) {
    if let Some(color) = style.color {
        cfg.text.fill = color;
    }
    if let Some(size) = style.font_size {
        set_font_size(cfg, size);
    }
    if let Some(width) = style.max_width {
        cfg.text.max_width = width;
    }
    if let Some(frames) = style.frames {
        cfg.animation.frame_count = frames;
    }
    if let Some(delay) = style.delay_ms {
        cfg.animation.frame_delay_ms = delay;
    }
    if let Some(format) = style.format {
        cfg.animation.format = format;
    }
    if style.keep_case {
        cfg.uppercase = false;
    }
}

/// A requested size caps the search and lowers the floor with it.
fn set_font_size(cfg: &mut MemeConfig, size: u32) {
    cfg.text.max_font_size = size;
    cfg.text.min_font_size = cfg.text.min_font_size.min(size);
}

fn make_surface(cfg: &MemeConfig) -> anyhow::Result<CpuSurface> {
    let font = cfg
        .font_path
        .as_deref()
        .context("no caption font configured (use --font or MEMELOOP_FONT_PATH)")?;
    Ok(CpuSurface::with_font_file(cfg.canvas, font)?)
}

fn artifact_paths(cfg: &MemeConfig) -> ArtifactPaths {
    ArtifactPaths::timestamped(&cfg.out_dir, cfg.animation.format, SystemClock.now_ms())
}

fn report(out: &CompositionOutput) {
    eprintln!("wrote {}", out.still.display());
    match &out.animation {
        Ok(summary) => eprintln!("wrote {} ({} frames)", summary.path.display(), summary.frames),
        Err(err) => eprintln!("animation failed: {err}"),
    }
}

fn cmd_compose(mut cfg: MemeConfig, args: ComposeArgs) -> anyhow::Result<()> {
    apply_style(&mut cfg, &args.style);
    let mut surface = make_surface(&cfg)?;
    let paths = artifact_paths(&cfg);

    let mut req = CompositionRequest::from_config(&cfg, &args.image, args.caption);
    req.position = args.style.position;

    let mut pipeline = CompositionPipeline::new(cfg)?;
    let out = pipeline.compose(&mut surface, &req, &paths)?;
    report(&out);
    Ok(())
}

fn cmd_trending(mut cfg: MemeConfig, args: TrendingArgs) -> anyhow::Result<()> {
    apply_style(&mut cfg, &args.style);
    let mut surface = make_surface(&cfg)?;
    let paths = artifact_paths(&cfg);

    let mut base = CompositionRequest::from_config(&cfg, &args.image, "");
    base.position = args.style.position;

    let mut selector = TopicSelector::from_config(&cfg.topics);
    let mut topics = FileTopicSource::new(&args.topics);
    let mut ledger = WindowedLedger::new(
        JsonFileStore::new(&cfg.topics.ledger_path),
        cfg.topics.window_ms(),
    );
    let mut captions = args
        .template
        .map(TemplateCaption::new)
        .unwrap_or_default();

    let mut pipeline = CompositionPipeline::new(cfg)?;
    let out = TrendingRun {
        selector: &mut selector,
        topics: &mut topics,
        ledger: &mut ledger,
        captions: &mut captions,
        language: Language::from_code(&args.language),
    }
    .run(&mut pipeline, &mut surface, &base, &paths)?;

    eprintln!("topic: {} ({:?})", out.choice.topic, out.choice.origin);
    eprintln!("caption: {}", out.caption);
    report(&out.composition);
    if out.recorded {
        eprintln!("topic recorded");
    }
    Ok(())
}

fn cmd_layout(mut cfg: MemeConfig, args: LayoutArgs) -> anyhow::Result<()> {
    if let Some(size) = args.font_size {
        set_font_size(&mut cfg, size);
    }
    if let Some(width) = args.max_width {
        cfg.text.max_width = width;
    }
    let pipeline = CompositionPipeline::new(cfg.clone())?;
    let text = pipeline.render_text(&args.caption);
    let mut measure: Box<dyn TextMeasure> = match cfg.font_path.as_deref() {
        Some(font) => Box::new(CpuSurface::with_font_file(cfg.canvas, font)?),
        None => Box::new(MonospaceMeasure::default()),
    };

    let layout = compute_layout(
        measure.as_mut(),
        &LayoutRequest {
            text: &text,
            max_width: cfg.text.max_width,
            max_font_size: cfg.text.max_font_size,
            min_font_size: cfg.text.min_font_size,
            canvas_height: cfg.canvas.height,
            position: args.position,
        },
        &cfg.layout,
    )?;
    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

fn cmd_ledger(cfg: MemeConfig, args: LedgerArgs) -> anyhow::Result<()> {
    let path = cfg.topics.ledger_path.clone();
    let mut ledger = WindowedLedger::new(JsonFileStore::new(&path), cfg.topics.window_ms());

    match args.action {
        LedgerAction::Show => {
            let record = ledger.current()?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        LedgerAction::Check { topic } => {
            if ledger.is_used(&topic)? {
                anyhow::bail!("'{topic}' was used in the current window");
            }
            eprintln!("'{topic}' is available");
        }
        LedgerAction::Mark { topic } => {
            ledger.mark_used(&topic)?;
            eprintln!("recorded '{topic}' in {}", path.display());
        }
    }
    Ok(())
}
