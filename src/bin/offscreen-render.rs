use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use offscreen_render::{
    CancelToken, FfmpegSink, FilterBackend, FrameFormat, FrameIndex, PngSequenceSink, RenderConfig,
    RenderRequest, RenderSession,
};

#[derive(Parser, Debug)]
#[command(name = "offscreen-render", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the whole timeline to MP4 (requires `ffmpeg`) or a PNG sequence.
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Parse and validate a request, then print its frame count.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Renderer configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output MP4 path, overriding the request's destination.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write `frame_NNNNNN.png` files into this directory instead of an MP4.
    #[arg(long, conflicts_with = "out")]
    png_dir: Option<PathBuf>,

    /// Filter backend, overriding the configuration.
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Renderer configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Filter backend, overriding the configuration.
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Auto,
    Gpu,
    Cpu,
}

impl From<BackendChoice> for FilterBackend {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Auto => Self::Auto,
            BackendChoice::Gpu => Self::Gpu,
            BackendChoice::Cpu => Self::Cpu,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn read_request(path: &Path) -> anyhow::Result<RenderRequest> {
    let request = RenderRequest::from_path(path)
        .with_context(|| format!("read render request '{}'", path.display()))?;
    request
        .validate()
        .with_context(|| format!("validate render request '{}'", path.display()))?;
    Ok(request)
}

/// Config file plus environment; relative asset paths default to the request's directory.
fn load_config(
    config: Option<&Path>,
    request_path: &Path,
    backend: Option<BackendChoice>,
) -> anyhow::Result<RenderConfig> {
    let mut cfg = RenderConfig::load(config).context("load renderer configuration")?;
    if cfg.assets_root.is_none() {
        cfg.assets_root = request_path.parent().map(Path::to_path_buf);
    }
    if let Some(choice) = backend {
        cfg.filter_backend = choice.into();
    }
    offscreen_render::logging::init(&cfg.logging);
    Ok(cfg)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut request = read_request(&args.in_path)?;
    let mut config = load_config(args.config.as_deref(), &args.in_path, args.backend)?;
    if let Some(out) = &args.out {
        request.options.video_destination = Some(out.clone());
    }

    config.frame_format = FrameFormat::Png;

    let cancel = CancelToken::new();
    if let Some(dir) = args.png_dir {
        let mut sink = PngSequenceSink::new(&dir);
        let mut session = RenderSession::new(request, config)?;
        session.run(&mut sink, &cancel)?;
        eprintln!("wrote {} frames to {}", sink.written().len(), dir.display());
        return Ok(());
    }

    let mut sink = FfmpegSink::from_request(&request, &config)?;
    let dest = sink.settings().destination.clone();
    let mut session = RenderSession::new(request, config)?;
    session.run(&mut sink, &cancel)?;
    eprintln!("wrote {}", dest.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let request = read_request(&args.in_path)?;
    let config = load_config(args.config.as_deref(), &args.in_path, args.backend)?;
    let mut session = RenderSession::new(request, config)?;
    let frame = session.render_frame(FrameIndex(args.frame))?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let request = read_request(&args.in_path)?;
    println!("{} frames", request.total_frames());
    Ok(())
}
