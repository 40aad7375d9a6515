use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use gridplace_cli::{HeadlessCanvas, JsonFileStore, JsonLinesSink};
use gridplace_core::{
    Collaborators, HttpImageFetcher, PlacementConfig, PlacementOutcome,
    PlacementPipeline,
};
use gridplace_model::{InboundMessage, PlaceImagesRequest, Point};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "gridplace",
    version,
    about = "Fetch remote images and lay them out in a packed grid"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Place a batch of images on a headless canvas
    Place(PlaceArgs),
    /// Report whether the allow-list accepts a URL
    CheckUrl {
        url: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct PlaceArgs {
    /// TOML file with placement settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON `place-images` message to run
    #[arg(long, conflicts_with = "urls")]
    request: Option<PathBuf>,
    /// Image URL to place; repeat for more
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,
    /// Shrink images to fit within the size cap
    #[arg(long)]
    scaled: bool,
    /// Size cap for --scaled (defaults to the configured one)
    #[arg(long, requires = "scaled")]
    max_size: Option<NonZeroU32>,
    /// JSON file holding the size cache between runs
    #[arg(long)]
    store: Option<PathBuf>,
    /// Viewport center the grid is centered on, as X,Y
    #[arg(
        long,
        value_parser = parse_center,
        default_value = "0,0",
        allow_hyphen_values = true
    )]
    center: Point,
}

fn parse_center(raw: &str) -> Result<Point, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {raw:?}"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| format!("{part:?} is not a finite number"))
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}

fn load_config(path: Option<&Path>) -> Result<PlacementConfig> {
    match path {
        Some(path) => PlacementConfig::load(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(PlacementConfig::default()),
    }
}

fn read_request(args: &PlaceArgs) -> Result<PlaceImagesRequest> {
    let mut request = match &args.request {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| {
                format!("failed to read request {}", path.display())
            })?;
            let InboundMessage::PlaceImages(request) =
                serde_json::from_str(&raw).with_context(|| {
                    format!("{} is not a place-images message", path.display())
                })?;
            request
        }
        None => PlaceImagesRequest::new(args.urls.iter().cloned()),
    };
    if args.scaled {
        let max_size = args.max_size.or(request.max_size);
        request = request.scaled(max_size);
    }
    Ok(request)
}

async fn place(args: PlaceArgs) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let request = read_request(&args)?;

    let store = match &args.store {
        Some(path) => JsonFileStore::open(path)?,
        None => JsonFileStore::in_memory(),
    };
    let fetcher =
        HttpImageFetcher::new(config.retry_policy(), &config.user_agent)?;
    let canvas = Arc::new(HeadlessCanvas::new(args.center));
    let sink = Arc::new(JsonLinesSink::stdout());

    let pipeline = PlacementPipeline::new(
        &config,
        Collaborators {
            canvas: canvas.clone(),
            source: Arc::new(fetcher),
            store: Arc::new(store),
            events: sink.clone(),
        },
    )?;

    let outcome = pipeline.handle_request(request).await;
    pipeline.size_cache().flush().await;

    let Some(outcome) = outcome else {
        return Ok(ExitCode::from(1));
    };
    sink.write_line(&canvas.scene())
        .context("failed to write scene")?;

    let dropped = pipeline.size_cache().dropped_writes();
    info!(
        "[cli] Placed {} images, {} failed, {} cache writes dropped",
        outcome.placed_count(),
        outcome.failures().len(),
        dropped
    );

    Ok(match outcome {
        PlacementOutcome::Committed { .. } => ExitCode::SUCCESS,
        PlacementOutcome::Empty { .. } => ExitCode::from(2),
    })
}

fn check_url(url: &str, config: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config)?;
    let allow_list = config.allow_list();
    match allow_list.accept(url) {
        Some(accepted) => {
            println!("accepted: {accepted}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!(
                "rejected: {} (must start with {:?} and contain {:?})",
                url,
                allow_list.scheme_prefix(),
                allow_list.host_fragment()
            );
            Ok(ExitCode::from(1))
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout carries the JSON event stream.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Place(args) => {
            if args.request.is_none() && args.urls.is_empty() {
                bail!("pass --request FILE or at least one --url");
            }
            place(args).await
        }
        Command::CheckUrl { url, config } => check_url(&url, config.as_deref()),
    }
}
