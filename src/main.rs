mod app;

use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use clap::{ArgGroup, Parser};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use citegraph::dataset::DataSource;
use citegraph::view::FileStore;

#[derive(Debug, Parser)]
#[command(author, version, about = "Explore a document library as a citation graph")]
#[command(group(ArgGroup::new("source").args(["url", "file", "inline"])))]
struct Args {
    /// Dataset endpoint returning the graph JSON
    #[arg(long, env = "CITEGRAPH_URL")]
    url: Option<String>,

    /// Dataset JSON file
    #[arg(long, env = "CITEGRAPH_FILE")]
    file: Option<PathBuf>,

    /// Dataset JSON passed directly
    #[arg(long, env = "CITEGRAPH_INLINE")]
    inline: Option<String>,

    /// Where preferences and saved layouts live
    #[arg(long, env = "CITEGRAPH_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    fn source(&self) -> Result<DataSource> {
        if let Some(url) = &self.url {
            return Ok(DataSource::Url(url.clone()));
        }
        if let Some(path) = &self.file {
            return Ok(DataSource::File(path.clone()));
        }
        if let Some(text) = &self.inline {
            return Ok(DataSource::Inline(text.clone()));
        }
        bail!("no dataset given; pass --url, --file or --inline")
    }
}

fn init_tracing(args: &Args) {
    let level = if args.quiet {
        Level::ERROR
    } else if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let source = args.source()?;
    let state_dir = args.state_dir.clone().unwrap_or_else(FileStore::default_dir);
    tracing::info!(source = %source.describe(), state_dir = %state_dir.display(), "starting");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "citegraph",
        options,
        Box::new(move |cc| Ok(Box::new(app::GraphApp::new(cc, source, state_dir)))),
    )
    .map_err(|error| anyhow!("failed to run the graph window: {error}"))
}
