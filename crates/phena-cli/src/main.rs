//! phena - validate p5.js sketches and render sandboxed preview pages

mod config;
mod file_host;
mod watcher;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use config::Config;
use file_host::FileHost;
use phena_preview::{
    DocumentBuilder, Nonce, PreviewController, RunOutcome, csp, validate_sketch,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use watcher::{SketchWatcher, WatchEvent};

#[derive(Parser)]
#[command(name = "phena")]
#[command(about = "Live previews for p5.js sketches", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to {config_dir}/phena/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a sketch for syntax errors
    Check {
        /// Sketch file
        sketch: PathBuf,
    },

    /// Render a sketch into a preview page
    Render {
        /// Sketch file
        sketch: PathBuf,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Re-render a sketch every time it is saved
    Watch {
        /// Sketch file
        sketch: PathBuf,

        #[command(flatten)]
        page: PageArgs,

        /// Debounce window in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
    },

    /// Print a content-security policy with a fresh nonce
    Csp {
        /// Origin of the page's own resources
        #[arg(long)]
        source: Option<String>,
    },

    /// Write the current configuration to the config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args)]
struct PageArgs {
    /// Output page
    #[arg(short, long, default_value = "preview.html")]
    output: PathBuf,

    /// Template file to use instead of the built-in page
    #[arg(long)]
    template: Option<PathBuf>,

    /// Initial rotation speed in degrees per second
    #[arg(long)]
    rotation_speed: Option<f64>,

    /// Initial refresh rate in frames per second
    #[arg(long)]
    refresh_rate: Option<f64>,
}

impl PageArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(template) = &self.template {
            config.template = Some(template.clone());
        }
        if let Some(speed) = self.rotation_speed {
            config.rotation_speed = speed;
        }
        if let Some(rate) = self.refresh_rate {
            config.refresh_rate = rate;
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = config::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Check { sketch } => run_check(&sketch)?,
        Commands::Render { sketch, page } => {
            page.apply(&mut config);
            run_render(&sketch, &page.output, &config)?;
        }
        Commands::Watch {
            sketch,
            page,
            debounce_ms,
        } => {
            page.apply(&mut config);
            if let Some(ms) = debounce_ms {
                config.debounce_ms = ms;
            }
            run_watch(&sketch, &page.output, &config)?;
        }
        Commands::Csp { source } => {
            let source = source.unwrap_or_else(|| config.csp_source.clone());
            let nonce = Nonce::generate().context("Failed to generate nonce")?;
            println!(
                "{}",
                csp::content_security_policy(&source, &nonce, &config.cdn_origin)
            );
        }
        Commands::InitConfig { force } => {
            let target = cli.config.clone().or_else(config::default_config_path);
            if let Some(path) = target.as_deref().filter(|p| p.exists() && !force) {
                bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            let written = config::save_config(&config, target.as_deref())?;
            println!("Wrote {}", written.display());
        }
    }

    Ok(())
}

fn read_sketch(sketch: &Path) -> Result<String> {
    if !sketch.exists() {
        bail!("Sketch file not found: {}", sketch.display());
    }
    std::fs::read_to_string(sketch)
        .with_context(|| format!("Failed to read sketch {}", sketch.display()))
}

fn run_check(sketch: &Path) -> Result<()> {
    let source = read_sketch(sketch)?;
    match validate_sketch(&source) {
        Ok(()) => {
            println!("OK - {} parses as a sketch", sketch.display());
            Ok(())
        }
        Err(e) => bail!("{}: {}", sketch.display(), e),
    }
}

fn controller_for(sketch: &Path, output: &Path, config: &Config) -> PreviewController<FileHost> {
    let host = FileHost::new(sketch, output, &config.csp_source);
    PreviewController::new(host, DocumentBuilder::new(config.builder_options()))
}

fn run_render(sketch: &Path, output: &Path, config: &Config) -> Result<()> {
    read_sketch(sketch)?;
    let mut controller = controller_for(sketch, output, config);

    match controller.run()? {
        RunOutcome::Created | RunOutcome::Updated => {
            println!("Rendered {} -> {}", sketch.display(), output.display());
            Ok(())
        }
        RunOutcome::Rejected(e) => bail!("{}: {}", sketch.display(), e),
        RunOutcome::NoActiveDocument => bail!("Could not read {}", sketch.display()),
    }
}

fn run_watch(sketch: &Path, output: &Path, config: &Config) -> Result<()> {
    read_sketch(sketch)?;

    let mut watcher = SketchWatcher::new(Duration::from_millis(config.debounce_ms))?;
    watcher.watch(sketch)?;

    let mut controller = controller_for(sketch, output, config);

    println!("Watching {} -> {}", sketch.display(), output.display());
    println!("Press Ctrl+C to stop\n");

    render_and_report(&mut controller)?;

    loop {
        match watcher.recv_timeout(Duration::from_millis(100))? {
            Some(WatchEvent::Changed(path)) => {
                let skipped = watcher.drain();
                tracing::debug!(skipped, "Change in {}", path.display());
                controller.host_mut().sync_closed();
                render_and_report(&mut controller)?;
            }
            Some(WatchEvent::Error(e)) => tracing::warn!("{}", e),
            None => {}
        }
    }
}

/// Run the controller once, keeping the watch loop alive on sketch errors
fn render_and_report(controller: &mut PreviewController<FileHost>) -> Result<()> {
    match controller.run()? {
        RunOutcome::Created => println!("Opened {}", controller.host().output().display()),
        RunOutcome::Updated | RunOutcome::Rejected(_) => {}
        RunOutcome::NoActiveDocument => tracing::warn!("Sketch is not readable, waiting"),
    }
    Ok(())
}
