use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scanfleet", version)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a fleet of sphere images and write them out.
    Render(RenderArgs),
    /// Print the effective fleet config as JSON.
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Fleet config JSON. Flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of jobs.
    #[arg(long)]
    jobs: Option<u32>,

    /// Image width and height per job. A configured range must still fit.
    #[arg(long)]
    size: Option<u32>,

    /// Maximum jobs alive at once (default: all).
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Seed for per-job colors.
    #[arg(long)]
    seed: Option<u64>,

    /// Contact-sheet tiles per row.
    #[arg(long)]
    columns: Option<u32>,

    /// Output contact-sheet PNG.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory for one PNG per completed job.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Print the SHA-256 of every job surface.
    #[arg(long)]
    digest: bool,
}

#[derive(Parser, Debug)]
struct ConfigArgs {
    /// Fleet config JSON to validate and print (default: built-in defaults).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Config(args) => cmd_config(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "scanfleet=debug"
    } else {
        "scanfleet=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<scanfleet::FleetConfig> {
    match path {
        Some(p) => scanfleet::FleetConfig::from_path(p)
            .with_context(|| format!("load fleet config '{}'", p.display())),
        None => Ok(scanfleet::FleetConfig::default()),
    }
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    println!("{}", cfg.to_json_pretty()?);
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(n) = args.jobs {
        cfg.job_count = n;
    }
    if let Some(size) = args.size {
        cfg.size = size;
        if let Some(range) = cfg.range {
            range
                .validate_for(size)
                .with_context(|| format!("configured range does not fit --size {size}"))?;
        }
    }
    if let Some(n) = args.max_in_flight {
        cfg.max_in_flight = Some(n);
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(columns) = args.columns {
        cfg.columns = columns;
    }

    let jobs = cfg.jobs().context("build jobs")?;
    let fleet = scanfleet::Fleet::new(Arc::new(scanfleet::SphereModule::new()), cfg.fleet_opts())?;
    let report = fleet.run(&jobs)?;

    for outcome in &report.outcomes {
        if let Some(err) = outcome.error() {
            eprintln!("{} failed: {err}", outcome.id);
        }
        if args.digest
            && let Some(surface) = outcome.surface.as_ref()
        {
            println!("{} {}", outcome.id, surface.digest());
        }
    }

    if let Some(dir) = args.out_dir.as_ref() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
        for outcome in report.outcomes.iter().filter(|o| o.is_completed()) {
            if let Some(surface) = outcome.surface.as_ref() {
                let path = dir.join(format!("job_{:04}.png", outcome.id.0));
                surface.save_png(&path)?;
            }
        }
        eprintln!("wrote {}", dir.display());
    }

    if let Some(out) = args.out.as_ref() {
        if let Some(parent) = out.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        let tiles = report
            .outcomes
            .iter()
            .map(|o| o.surface.as_ref())
            .collect::<Vec<_>>();
        if !tiles.is_empty() {
            let sheet = scanfleet::contact_sheet(&tiles, cfg.columns, cfg.size, cfg.display_scale)?;
            sheet
                .save(out)
                .with_context(|| format!("write png '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
    }

    let s = report.stats;
    eprintln!(
        "jobs: {} completed, {} failed, {} cancelled, {} rows composited",
        s.completed, s.failed, s.cancelled, s.rows_composited
    );
    if !report.all_completed() {
        anyhow::bail!("{} of {} jobs did not complete", s.jobs_total - s.completed, s.jobs_total);
    }
    Ok(())
}
