use std::{
  fs,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use cakes_violins::{format, group, loader, sink, DirSink, LoadOptions, Policy, Renderer, ViewerSink};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{info, Level};

#[derive(Parser)]
struct Args {
  /// Log more (`-v` for debug, `-vv` for trace).
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,
  #[command(subcommand)]
  command: Command,
}

#[derive(ClapArgs, Debug)]
struct Input {
  /// Directory containing the benchmark reports (`*.json`).
  #[arg(long)]
  reports_dir: PathBuf,
  /// Warn about and skip reports that do not match the schema, instead of
  /// aborting.
  #[arg(long)]
  skip_malformed: bool,
  /// Warn about and skip reports without any measurement, instead of
  /// aborting.
  #[arg(long)]
  skip_empty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Save one violin plot per dataset and shard count.
  Save {
    #[command(flatten)]
    input: Input,
    /// Directory the plots are written to.
    #[arg(long)]
    plots_dir: PathBuf,
  },
  /// Open every violin plot in an image viewer.
  Show {
    #[command(flatten)]
    input: Input,
    /// Command used to open each image.
    #[arg(long, default_value = sink::DEFAULT_VIEWER)]
    viewer: String,
  },
  /// Print a table of summary statistics.
  Summary {
    #[command(flatten)]
    input: Input,
  },
}

impl Input {
  fn options(&self) -> LoadOptions {
    let policy = |skip| if skip { Policy::Skip } else { Policy::Fail };

    LoadOptions {
      on_malformed: policy(self.skip_malformed),
      on_empty: policy(self.skip_empty),
    }
  }

  fn check(&self) -> Result<()> {
    check_dir(&self.reports_dir)?;
    fs::read_dir(&self.reports_dir).with_context(|| format!("{:?} is not readable", self.reports_dir))?;

    Ok(())
  }
}

fn check_dir(dir: &Path) -> Result<()> {
  if !dir.exists() {
    anyhow::bail!("{dir:?} does not exist");
  }
  if !dir.is_dir() {
    anyhow::bail!("{dir:?} is not a directory");
  }

  Ok(())
}

/// Creates (and immediately drops) an anonymous file inside `dir`.
fn check_writable(dir: &Path) -> Result<()> {
  check_dir(dir)?;
  tempfile::tempfile_in(dir).with_context(|| format!("{dir:?} is not writable"))?;

  Ok(())
}

fn run(command: Command) -> Result<()> {
  match command {
    Command::Save { input, plots_dir } => {
      input.check().context("reports dir")?;
      check_writable(&plots_dir).context("plots dir")?;

      let mut sink = DirSink::new(plots_dir);
      let count = cakes_violins::plot_dir(&input.reports_dir, &input.options(), &Renderer::default(), &mut sink)
        .context("plot")?;

      info!(count, dir = ?sink.dir(), "done");
    }
    Command::Show { input, viewer } => {
      input.check().context("reports dir")?;

      let mut sink = ViewerSink::new(viewer).context("ViewerSink::new")?;
      cakes_violins::plot_dir(&input.reports_dir, &input.options(), &Renderer::default(), &mut sink)
        .context("plot")?;
    }
    Command::Summary { input } => {
      input.check().context("reports dir")?;

      let reports = loader::load_dir(&input.reports_dir, &input.options()).context("load")?;
      let groups = group(reports);

      print!("{}", format::format(&groups).context("format")?);
    }
  }

  Ok(())
}

fn main() -> Result<()> {
  let args = Args::parse();

  let level = match args.verbose {
    0 => Level::INFO,
    1 => Level::DEBUG,
    _ => Level::TRACE,
  };
  let subscriber = tracing_subscriber::fmt()
    .with_max_level(level)
    .with_writer(std::io::stderr)
    .finish();

  tracing::subscriber::with_default(subscriber, || run(args.command))
}
