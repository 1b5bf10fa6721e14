//! Summaries and violin plots of approximate nearest-neighbor search
//! benchmarks.
//!
//! Each benchmark result file becomes a [`Report`]; reports are grouped by
//! dataset and shard count, and every group is drawn as one chart comparing
//! the per-query latency of each algorithm for each `k`.

pub mod error;
pub mod ext;
pub mod format;
pub mod group;
pub mod loader;
pub mod render;
pub mod report;
pub mod sink;
pub mod stats;
pub mod violin;

use std::path::Path;

use tracing::info;

pub use self::{
  error::{Error, Result},
  group::{group, GroupKey, ReportGroup},
  loader::{LoadOptions, Policy},
  render::Renderer,
  report::{load, Report},
  sink::{DirSink, MemorySink, Sink, ViewerSink},
};

/// Loads every report in `reports_dir` and renders one chart per group into
/// `sink`, stopping at the first error. Returns the number of charts drawn.
pub fn plot_dir<P: AsRef<Path>>(
  reports_dir: P,
  options: &LoadOptions,
  renderer: &Renderer,
  sink: &mut dyn Sink,
) -> Result<usize> {
  let reports = loader::load_dir(reports_dir, options)?;
  let groups = group(reports);

  info!(groups = groups.len(), "grouped reports");

  for group in &groups {
    renderer.render(&group.reports, sink)?;
  }

  Ok(groups.len())
}
