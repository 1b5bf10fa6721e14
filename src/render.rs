use std::{fs, path::Path};

use plotters::prelude::*;
use tracing::{debug, info};

use crate::{
  error::{Error, Result},
  group::{self, GroupKey},
  report::Report,
  sink::Sink,
  violin::{self, Violin},
};

pub const DPI: u32 = 128;
/// Canvas size in inches.
pub const FIGURE_SIZE: (u32, u32) = (14, 7);

const Y_LABEL: &str = "Time per Query (10 ^ seconds)";
/// Share of each category's slot on the x axis covered by its violins.
const CATEGORY_WIDTH: f64 = 0.8;

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One row of the long-form table that feeds the chart: a single query of a
/// single report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row<'a> {
  pub k: usize,
  pub algorithm: &'a str,
  /// `log10` of the query's latency in seconds.
  pub time: f64,
}

pub fn rows(reports: &[Report]) -> Vec<Row<'_>> {
  reports
    .iter()
    .flat_map(|r| {
      r.elapsed().iter().map(move |t| Row {
        k: r.k(),
        algorithm: r.algorithm(),
        time: t.log10(),
      })
    })
    .collect()
}

pub fn title(report: &Report) -> String {
  format!(
    "{} - {} - {} shard(s) - ({} x {}) shape",
    report.data_name(),
    report.metric_name(),
    report.num_shards(),
    report.cardinality(),
    report.dimensionality(),
  )
}

pub fn file_name(report: &Report) -> String {
  format!("{}.png", GroupKey::of(report))
}

/// A violin positioned on the chart.
#[derive(Debug, Clone)]
pub struct Placed {
  pub algorithm: usize,
  pub hue: usize,
  /// Center on the x axis.
  pub x: f64,
  /// Half of the widest this violin may get.
  pub half_width: f64,
  pub violin: Violin,
}

impl Placed {
  /// Closed outline, with densities divided by `scale`.
  fn outline(&self, scale: f64) -> Vec<(f64, f64)> {
    let offset = |d: f64| d / scale * self.half_width;
    let right = self.violin.profile.iter().map(|&(y, d)| (self.x + offset(d), y));
    let left = self.violin.profile.iter().rev().map(|&(y, d)| (self.x - offset(d), y));

    right.chain(left).collect()
  }

  fn flat_line(&self) -> Vec<(f64, f64)> {
    let y = self.violin.median;
    vec![(self.x - self.half_width, y), (self.x + self.half_width, y)]
  }
}

/// Where everything goes: algorithms along x in first-appearance order, one
/// hue per `k` in ascending order.
#[derive(Debug, Clone)]
pub struct Layout {
  pub algorithms: Vec<String>,
  pub ks: Vec<usize>,
  pub violins: Vec<Placed>,
  pub y_range: (f64, f64),
}

impl Layout {
  pub fn new(rows: &[Row<'_>]) -> Self {
    let mut algorithms: Vec<String> = Vec::new();
    for row in rows {
      if !algorithms.iter().any(|a| a == row.algorithm) {
        algorithms.push(row.algorithm.to_string());
      }
    }

    let mut ks: Vec<usize> = rows.iter().map(|row| row.k).collect();
    ks.sort_unstable();
    ks.dedup();

    let slot = CATEGORY_WIDTH / ks.len().max(1) as f64;
    let mut violins = Vec::new();

    for (a, algorithm) in algorithms.iter().enumerate() {
      for (hue, &k) in ks.iter().enumerate() {
        let samples: Vec<f64> = rows
          .iter()
          .filter(|row| row.k == k && row.algorithm == algorithm)
          .map(|row| row.time)
          .collect();

        if let Some(violin) = Violin::new(&samples) {
          violins.push(Placed {
            algorithm: a,
            hue,
            x: a as f64 - CATEGORY_WIDTH / 2.0 + (hue as f64 + 0.5) * slot,
            half_width: slot / 2.0,
            violin,
          });
        }
      }
    }

    Self {
      algorithms,
      ks,
      violins,
      y_range: y_range(rows),
    }
  }

  pub fn x_range(&self) -> (f64, f64) {
    (-0.5, self.algorithms.len() as f64 - 0.5)
  }

  /// Axis label for a tick at `x`: the algorithm name at category centers,
  /// nothing elsewhere.
  pub fn category_label(&self, x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
      return String::new();
    }

    self.algorithms.get(i as usize).cloned().unwrap_or_default()
  }
}

fn y_range(rows: &[Row<'_>]) -> (f64, f64) {
  let (lo, hi) = rows
    .iter()
    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), row| (lo.min(row.time), hi.max(row.time)));

  if !(lo.is_finite() && hi.is_finite()) {
    return (-1.0, 1.0);
  }

  let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
  (lo - pad, hi + pad)
}

/// Draws one chart per group and hands the PNG to a [`Sink`].
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
  size: (u32, u32),
}

impl Default for Renderer {
  fn default() -> Self {
    Self {
      size: (FIGURE_SIZE.0 * DPI, FIGURE_SIZE.1 * DPI),
    }
  }
}

impl Renderer {
  /// Canvas size in pixels.
  pub fn with_size(width: u32, height: u32) -> Self {
    Self { size: (width, height) }
  }

  pub fn size(&self) -> (u32, u32) {
    self.size
  }

  /// Renders `reports` into a single chart.
  ///
  /// # Errors
  ///
  /// - [`Error::EmptyGroup`] if `reports` is empty.
  /// - [`Error::InconsistentGroup`] if the reports do not share their dataset,
  ///   metric, shape, query count and shard count.
  /// - [`Error::Render`] if drawing or encoding fails, or the sink does.
  ///
  /// Nothing reaches the sink unless the whole chart was drawn.
  pub fn render(&self, reports: &[Report], sink: &mut dyn Sink) -> Result<()> {
    group::check_consistent(reports)?;
    let first = &reports[0];

    let name = file_name(first);
    let rows = rows(reports);
    let layout = Layout::new(&rows);

    info!(plot = %name, reports = reports.len(), rows = rows.len(), "rendering");

    // The canvas lives in a scratch directory removed on every return path.
    let scratch = tempfile::Builder::new()
      .prefix("cakes-violins-")
      .tempdir()
      .map_err(|e| Error::render(Error::io(std::env::temp_dir(), e)))?;
    let canvas = scratch.path().join(&name);

    self.draw(&layout, &title(first), &canvas).map_err(Error::Render)?;
    let png = fs::read(&canvas).map_err(|e| Error::render(Error::io(&canvas, e)))?;

    debug!(plot = %name, bytes = png.len(), "encoded");

    sink.dispose(&name, &png)
  }

  fn draw(&self, layout: &Layout, title: &str, path: &Path) -> DrawResult<()> {
    let root = BitMapBackend::new(path, self.size).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_lo, x_hi) = layout.x_range();
    let (y_lo, y_hi) = layout.y_range;

    let mut chart = ChartBuilder::on(&root)
      .caption(title, ("sans-serif", 28))
      .margin(20)
      .x_label_area_size(60)
      .y_label_area_size(90)
      .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
      .configure_mesh()
      .disable_x_mesh()
      .x_labels(2 * layout.algorithms.len() + 1)
      .x_label_formatter(&|x| layout.category_label(*x))
      .y_label_formatter(&|y| format!("{y:.1}"))
      .x_desc("algorithm")
      .y_desc(Y_LABEL)
      .label_style(("sans-serif", 16))
      .draw()?;

    let scale = violin::density_scale(layout.violins.iter().map(|p| &p.violin));

    for (hue, k) in layout.ks.iter().enumerate() {
      let color = Palette99::pick(hue).mix(0.8);
      let of_hue = move || layout.violins.iter().filter(move |p| p.hue == hue);

      chart
        .draw_series(
          of_hue()
            .filter(|p| !p.violin.is_flat())
            .map(|p| Polygon::new(p.outline(scale), color.filled())),
        )?
        .label(format!("k = {k}"))
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));

      chart.draw_series(
        of_hue()
          .filter(|p| !p.violin.is_flat())
          .map(|p| PathElement::new(p.outline(scale), BLACK.stroke_width(1))),
      )?;

      chart.draw_series(
        of_hue()
          .filter(|p| p.violin.is_flat())
          .map(|p| PathElement::new(p.flat_line(), color.stroke_width(3))),
      )?;
    }

    chart.draw_series(layout.violins.iter().filter(|p| !p.violin.is_flat()).map(|p| {
      PathElement::new(
        vec![(p.x, p.violin.q1), (p.x, p.violin.q3)],
        BLACK.stroke_width(4),
      )
    }))?;
    chart.draw_series(
      layout
        .violins
        .iter()
        .map(|p| Circle::new((p.x, p.violin.median), 3, WHITE.filled())),
    )?;

    chart
      .configure_series_labels()
      .background_style(WHITE.mix(0.8))
      .border_style(BLACK)
      .position(SeriesLabelPosition::UpperRight)
      .draw()?;

    root.present()?;

    Ok(())
  }
}
