use std::{
  fmt,
  fs,
  path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
  error::{Error, Result},
  stats::Summary,
};

/// Recall assumed for reports that carry no `recalls` array: the algorithm is
/// treated as an exact baseline. This is a fallback, not a measurement.
pub const DEFAULT_RECALL: f64 = 1.0;

/// The raw fields of one benchmark result file, before any derived statistic
/// is computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFields {
  pub data_name: String,
  pub metric_name: String,
  pub cardinality: usize,
  pub dimensionality: usize,
  pub shard_sizes: Vec<usize>,
  pub num_queries: usize,
  pub k: usize,
  pub algorithm: String,
  pub elapsed: Vec<f64>,
  pub recalls: Option<Vec<f64>>,
}

/// One benchmark run of one algorithm, with its statistics computed once at
/// construction. There is no way to modify a `Report` after it is built.
#[derive(Debug, Clone)]
pub struct Report {
  path: PathBuf,
  data_name: String,
  metric_name: String,
  cardinality: usize,
  dimensionality: usize,
  shard_sizes: Vec<usize>,
  num_queries: usize,
  k: usize,
  algorithm: String,
  elapsed: Vec<f64>,
  recalls: Vec<f64>,
  recalls_defaulted: bool,
  throughput: Vec<f64>,
  elapsed_stats: Summary,
  recall_stats: Summary,
  throughput_stats: Summary,
}

/// Reads and parses the report stored at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Report> {
  let path = path.as_ref();
  let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;

  Report::from_slice(path, &bytes)
}

impl Report {
  /// Parses a JSON document. `path` is only used to label errors.
  pub fn from_json<P: AsRef<Path>>(path: P, text: &str) -> Result<Self> {
    Self::from_slice(path, text.as_bytes())
  }

  /// Like [`Report::from_json`], for raw file contents. Invalid UTF-8 is
  /// malformed input.
  pub fn from_slice<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<Self> {
    let path = path.as_ref();
    let value: Value = serde_json::from_slice(bytes).map_err(|e| Error::malformed(path, "<root>", e.to_string()))?;
    let Value::Object(object) = value else {
      return Err(Error::malformed(path, "<root>", "expected a JSON object"));
    };

    let mut fields = Fields { path, object };
    let report = ReportFields {
      data_name: fields.required("data_name")?,
      metric_name: fields.required("metric_name")?,
      cardinality: fields.required("cardinality")?,
      dimensionality: fields.required("dimensionality")?,
      shard_sizes: fields.required("shard_sizes")?,
      num_queries: fields.required("num_queries")?,
      k: fields.required("k")?,
      algorithm: fields.required("algorithm")?,
      elapsed: fields.required("elapsed")?,
      recalls: fields.optional("recalls")?,
    };

    Self::new(path, report)
  }

  /// Validates `fields` and computes every derived statistic.
  ///
  /// # Errors
  ///
  /// - [`Error::EmptyMeasurement`] if `elapsed` or an explicit `recalls` is
  ///   empty.
  /// - [`Error::MalformedReport`] if `elapsed` does not hold `num_queries`
  ///   strictly positive latencies, or a recall lies outside `[0, 1]`.
  pub fn new<P: AsRef<Path>>(path: P, fields: ReportFields) -> Result<Self> {
    let path = path.as_ref();

    let elapsed_stats = Summary::of(&fields.elapsed).ok_or(Error::EmptyMeasurement {
      path: path.to_path_buf(),
      field: "elapsed",
    })?;

    if fields.elapsed.len() != fields.num_queries {
      return Err(Error::malformed(
        path,
        "elapsed",
        format!(
          "expected {} latencies (num_queries), found {}",
          fields.num_queries,
          fields.elapsed.len()
        ),
      ));
    }

    if let Some((i, t)) = fields.elapsed.iter().enumerate().find(|(_, t)| !(**t > 0.0 && t.is_finite() && t.recip().is_finite())) {
      return Err(Error::malformed(
        path,
        "elapsed",
        format!("latency {t} at query {i} is not a positive number of seconds"),
      ));
    }

    let recalls_defaulted = fields.recalls.is_none();
    let recalls = fields.recalls.unwrap_or_else(|| vec![DEFAULT_RECALL]);

    let recall_stats = Summary::of(&recalls).ok_or(Error::EmptyMeasurement {
      path: path.to_path_buf(),
      field: "recalls",
    })?;

    if let Some((i, r)) = recalls.iter().enumerate().find(|(_, r)| !(0.0..=1.0).contains(*r)) {
      return Err(Error::malformed(
        path,
        "recalls",
        format!("recall {r} at query {i} is outside [0, 1]"),
      ));
    }

    let throughput: Vec<f64> = fields.elapsed.iter().map(|t| 1.0 / t).collect();
    let throughput_stats = Summary::of(&throughput).ok_or(Error::EmptyMeasurement {
      path: path.to_path_buf(),
      field: "elapsed",
    })?;

    if ![elapsed_stats, throughput_stats]
      .iter()
      .all(|s| s.mean.is_finite() && s.std.is_finite())
    {
      return Err(Error::malformed(path, "elapsed", "latency statistics overflow"));
    }

    let report = Self {
      path: path.to_path_buf(),
      data_name: fields.data_name,
      metric_name: fields.metric_name,
      cardinality: fields.cardinality,
      dimensionality: fields.dimensionality,
      shard_sizes: fields.shard_sizes,
      num_queries: fields.num_queries,
      k: fields.k,
      algorithm: fields.algorithm,
      elapsed: fields.elapsed,
      recalls,
      recalls_defaulted,
      throughput,
      elapsed_stats,
      recall_stats,
      throughput_stats,
    };

    debug!(path = ?report.path, algorithm = %report.algorithm, k = report.k, "loaded report");

    Ok(report)
  }

  /// The file this report was loaded from.
  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn data_name(&self) -> &str {
    &self.data_name
  }

  pub fn metric_name(&self) -> &str {
    &self.metric_name
  }

  pub fn cardinality(&self) -> usize {
    self.cardinality
  }

  pub fn dimensionality(&self) -> usize {
    self.dimensionality
  }

  pub fn shard_sizes(&self) -> &[usize] {
    &self.shard_sizes
  }

  pub fn num_shards(&self) -> usize {
    self.shard_sizes.len()
  }

  pub fn num_queries(&self) -> usize {
    self.num_queries
  }

  pub fn k(&self) -> usize {
    self.k
  }

  pub fn algorithm(&self) -> &str {
    &self.algorithm
  }

  /// Per-query latency, in seconds.
  pub fn elapsed(&self) -> &[f64] {
    &self.elapsed
  }

  pub fn recalls(&self) -> &[f64] {
    &self.recalls
  }

  /// Whether `recalls` was absent from the input and [`DEFAULT_RECALL`] was
  /// substituted.
  pub fn recalls_defaulted(&self) -> bool {
    self.recalls_defaulted
  }

  /// Per-query throughput, in queries per second.
  pub fn throughput(&self) -> &[f64] {
    &self.throughput
  }

  pub fn elapsed_stats(&self) -> Summary {
    self.elapsed_stats
  }

  pub fn recall_stats(&self) -> Summary {
    self.recall_stats
  }

  /// Mean and spread of the per-query throughput. The mean is the canonical
  /// throughput figure; it differs from [`Report::aggregate_throughput`]
  /// whenever latencies vary.
  pub fn throughput_stats(&self) -> Summary {
    self.throughput_stats
  }

  /// Queries answered per second of total elapsed time, i.e.
  /// `num_queries / sum(elapsed)`.
  pub fn aggregate_throughput(&self) -> f64 {
    1.0 / self.elapsed_stats.mean
  }

  /// First-order error propagation of `elapsed_std` through `1 / t`.
  pub fn propagated_throughput_std(&self) -> f64 {
    self.elapsed_stats.std / self.elapsed_stats.mean.powi(2)
  }
}

impl fmt::Display for Report {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Report(")?;
    writeln!(f, "  data_name={},", self.data_name)?;
    writeln!(f, "  metric_name={},", self.metric_name)?;
    writeln!(f, "  cardinality={},", self.cardinality)?;
    writeln!(f, "  dimensionality={},", self.dimensionality)?;
    writeln!(f, "  num_shards={},", self.num_shards())?;
    writeln!(f, "  num_queries={},", self.num_queries)?;
    writeln!(f, "  k={},", self.k)?;
    writeln!(f, "  algorithm={},", self.algorithm)?;
    writeln!(f, "  elapsed_mean={:.3e} seconds,", self.elapsed_stats.mean)?;
    writeln!(f, "  elapsed_std={:.3e} seconds,", self.elapsed_stats.std)?;
    writeln!(f, "  throughput_mean={:.3e} QPS,", self.throughput_stats.mean)?;
    write!(f, ")")
  }
}

/// A JSON object being taken apart one named field at a time.
struct Fields<'a> {
  path: &'a Path,
  object: Map<String, Value>,
}

impl Fields<'_> {
  fn required<T: DeserializeOwned>(&mut self, name: &str) -> Result<T> {
    match self.object.remove(name) {
      None | Some(Value::Null) => Err(Error::malformed(self.path, name, "missing required field")),
      Some(value) => self.parse(name, value),
    }
  }

  fn optional<T: DeserializeOwned>(&mut self, name: &str) -> Result<Option<T>> {
    match self.object.remove(name) {
      None | Some(Value::Null) => Ok(None),
      Some(value) => self.parse(name, value).map(Some),
    }
  }

  fn parse<T: DeserializeOwned>(&self, name: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::malformed(self.path, name, e.to_string()))
  }
}
