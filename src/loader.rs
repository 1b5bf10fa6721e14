use std::{
  fs,
  path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
  error::{Error, Result},
  report::{self, Report},
};

const REPORT_EXTENSION: &str = ".json";

/// What to do with a report file that cannot be turned into a [`Report`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy {
  /// Abort the whole run.
  #[default]
  Fail,
  /// Log a warning and leave the file out.
  Skip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
  /// Applied to schema violations ([`Error::MalformedReport`]).
  pub on_malformed: Policy,
  /// Applied to reports without measurements ([`Error::EmptyMeasurement`]).
  /// `Skip` treats such a report as a benchmark that was never run.
  pub on_empty: Policy,
}

impl LoadOptions {
  fn policy_for(&self, err: &Error) -> Policy {
    match err {
      Error::MalformedReport { .. } => self.on_malformed,
      Error::EmptyMeasurement { .. } => self.on_empty,
      _ => Policy::Fail,
    }
  }
}

/// Lists every `.json` file directly inside `dir`, in lexicographic order.
pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
  let dir = dir.as_ref();

  let mut paths = fs::read_dir(dir)
    .map_err(|e| Error::io(dir, e))?
    .map(|entry| Ok(entry.map_err(|e| Error::io(dir, e))?.path()))
    .collect::<Result<Vec<_>>>()?;

  paths.retain(|path| {
    path.is_file()
      && path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(REPORT_EXTENSION))
  });
  paths.sort();

  info!(dir = ?dir, count = paths.len(), "found reports");

  Ok(paths)
}

/// Loads `paths` in order. Errors not covered by `options` abort immediately.
pub fn load_all<I, P>(paths: I, options: &LoadOptions) -> Result<Vec<Report>>
where
  I: IntoIterator<Item = P>,
  P: AsRef<Path>,
{
  let mut reports = Vec::new();

  for path in paths {
    let path = path.as_ref();

    match report::load(path) {
      Ok(report) => reports.push(report),
      Err(err) if options.policy_for(&err) == Policy::Skip => {
        warn!(path = ?path, error = %err, "skipping report");
      }
      Err(err) => return Err(err),
    }
  }

  Ok(reports)
}

/// [`discover`] followed by [`load_all`].
pub fn load_dir<P: AsRef<Path>>(dir: P, options: &LoadOptions) -> Result<Vec<Report>> {
  load_all(discover(dir)?, options)
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tempfile::TempDir;

  use super::*;

  fn write_report(dir: &Path, name: &str, algorithm: &str, elapsed: &[f64]) {
    let doc = json!({
      "data_name": "gaussian",
      "metric_name": "euclidean",
      "cardinality": 100,
      "dimensionality": 2,
      "shard_sizes": [100],
      "num_queries": elapsed.len(),
      "k": 10,
      "algorithm": algorithm,
      "elapsed": elapsed,
    });
    fs::write(dir.join(name), doc.to_string()).unwrap();
  }

  #[test]
  fn discovers_sorted_json_files() {
    let dir = TempDir::new().unwrap();
    write_report(dir.path(), "b.json", "tree", &[0.1]);
    write_report(dir.path(), "a.json", "linear", &[0.1]);
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    fs::create_dir(dir.path().join("nested.json")).unwrap();

    let paths = discover(dir.path()).unwrap();
    let names: Vec<_> = paths.iter().map(|p| p.file_name().unwrap().to_owned()).collect();

    assert_eq!(names, ["a.json", "b.json"]);
  }

  #[test]
  fn missing_dir_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = discover(dir.path().join("absent")).unwrap_err();

    assert!(matches!(err, Error::Io { .. }), "{err}");
  }

  #[test]
  fn fails_fast_by_default() {
    let dir = TempDir::new().unwrap();
    write_report(dir.path(), "a.json", "linear", &[0.1]);
    fs::write(dir.path().join("b.json"), "{}").unwrap();
    write_report(dir.path(), "c.json", "tree", &[0.1]);

    let err = load_dir(dir.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(&err, Error::MalformedReport { path, .. } if path.ends_with("b.json")), "{err}");
  }

  #[test]
  fn skips_malformed_when_asked() {
    let dir = TempDir::new().unwrap();
    write_report(dir.path(), "a.json", "linear", &[0.1]);
    fs::write(dir.path().join("b.json"), "{}").unwrap();
    write_report(dir.path(), "c.json", "tree", &[0.1]);

    let options = LoadOptions {
      on_malformed: Policy::Skip,
      ..LoadOptions::default()
    };
    let reports = load_dir(dir.path(), &options).unwrap();
    let algorithms: Vec<_> = reports.iter().map(Report::algorithm).collect();

    assert_eq!(algorithms, ["linear", "tree"]);
  }

  #[test]
  fn undecodable_files_are_malformed() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.json"), b"{\"data_name\": \"caf\xe9\"}").unwrap();
    write_report(dir.path(), "b.json", "tree", &[0.1]);

    let err = load_dir(dir.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(&err, Error::MalformedReport { field, .. } if field == "<root>"), "{err}");

    let options = LoadOptions {
      on_malformed: Policy::Skip,
      ..LoadOptions::default()
    };
    let reports = load_dir(dir.path(), &options).unwrap();
    assert_eq!(reports.len(), 1);
  }

  #[test]
  fn empty_measurements_follow_their_own_policy() {
    let dir = TempDir::new().unwrap();
    write_report(dir.path(), "a.json", "linear", &[]);
    write_report(dir.path(), "b.json", "tree", &[0.1]);

    let skip_malformed = LoadOptions {
      on_malformed: Policy::Skip,
      on_empty: Policy::Fail,
    };
    let err = load_dir(dir.path(), &skip_malformed).unwrap_err();
    assert!(matches!(err, Error::EmptyMeasurement { .. }), "{err}");

    let skip_empty = LoadOptions {
      on_malformed: Policy::Fail,
      on_empty: Policy::Skip,
    };
    let reports = load_dir(dir.path(), &skip_empty).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].algorithm(), "tree");
  }
}
