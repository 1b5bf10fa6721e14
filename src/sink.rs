use std::{
  fs,
  path::{Path, PathBuf},
  process::Command,
};

use tracing::info;

use crate::{
  error::{Error, Result},
  ext::CommandExt,
};

pub const DEFAULT_VIEWER: &str = "xdg-open";

/// Final destination of a rendered chart.
pub trait Sink {
  /// Takes ownership of one encoded PNG image called `name`.
  fn dispose(&mut self, name: &str, png: &[u8]) -> Result<()>;
}

/// Writes every chart into a directory. An existing file with the same name is
/// overwritten.
#[derive(Debug, Clone)]
pub struct DirSink {
  dir: PathBuf,
}

impl DirSink {
  pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }
}

impl Sink for DirSink {
  fn dispose(&mut self, name: &str, png: &[u8]) -> Result<()> {
    let path = self.dir.join(name);
    fs::write(&path, png).map_err(|e| Error::render(Error::io(&path, e)))?;

    info!(path = ?path, bytes = png.len(), "saved plot");

    Ok(())
  }
}

/// Opens every chart in an external image viewer.
///
/// Images are written to a temporary directory that is left in place, since
/// most viewers read the file after the launching command has returned.
#[derive(Debug)]
pub struct ViewerSink {
  viewer: String,
  dir: PathBuf,
}

impl ViewerSink {
  pub fn new(viewer: impl Into<String>) -> Result<Self> {
    let dir = tempfile::Builder::new()
      .prefix("cakes-violins-")
      .disable_cleanup(true)
      .tempdir()
      .map_err(|e| Error::io(std::env::temp_dir(), e))?;

    Ok(Self {
      viewer: viewer.into(),
      dir: dir.path().to_path_buf(),
    })
  }
}

impl Sink for ViewerSink {
  fn dispose(&mut self, name: &str, png: &[u8]) -> Result<()> {
    let path = self.dir.join(name);
    fs::write(&path, png).map_err(|e| Error::render(Error::io(&path, e)))?;

    info!(viewer = %self.viewer, path = ?path, "showing plot");

    Command::new(&self.viewer).arg(&path).check_success().map_err(Error::render)
  }
}

/// Keeps every chart in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
  pub images: Vec<(String, Vec<u8>)>,
}

impl Sink for MemorySink {
  fn dispose(&mut self, name: &str, png: &[u8]) -> Result<()> {
    self.images.push((name.to_string(), png.to_vec()));

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn dir_sink_overwrites() {
    let dir = TempDir::new().unwrap();
    let mut sink = DirSink::new(dir.path());

    sink.dispose("plot.png", b"first").unwrap();
    sink.dispose("plot.png", b"second").unwrap();

    assert_eq!(fs::read(dir.path().join("plot.png")).unwrap(), b"second");
  }

  #[test]
  fn dir_sink_reports_write_failures() {
    let dir = TempDir::new().unwrap();
    let mut sink = DirSink::new(dir.path().join("missing"));

    let err = sink.dispose("plot.png", b"bytes").unwrap_err();
    assert!(matches!(err, Error::Render(_)), "{err}");
  }

  #[cfg(unix)]
  #[test]
  fn viewer_sink_runs_the_viewer() {
    let mut ok = ViewerSink::new("true").unwrap();
    ok.dispose("plot.png", b"bytes").unwrap();
    assert_eq!(fs::read(ok.dir.join("plot.png")).unwrap(), b"bytes");
    fs::remove_dir_all(&ok.dir).unwrap();

    let mut failing = ViewerSink::new("false").unwrap();
    assert!(matches!(failing.dispose("plot.png", b"bytes"), Err(Error::Render(_))));
    fs::remove_dir_all(&failing.dir).unwrap();
  }

  #[test]
  fn viewer_files_outlive_the_sink() {
    let sink = ViewerSink::new("true").unwrap();
    let dir = sink.dir.clone();
    drop(sink);

    assert!(dir.is_dir());
    fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn memory_sink_collects() {
    let mut sink = MemorySink::default();
    sink.dispose("a.png", b"a").unwrap();
    sink.dispose("b.png", b"b").unwrap();

    let names: Vec<_> = sink.images.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["a.png", "b.png"]);
  }
}
