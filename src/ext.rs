use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};

#[extend::ext]
pub impl ExitStatus {
  fn check_success(&self) -> Result<()> {
    if !self.success() {
      anyhow::bail!("exited with non-zero status {self}");
    }

    Ok(())
  }
}

#[extend::ext]
pub impl Command {
  /// Runs the command to completion, returning an error on non-zero exit.
  fn check_success(&mut self) -> Result<()> {
    let program = self.get_program().to_string_lossy().into_owned();

    self.status().with_context(|| format!("spawn {program:?}"))?.check_success()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[cfg(unix)]
  #[test]
  fn reports_exit_status() {
    assert!(Command::new("true").check_success().is_ok());
    assert!(Command::new("false").check_success().is_err());
  }

  #[test]
  fn missing_program_is_an_error() {
    let err = Command::new("definitely-not-a-real-viewer").check_success().unwrap_err();
    assert!(format!("{err:#}").contains("definitely-not-a-real-viewer"));
  }
}
