use std::fmt::Write;

use anyhow::Result;

use crate::group::ReportGroup;

const COLUMN_WIDTH: usize = 14;
const COLUMN_PADDING: &str = "  ";
const COLUMNS: [&str; 6] = ["algorithm", "k", "elapsed mean", "elapsed std", "throughput", "recall"];

fn format_header() -> String {
  let header = COLUMNS
    .iter()
    .map(|col| format!("{col:<COLUMN_WIDTH$}"))
    .collect::<Vec<_>>()
    .join(COLUMN_PADDING);

  format!("{header}\n{}", "=".repeat(header.len()))
}

/// Left-aligns the first column, right-aligns the numbers.
fn format_row<I: IntoIterator<Item = String>>(cols: I) -> String {
  cols
    .into_iter()
    .enumerate()
    .map(|(i, col)| {
      if i == 0 {
        format!("{col:<COLUMN_WIDTH$}")
      } else {
        format!("{col:>COLUMN_WIDTH$}")
      }
    })
    .collect::<Vec<_>>()
    .join(COLUMN_PADDING)
}

fn format_group(table: &mut String, group: &ReportGroup) -> Result<()> {
  let Some(first) = group.reports.first() else {
    return Ok(());
  };

  writeln!(
    table,
    "{} - {} - {} shard(s) - ({} x {}) - {} queries",
    first.data_name(),
    first.metric_name(),
    first.num_shards(),
    first.cardinality(),
    first.dimensionality(),
    first.num_queries(),
  )?;
  writeln!(table)?;
  writeln!(table, "{}", format_header())?;

  for report in &group.reports {
    let elapsed = report.elapsed_stats();
    let recall = if report.recalls_defaulted() {
      "n/a".to_string()
    } else {
      format!("{:.4}", report.recall_stats().mean)
    };

    let row = format_row([
      report.algorithm().to_string(),
      report.k().to_string(),
      format!("{:.3e} s", elapsed.mean),
      format!("{:.3e} s", elapsed.std),
      format!("{:.3e} QPS", report.throughput_stats().mean),
      recall,
    ]);

    writeln!(table, "{row}")?;
  }

  Ok(())
}

pub fn format(groups: &[ReportGroup]) -> Result<String> {
  let mut table = String::new();

  for group in groups {
    format_group(&mut table, group)?;
    writeln!(table)?;
  }

  Ok(table)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    group::group,
    report::{tests::fields, Report},
  };

  #[test]
  fn one_section_per_group() {
    let mut with_recall = fields("tree", 20, vec![0.5, 0.25]);
    with_recall.recalls = Some(vec![0.5, 1.0]);

    let reports = vec![
      Report::new("a.json", fields("linear", 10, vec![0.01; 3])).unwrap(),
      Report::new("b.json", with_recall).unwrap(),
    ];
    let mut other = fields("linear", 10, vec![0.5, 0.25]);
    other.data_name = "sift".to_string();

    let groups = group(reports.into_iter().chain([Report::new("c.json", other).unwrap()]));
    let table = format(&groups).unwrap();
    let lines: Vec<_> = table.lines().collect();

    assert_eq!(lines[0], "gaussian - euclidean - 1 shard(s) - (1000 x 10) - 3 queries");
    assert!(lines[2].starts_with("algorithm "));
    assert!(lines[3].chars().all(|c| c == '='));
    assert!(lines[4].starts_with("linear "));
    assert!(lines[4].contains("1.000e2 QPS"));
    assert!(lines[4].ends_with("n/a"));
    assert!(lines[5].starts_with("tree "));
    assert!(lines[5].ends_with("0.7500"));
    assert!(table.contains("sift - euclidean"));
  }
}
