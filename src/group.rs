use std::{collections::HashMap, fmt};

use crate::{
  error::{Error, Result},
  report::Report,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
  pub data_name: String,
  pub num_shards: usize,
}

impl GroupKey {
  pub fn of(report: &Report) -> Self {
    Self {
      data_name: report.data_name().to_string(),
      num_shards: report.num_shards(),
    }
  }
}

impl fmt::Display for GroupKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}_{}", self.data_name, self.num_shards)
  }
}

/// Reports that share a dataset and a shard count, in discovery order.
#[derive(Debug, Clone)]
pub struct ReportGroup {
  pub key: GroupKey,
  pub reports: Vec<Report>,
}

impl ReportGroup {
  /// Checks that every member describes the same benchmark configuration as
  /// the first one.
  pub fn check_consistent(&self) -> Result<()> {
    check_consistent(&self.reports)
  }
}

/// Partitions `reports` by `(data_name, num_shards)`. Groups appear in the
/// order their first member does.
pub fn group<I: IntoIterator<Item = Report>>(reports: I) -> Vec<ReportGroup> {
  let mut groups: Vec<ReportGroup> = Vec::new();
  let mut index: HashMap<GroupKey, usize> = HashMap::new();

  for report in reports {
    let key = GroupKey::of(&report);
    let i = *index.entry(key.clone()).or_insert_with(|| {
      groups.push(ReportGroup {
        key,
        reports: Vec::new(),
      });
      groups.len() - 1
    });

    groups[i].reports.push(report);
  }

  groups
}

macro_rules! check_field {
  ($first:ident, $other:ident, $field:ident) => {
    if $first.$field() != $other.$field() {
      return Err(Error::InconsistentGroup {
        field: stringify!($field),
        expected: $first.$field().to_string(),
        found: $other.$field().to_string(),
      });
    }
  };
}

/// Fails with [`Error::EmptyGroup`] on an empty slice, or with
/// [`Error::InconsistentGroup`] naming the first field on which a report
/// disagrees with the first one.
pub fn check_consistent(reports: &[Report]) -> Result<()> {
  let Some((first, rest)) = reports.split_first() else {
    return Err(Error::EmptyGroup);
  };

  for other in rest {
    check_field!(first, other, data_name);
    check_field!(first, other, metric_name);
    check_field!(first, other, cardinality);
    check_field!(first, other, dimensionality);
    check_field!(first, other, num_queries);
    check_field!(first, other, num_shards);
  }

  Ok(())
}
