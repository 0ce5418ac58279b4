use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::series::Series;

/// How many independent anomaly signals co-occur on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Normal,
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Severity::Normal, Severity::Low, Severity::Medium, Severity::High];

    /// 0 → Normal, 1 → Low, 2 → Medium, more → High.
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Severity::Normal,
            1 => Severity::Low,
            2 => Severity::Medium,
            _ => Severity::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "Normal",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts true flags per row across every flag column present and maps the
/// count to a `Severity`. Without any flag columns every row is `Normal`.
pub fn assign_severity(series: &Series) -> Series {
    let mut counts = vec![0usize; series.len()];
    for (_, values) in series.flags() {
        for (count, flagged) in counts.iter_mut().zip(values) {
            *count += usize::from(*flagged);
        }
    }
    let severity: Vec<Severity> = counts.iter().map(|c| Severity::from_count(*c)).collect();

    debug!(
        high = severity.iter().filter(|s| **s == Severity::High).count(),
        flags = series.flags().count(),
        "severity assigned"
    );

    let mut out = series.clone();
    out.set_severity(counts, severity);
    out
}
