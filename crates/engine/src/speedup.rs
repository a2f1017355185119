use advisor_protocol::{Speedup, SpeedupKind};

/// Speedup estimate for a finding.
///
/// `local_fraction` is the share of the rule's own scope that could be
/// recovered (0.0..=1.0). With a parent weight in percent the estimate is
/// global (`local_fraction * weight_pct`); without one it stays local
/// (`local_fraction * 100`). The two are never blended.
#[must_use]
pub fn estimate_speedup(local_fraction: f64, weight_pct: Option<f64>) -> Speedup {
    match weight_pct {
        Some(weight) => Speedup {
            kind: SpeedupKind::Global,
            percent: local_fraction * weight,
        },
        None => Speedup {
            kind: SpeedupKind::Local,
            percent: local_fraction * 100.0,
        },
    }
}
