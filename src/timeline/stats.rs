//! Summary statistics over batch duration results.

/// Summary of a set of defined durations, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationStats {
    pub count: usize,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub max: f64,
}

/// Summarize durations; `None` when the set is empty.
pub fn summarize(durations: &[f64]) -> Option<DurationStats> {
    if durations.is_empty() {
        return None;
    }
    let mut sorted = durations.to_vec();
    sorted.sort_by(f64::total_cmp);

    Some(DurationStats {
        count: sorted.len(),
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        p50: percentile(&sorted, 50),
        p90: percentile(&sorted, 90),
        p99: percentile(&sorted, 99),
        max: *sorted.last().expect("non-empty"),
    })
}

/// Percentile by index over a sorted slice.
fn percentile(sorted: &[f64], pct: usize) -> f64 {
    let index = (sorted.len() * pct / 100).min(sorted.len() - 1);
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_none() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn test_single_value() {
        let stats = summarize(&[4.5]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, 4.5);
        assert_eq!(stats.p50, 4.5);
        assert_eq!(stats.p99, 4.5);
        assert_eq!(stats.max, 4.5);
    }

    #[test]
    fn test_percentiles_over_unsorted_input() {
        let durations: Vec<f64> = (1..=100).rev().map(|n| n as f64).collect();
        let stats = summarize(&durations).unwrap();

        assert_eq!(stats.count, 100);
        assert_eq!(stats.mean, 50.5);
        assert_eq!(stats.p50, 51.0);
        assert_eq!(stats.p90, 91.0);
        assert_eq!(stats.p99, 100.0);
        assert_eq!(stats.max, 100.0);
    }
}
