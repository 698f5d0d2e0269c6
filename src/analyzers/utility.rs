/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of the present values divided by `count`, treating absent values as
/// zero. Returns 0.0 when `count` is zero.
pub fn zero_filled_mean(values: impl IntoIterator<Item = Option<f64>>, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    values.into_iter().flatten().sum::<f64>() / count as f64
}

/// Mean over the present values only. `None` when nothing is present.
pub fn present_mean(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(mean(&present))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_zero_filled_mean_counts_absent_values() {
        assert_eq!(zero_filled_mean([Some(100.0), None], 2), 50.0);
        assert_eq!(zero_filled_mean([None, None], 0), 0.0);
    }

    #[test]
    fn test_present_mean_skips_absent_values() {
        assert_eq!(present_mean([Some(100.0), None]), Some(100.0));
        assert_eq!(present_mean([None, None]), None);
    }
}
