//! Inference cost accounting.

/// Billing rate of the serverless GPU backend, in dollars per second.
pub const COST_PER_SECOND: f64 = 0.00106;

/// Estimated cost of a job that ran for `execution_secs`, rounded to 4 decimals.
pub fn estimate_cost(execution_secs: f64) -> f64 {
    if !execution_secs.is_finite() || execution_secs <= 0.0 {
        return 0.0;
    }
    (execution_secs * COST_PER_SECOND * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_rounding() {
        assert_eq!(estimate_cost(100.0), 0.106);
        assert_eq!(estimate_cost(84.2), 0.0893);
        assert_eq!(estimate_cost(0.0), 0.0);
        assert_eq!(estimate_cost(-5.0), 0.0);
    }
}
