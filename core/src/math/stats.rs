pub struct StatsHelper;

impl StatsHelper {
    pub fn excess(n_on: f64, n_off: f64, alpha: f64) -> f64 {
        n_on - alpha * n_off
    }

    /// Li & Ma (1983) eq. 17 significance, signed like the excess.
    pub fn lima_significance(n_on: f64, n_off: f64, alpha: f64) -> f64 {
        if !(alpha > 0.0) || n_on < 0.0 || n_off < 0.0 {
            return 0.0;
        }
        let total = n_on + n_off;
        let excess = Self::excess(n_on, n_off, alpha);
        if total <= 0.0 || excess == 0.0 {
            return 0.0;
        }

        let term_on = if n_on > 0.0 {
            n_on * ((1.0 + alpha) / alpha * n_on / total).ln()
        } else {
            0.0
        };
        let term_off = if n_off > 0.0 {
            n_off * ((1.0 + alpha) * n_off / total).ln()
        } else {
            0.0
        };

        let ts = (2.0 * (term_on + term_off)).max(0.0);
        ts.sqrt().copysign(excess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn lima_reference_values() {
        assert_abs_diff_eq!(
            StatsHelper::lima_significance(10.0, 10.0, 0.1),
            4.70512718527949,
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            StatsHelper::lima_significance(2.0, 100.0, 0.1),
            -2.9942927482003556,
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            StatsHelper::lima_significance(0.0, 10.0, 0.5),
            -2.8476836485402113,
            epsilon = 1e-10
        );
    }

    #[test]
    fn lima_degenerate_inputs_yield_zero() {
        assert_eq!(StatsHelper::lima_significance(0.0, 0.0, 0.2), 0.0);
        assert_eq!(StatsHelper::lima_significance(5.0, 10.0, 0.0), 0.0);
        assert_eq!(StatsHelper::lima_significance(5.0, 10.0, 0.5), 0.0);
    }
}
