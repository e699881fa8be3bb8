use ndarray::{ArrayView1, Zip};

/// Objective the network minimizes during training.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LossMode {
    #[default]
    Mse,
    CrossEntropy,
}

/// Stand-in for `desired / output` when `output` is exactly zero.
pub const ZERO_OUTPUT_GUARD: f64 = f64::MIN_POSITIVE;

/// Mean over components of the squared difference.
/// Both views must have the same length.
pub fn mean_squared_error(actual: ArrayView1<f64>, desired: ArrayView1<f64>) -> f64 {
    assert_eq!(actual.len(), desired.len());

    let n = actual.len();
    Zip::from(&actual)
        .and(&desired)
        .fold(0.0, |loss, &actual, &desired| loss + (actual - desired).powi(2))
        / n as f64
}

/// `Σ desired_k · ln(actual_k)` over the components, skipping zero outputs.
/// The caller negates and averages.
pub fn log_likelihood(actual: ArrayView1<f64>, desired: ArrayView1<f64>) -> f64 {
    assert_eq!(actual.len(), desired.len());

    Zip::from(&actual)
        .and(&desired)
        .fold(0.0, |sum, &actual, &desired| {
            if actual != 0.0 {
                sum + desired * actual.ln()
            } else {
                sum
            }
        })
}

impl LossMode {
    /// Error term of one output component that the output delta is built from:
    /// `desired - output` for MSE, `desired / output` for cross-entropy.
    pub fn error_term(self, desired: f64, output: f64) -> f64 {
        match self {
            LossMode::Mse => desired - output,
            LossMode::CrossEntropy => {
                if output != 0.0 {
                    desired / output
                } else {
                    ZERO_OUTPUT_GUARD
                }
            }
        }
    }

    /// Output delta of an independent sigmoid neuron.
    pub fn sigmoid_delta(self, desired: f64, output: f64) -> f64 {
        match self {
            LossMode::Mse => -(desired - output) * output * (1.0 - output),
            LossMode::CrossEntropy if output == 0.0 => ZERO_OUTPUT_GUARD,
            LossMode::CrossEntropy => -(desired / output) * output * (1.0 - output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn compute_mse() {
        let actual = arr1(&[1.0, 0.5, -0.1]);
        let desired = arr1(&[1.0, 0.0, 0.0]);
        assert_relative_eq!(
            0.08666666666666667,
            mean_squared_error(actual.view(), desired.view())
        );
    }

    #[test]
    fn log_likelihood_skips_zero_outputs() {
        let actual = arr1(&[0.5, 0.0, 0.25]);
        let desired = arr1(&[1.0, 1.0, 0.0]);
        assert_relative_eq!(0.5f64.ln(), log_likelihood(actual.view(), desired.view()));
    }

    #[test]
    fn error_terms() {
        assert_relative_eq!(0.75, LossMode::Mse.error_term(1.0, 0.25));
        assert_relative_eq!(4.0, LossMode::CrossEntropy.error_term(1.0, 0.25));
        assert_eq!(ZERO_OUTPUT_GUARD, LossMode::CrossEntropy.error_term(1.0, 0.0));
    }

    #[test]
    fn sigmoid_deltas() {
        let o = 0.6224593312018546;
        assert_relative_eq!(o * o * (1.0 - o), LossMode::Mse.sigmoid_delta(0.0, o));
        assert_relative_eq!(-(1.0 - o), LossMode::CrossEntropy.sigmoid_delta(1.0, o));
        assert_eq!(ZERO_OUTPUT_GUARD, LossMode::CrossEntropy.sigmoid_delta(1.0, 0.0));
    }
}
