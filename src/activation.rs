use ndarray::{Array1, ArrayView1};

/// Nonlinearity applied to the output layer and the delta formula that goes with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActivationMode {
    /// Every output neuron is an independent sigmoid.
    #[default]
    Sigmoid,
    /// Sigmoid outputs normalized by their sum. See [`normalize`].
    Softmax,
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Derivative of the sigmoid written in terms of its own output.
pub fn sigmoid_derivative(output: f64) -> f64 {
    output * (1.0 - output)
}

/// Divide every component by the sum of all components.
///
/// This is what the network calls "softmax": the outputs are already squashed by a sigmoid,
/// so no exponential is taken here. The delta computation for [`ActivationMode::Softmax`]
/// is derived against this exact normalization.
/// A vector summing to zero is left untouched.
pub fn normalize(outputs: &mut Array1<f64>) {
    let sum = outputs.sum();
    if sum != 0.0 {
        outputs.mapv_inplace(|v| v / sum);
    }
}

/// Index of the greatest component. Ties go to the lowest index.
pub fn argmax(outputs: ArrayView1<f64>) -> Option<usize> {
    outputs
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (index, &value)| match best {
            Some((_, best_value)) if value <= best_value => best,
            _ => Some((index, value)),
        })
        .map(|(index, _)| index)
}

/// Replace `outputs` by a one-hot vector marking its greatest component.
pub fn one_hot_prediction(outputs: &mut Array1<f64>) {
    if let Some(best) = argmax(outputs.view()) {
        outputs.fill(0.0);
        outputs[best] = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use crate::assert_rel_eq_arr1;

    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn sigmoid_compute() {
        let actual = arr1(&[-2.0, -1.0, 0.0, 1.0, 2.0]).mapv(sigmoid);
        let expected = arr1(&[
            0.1192029220221175,
            0.2689414213699951,
            0.5000000000000000,
            0.7310585786300049,
            0.8807970779778823,
        ]);
        assert_rel_eq_arr1!(actual, expected);
    }

    #[test]
    fn sigmoid_derivative_from_output() {
        let actual = arr1(&[-2.0, -1.0, 0.0, 1.0, 2.0]).mapv(|x| sigmoid_derivative(sigmoid(x)));
        let expected = arr1(&[
            0.1049935854035065,
            0.1966119332414819,
            0.2500000000000000,
            0.1966119332414819,
            0.1049935854035066,
        ]);
        assert_rel_eq_arr1!(actual, expected);
    }

    #[test]
    fn normalize_sums_to_one() {
        let mut outputs = arr1(&[0.1192029220221175, 0.7310585786300049, 0.5, 0.999]);
        normalize(&mut outputs);
        assert_relative_eq!(outputs.sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn normalize_is_not_exponential() {
        let mut outputs = arr1(&[0.2, 0.6]);
        normalize(&mut outputs);
        assert_rel_eq_arr1!(outputs, arr1(&[0.25, 0.75]));
    }

    #[test]
    fn normalize_zero_sum_is_untouched() {
        let mut outputs = arr1(&[0.0, 0.0]);
        normalize(&mut outputs);
        assert_eq!(outputs, arr1(&[0.0, 0.0]));
    }

    #[test]
    fn prediction_is_one_hot_at_maximum() {
        let mut outputs = arr1(&[0.2, 0.9, 0.4]);
        one_hot_prediction(&mut outputs);
        assert_eq!(outputs, arr1(&[0.0, 1.0, 0.0]));
    }

    #[test]
    fn prediction_tie_takes_first() {
        let mut outputs = arr1(&[0.3, 0.7, 0.7]);
        one_hot_prediction(&mut outputs);
        assert_eq!(outputs, arr1(&[0.0, 1.0, 0.0]));
    }

    #[test]
    fn prediction_with_non_positive_outputs() {
        let mut outputs = arr1(&[-0.5, -0.1, -0.3]);
        one_hot_prediction(&mut outputs);
        assert_eq!(outputs, arr1(&[0.0, 1.0, 0.0]));
    }
}
