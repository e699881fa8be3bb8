use ndarray::{Array1, ArrayView1};

use crate::{
    activation::ActivationMode,
    data::Dataset,
    error::{Error, Result},
    loss::{log_likelihood, mean_squared_error, LossMode},
    network::Network,
};

/// Compute the fraction of `y_pred` equal to the correct labels `y_true`.
pub fn accuracy<Label>(y_true: &[Label], y_pred: &[Label]) -> f64
where
    Label: PartialEq,
{
    let n_corrects = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    n_corrects as f64 / y_true.len() as f64
}

/// Mean and population standard deviation of a series of errors.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Summary::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let mean_of_squares = values.iter().map(|v| v.powi(2)).sum::<f64>() / n;
        let std_dev = (mean_of_squares - mean.powi(2)).sqrt();
        Self {
            mean,
            // Rounding can push the variance of equal values slightly below zero.
            std_dev: if std_dev.is_nan() { 0.0 } else { std_dev },
        }
    }
}

/// How the output buffer is post-processed before it is scored.
#[derive(Clone, Copy)]
enum Scoring {
    Raw,
    Normalized,
    Predicted,
}

impl Network {
    /// Mean squared error between the current output buffer and `desired`.
    pub fn mean_squared_error(&self, desired: ArrayView1<f64>) -> Result<f64> {
        self.check_desired(desired)?;
        Ok(mean_squared_error(self.outputs(), desired))
    }

    /// Mean over `dataset` of the per-example squared error. In softmax mode the outputs are
    /// normalized and turned into predictions first.
    pub fn dataset_mean_squared_error(&mut self, dataset: &Dataset) -> Result<f64> {
        self.check_dataset(dataset)?;
        let scoring = self.scoring(Scoring::Predicted);
        let mut sum = 0.0;
        for (input, desired) in dataset.iter() {
            self.evaluate(input, scoring);
            sum += mean_squared_error(self.outputs(), desired);
        }
        Ok(sum / dataset.len() as f64)
    }

    /// `-(1 / (N·K)) Σ_examples Σ_k desired_k · ln(output_k)`, skipping zero outputs.
    /// In softmax mode the outputs are normalized first.
    pub fn cross_entropy(&mut self, dataset: &Dataset) -> Result<f64> {
        self.check_dataset(dataset)?;
        let scoring = self.scoring(Scoring::Normalized);
        let mut sum = 0.0;
        for (input, desired) in dataset.iter() {
            self.evaluate(input, scoring);
            sum += log_likelihood(self.outputs(), desired);
        }
        Ok(-sum / (dataset.len() * dataset.outputs_len()) as f64)
    }

    /// Correct classification rate: the fraction of examples whose output is exactly the
    /// desired vector. In softmax mode the outputs are normalized and turned into predictions.
    pub fn ccr(&mut self, dataset: &Dataset) -> Result<f64> {
        self.check_dataset(dataset)?;
        let scoring = self.scoring(Scoring::Predicted);
        let (y_true, y_pred): (Vec<Array1<f64>>, Vec<Array1<f64>>) = dataset
            .iter()
            .map(|(input, desired)| {
                self.evaluate(input, scoring);
                (desired.to_owned(), self.outputs().to_owned())
            })
            .unzip();
        Ok(accuracy(&y_true, &y_pred))
    }

    /// The value training minimizes: dataset MSE or cross-entropy, per the loss mode.
    pub fn objective(&mut self, dataset: &Dataset) -> Result<f64> {
        match self.loss() {
            LossMode::Mse => self.dataset_mean_squared_error(dataset),
            LossMode::CrossEntropy => self.cross_entropy(dataset),
        }
    }

    pub(crate) fn check_dataset(&self, dataset: &Dataset) -> Result<()> {
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }
        if dataset.outputs_len() != self.output_size() {
            return Err(Error::ShapeMismatch {
                what: "dataset outputs",
                expected: self.output_size(),
                actual: dataset.outputs_len(),
            });
        }
        Ok(())
    }

    fn scoring(&self, softmax_scoring: Scoring) -> Scoring {
        match self.activation() {
            ActivationMode::Sigmoid => Scoring::Raw,
            ActivationMode::Softmax => softmax_scoring,
        }
    }

    fn evaluate(&mut self, input: ArrayView1<f64>, scoring: Scoring) {
        self.feed(input);
        self.propagate();
        match scoring {
            Scoring::Raw => {}
            Scoring::Normalized => self.apply_softmax(),
            Scoring::Predicted => {
                self.apply_softmax();
                self.apply_prediction();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::arr1;

    use super::*;

    const DELTA: f64 = 1e-10;

    fn xor() -> Dataset {
        Dataset::parse("2 1 4\n1 -1 1\n-1 -1 0\n-1 1 1\n1 1 0\n").unwrap()
    }

    fn xor_2_outputs() -> Dataset {
        Dataset::parse("2 2 4\n1 -1 1 0\n-1 -1 0 1\n-1 1 1 0\n1 1 0 1\n").unwrap()
    }

    fn softmax_network() -> Network {
        let mut network = Network::with_topology(1, 2, 2).unwrap();
        network.set_activation(ActivationMode::Softmax);
        network
    }

    #[test]
    fn test_accuracy() {
        let y_true = vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];
        let y_pred = vec![0, 0, 0, 1, 0, 1, 1, 2, 0, 1, 1, 2];
        assert_relative_eq!(0.5, accuracy(&y_true, &y_pred))
    }

    #[test]
    fn single_example_mse() {
        let mut network = Network::with_topology(2, 2, 1).unwrap();
        network.feed(arr1(&[1.0, 0.0]).view());
        network.propagate();
        let output = network.outputs()[0];
        for desired in [0.0, 0.25, 0.9, 1.0] {
            assert_relative_eq!(
                (output - desired).powi(2),
                network.mean_squared_error(arr1(&[desired]).view()).unwrap(),
                epsilon = DELTA
            );
        }
    }

    #[test]
    fn single_example_mse_checks_width() {
        let network = Network::new();
        assert!(matches!(
            network.mean_squared_error(arr1(&[0.0, 1.0]).view()),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn dataset_mse_on_xor() {
        let mut network = Network::with_topology(2, 2, 1).unwrap();
        assert_relative_eq!(
            0.3388368051,
            network.dataset_mean_squared_error(&xor()).unwrap(),
            epsilon = DELTA
        );
    }

    #[test]
    fn dataset_mse_scores_predictions_in_softmax_mode() {
        // Identical output neurons always predict the first class.
        let mut network = softmax_network();
        assert_relative_eq!(
            0.5,
            network.dataset_mean_squared_error(&xor_2_outputs()).unwrap()
        );
    }

    #[test]
    fn cross_entropy_of_single_example() {
        let mut network = Network::with_topology(1, 1, 1).unwrap();
        let dataset = Dataset::parse("2 1 1\n0 0 1\n").unwrap();
        assert_relative_eq!(
            -(0.6224593312018546f64.ln()),
            network.cross_entropy(&dataset).unwrap(),
            epsilon = DELTA
        );
    }

    #[test]
    fn cross_entropy_normalizes_in_softmax_mode() {
        let mut network = softmax_network();
        assert_relative_eq!(
            -(0.5f64.ln()) / 2.0,
            network.cross_entropy(&xor_2_outputs()).unwrap(),
            epsilon = DELTA
        );
    }

    #[test]
    fn objective_follows_loss_mode() {
        let mut network = Network::with_topology(2, 2, 1).unwrap();
        let dataset = xor();
        let mse = network.dataset_mean_squared_error(&dataset).unwrap();
        let entropy = network.cross_entropy(&dataset).unwrap();
        assert_relative_eq!(mse, network.objective(&dataset).unwrap());
        network.set_loss(LossMode::CrossEntropy);
        assert_relative_eq!(entropy, network.objective(&dataset).unwrap());
    }

    #[test]
    fn ccr_in_softmax_mode() {
        let mut network = softmax_network();
        assert_relative_eq!(0.5, network.ccr(&xor_2_outputs()).unwrap());
    }

    #[test]
    fn ccr_compares_raw_outputs_in_sigmoid_mode() {
        let mut network = Network::with_topology(1, 2, 2).unwrap();
        assert_relative_eq!(0.0, network.ccr(&xor_2_outputs()).unwrap());
    }

    #[test]
    fn ccr_matches_manual_count() {
        let mut network = softmax_network();
        network.set_use_bias(true);
        network.randomize_weights();
        let dataset = xor_2_outputs();

        let mut correct = 0.0;
        for (input, desired) in dataset.iter() {
            network.feed(input);
            network.propagate();
            network.apply_softmax();
            network.apply_prediction();
            if network.outputs() == desired {
                correct += 1.0;
            }
        }
        assert_relative_eq!(
            correct / dataset.len() as f64,
            network.ccr(&dataset).unwrap()
        );
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let mut network = Network::new();
        let dataset = Dataset::new(1, 1);
        assert!(matches!(
            network.dataset_mean_squared_error(&dataset),
            Err(Error::EmptyDataset)
        ));
        assert!(matches!(network.cross_entropy(&dataset), Err(Error::EmptyDataset)));
        assert!(matches!(network.ccr(&dataset), Err(Error::EmptyDataset)));
    }

    #[test]
    fn mismatched_dataset_is_rejected() {
        let mut network = Network::new();
        assert!(matches!(
            network.dataset_mean_squared_error(&xor_2_outputs()),
            Err(Error::ShapeMismatch { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn summary_of_errors() {
        let summary = Summary::of(&[1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(2.5, summary.mean);
        assert_relative_eq!(1.118033988749895, summary.std_dev);
    }

    #[test]
    fn summary_of_constant_errors_has_no_deviation() {
        let summary = Summary::of(&[0.1, 0.1, 0.1]);
        assert_relative_eq!(0.1, summary.mean);
        assert!(summary.std_dev >= 0.0 && summary.std_dev < 1e-8);
        assert_eq!(Summary::default(), Summary::of(&[]));
    }
}
