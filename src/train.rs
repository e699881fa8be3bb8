use std::ops::ControlFlow;

use ndarray::Array1;
use tracing::{debug, info, warn};

use crate::{config::TrainConfig, data::Dataset, error::Result, network::Network};

/// Why a training run ended. Every variant is a successful run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainOutcome {
    MaxIterationsReached,
    /// An epoch changed the objective by less than the minimum improvement.
    ConvergedEarly,
    /// The progress callback asked to stop.
    Stopped,
}

/// Progress of one finished epoch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Epoch {
    /// 1-based.
    pub iteration: usize,
    pub error_before: f64,
    pub error_after: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainReport {
    pub outcome: TrainOutcome,
    /// Epochs actually run.
    pub iterations: usize,
    /// Objective right after the weights were randomized.
    pub initial_error: f64,
    pub final_error: f64,
}

impl Network {
    /// Train on `dataset` from freshly randomized weights.
    ///
    /// Each epoch is one online or offline pass over the dataset, as `config.offline` says.
    /// `on_epoch` sees every finished epoch and can stop training by returning
    /// [`ControlFlow::Break`]. The objective is the dataset MSE or cross-entropy, following the
    /// network's loss mode.
    pub fn train<F>(
        &mut self,
        dataset: &Dataset,
        config: &TrainConfig,
        mut on_epoch: F,
    ) -> Result<TrainReport>
    where
        F: FnMut(&Epoch) -> ControlFlow<()>,
    {
        config.validate()?;
        self.check_dataset(dataset)?;
        info!(
            examples = dataset.len(),
            max_iterations = config.max_iterations,
            offline = config.offline,
            "training started"
        );

        // Connect to the dataset's inputs first so that every weight gets randomized.
        self.feed(Array1::<f64>::zeros(dataset.inputs_len()).view());
        self.randomize_weights();
        let initial_error = self.objective(dataset)?;
        let mut error = initial_error;
        let mut iterations = 0;
        let mut outcome = TrainOutcome::MaxIterationsReached;

        while iterations < config.max_iterations {
            let error_before = error;
            if config.offline {
                self.offline_epoch(dataset)?;
            } else {
                self.online_epoch(dataset)?;
            }
            error = self.objective(dataset)?;
            iterations += 1;

            let epoch = Epoch {
                iteration: iterations,
                error_before,
                error_after: error,
            };
            debug!(iteration = iterations, error_before, error_after = error, "epoch");
            if !error.is_finite() {
                warn!(iteration = iterations, error, "objective is not finite");
            }

            let flow = on_epoch(&epoch);
            if (error - error_before).abs() < config.min_improvement {
                outcome = TrainOutcome::ConvergedEarly;
                break;
            }
            if flow.is_break() {
                outcome = TrainOutcome::Stopped;
                break;
            }
        }

        info!(?outcome, iterations, initial_error, final_error = error, "training finished");
        Ok(TrainReport {
            outcome,
            iterations,
            initial_error,
            final_error: error,
        })
    }

    /// [`Network::train`] with one update per example.
    pub fn train_online<F>(
        &mut self,
        dataset: &Dataset,
        max_iterations: usize,
        min_improvement: f64,
        on_epoch: F,
    ) -> Result<TrainReport>
    where
        F: FnMut(&Epoch) -> ControlFlow<()>,
    {
        let config = TrainConfig {
            max_iterations,
            min_improvement,
            offline: false,
            ..Default::default()
        };
        self.train(dataset, &config, on_epoch)
    }

    /// [`Network::train`] with one update per pass over the dataset.
    pub fn train_offline<F>(
        &mut self,
        dataset: &Dataset,
        max_iterations: usize,
        min_improvement: f64,
        on_epoch: F,
    ) -> Result<TrainReport>
    where
        F: FnMut(&Epoch) -> ControlFlow<()>,
    {
        let config = TrainConfig {
            max_iterations,
            min_improvement,
            offline: true,
            ..Default::default()
        };
        self.train(dataset, &config, on_epoch)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    use crate::{error::Error, network::LayerId};

    fn xor() -> Dataset {
        Dataset::parse("2 1 4\n1 -1 1\n-1 -1 0\n-1 1 1\n1 1 0\n").unwrap()
    }

    fn network() -> Network {
        let mut network = Network::with_topology(1, 4, 1).unwrap();
        network.set_use_bias(true);
        network
    }

    #[test]
    fn runs_until_max_iterations() {
        let mut network = network();
        let mut seen = Vec::new();
        let report = network
            .train_online(&xor(), 25, 0.0, |epoch| {
                seen.push(epoch.iteration);
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(TrainOutcome::MaxIterationsReached, report.outcome);
        assert_eq!(25, report.iterations);
        assert_eq!((1..=25).collect::<Vec<_>>(), seen);
    }

    #[test]
    fn converges_early_on_small_improvement() {
        let mut network = network();
        let report = network
            .train_offline(&xor(), 100, 10.0, |_| ControlFlow::Continue(()))
            .unwrap();
        assert_eq!(TrainOutcome::ConvergedEarly, report.outcome);
        assert_eq!(1, report.iterations);
    }

    #[test]
    fn callback_can_stop_training() {
        let mut network = network();
        let report = network
            .train_online(&xor(), 100, 0.0, |epoch| {
                if epoch.iteration == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(TrainOutcome::Stopped, report.outcome);
        assert_eq!(3, report.iterations);
    }

    #[test]
    fn zero_iterations_only_randomizes() {
        let mut network = network();
        let report = network
            .train_online(&xor(), 0, 0.0, |_| ControlFlow::Continue(()))
            .unwrap();
        assert_eq!(0, report.iterations);
        assert_eq!(report.initial_error, report.final_error);
    }

    #[test]
    fn epochs_chain_their_errors() {
        let mut network = network();
        let dataset = xor();
        let mut epochs = Vec::new();
        let report = network
            .train_offline(&dataset, 10, 0.0, |epoch| {
                epochs.push(*epoch);
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_relative_eq!(report.initial_error, epochs[0].error_before);
        for pair in epochs.windows(2) {
            assert_eq!(pair[0].error_after, pair[1].error_before);
        }
        let last = epochs[epochs.len() - 1];
        assert_eq!(report.final_error, last.error_after);
        assert_relative_eq!(report.final_error, network.objective(&dataset).unwrap());
    }

    #[test]
    fn randomizes_every_input_connection() {
        let mut network = Network::with_topology(1, 4, 1).unwrap();
        network
            .train_online(&xor(), 0, 0.0, |_| ControlFlow::Continue(()))
            .unwrap();
        let layer = network.layer(LayerId::Hidden(0)).unwrap();
        for neuron in layer.neurons() {
            assert_eq!(2, neuron.num_connections());
        }
        assert!(layer.neurons().iter().any(|neuron| neuron.weights()[1] != 1.0));
    }

    #[test]
    fn rejects_mismatched_dataset() {
        let mut network = Network::with_topology(1, 2, 3).unwrap();
        let result = network.train_online(&xor(), 10, 0.0, |_| ControlFlow::Continue(()));
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn rejects_negative_min_improvement() {
        let mut network = network();
        let result = network.train_online(&xor(), 10, -1.0, |_| ControlFlow::Continue(()));
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }
}
