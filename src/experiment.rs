use std::ops::ControlFlow;

use rayon::prelude::*;
use tracing::info;

use crate::{
    config::{NetworkConfig, TrainConfig},
    data::Dataset,
    error::{Error, Result},
    metrics::Summary,
    train::TrainReport,
};

/// Result of one of the independent trainings of an experiment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepetitionReport {
    /// 0-based.
    pub repetition: usize,
    pub train: TrainReport,
    /// Objective on the training set after training.
    pub train_error: f64,
    /// Objective on the test set after training.
    pub test_error: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentReport {
    pub repetitions: Vec<RepetitionReport>,
    pub train: Summary,
    pub test: Option<Summary>,
    /// Dump of the network trained by the last repetition.
    pub network: String,
}

/// Trains `train_config.repetitions` networks built from `network_config` and summarizes how
/// well they fit `train_data` and, if given, `test_data`.
///
/// Repetitions run in parallel. `on_repetition` is called as each one finishes, so the order
/// of the calls is not the order of the repetitions.
pub fn run<F>(
    network_config: &NetworkConfig,
    train_config: &TrainConfig,
    train_data: &Dataset,
    test_data: Option<&Dataset>,
    on_repetition: F,
) -> Result<ExperimentReport>
where
    F: Fn(&RepetitionReport) + Sync,
{
    train_config.validate()?;
    if let Some(test_data) = test_data {
        if test_data.inputs_len() != train_data.inputs_len() {
            return Err(Error::ShapeMismatch {
                what: "test inputs",
                expected: train_data.inputs_len(),
                actual: test_data.inputs_len(),
            });
        }
    }
    info!(
        repetitions = train_config.repetitions,
        train_examples = train_data.len(),
        test_examples = test_data.map(Dataset::len),
        "experiment started"
    );

    let results = (0..train_config.repetitions)
        .into_par_iter()
        .map(|repetition| -> Result<(RepetitionReport, String)> {
            let mut network = network_config.build()?;
            let train = network.train(train_data, train_config, |_| ControlFlow::Continue(()))?;
            let train_error = network.objective(train_data)?;
            let test_error = test_data
                .map(|test_data| network.objective(test_data))
                .transpose()?;

            let report = RepetitionReport {
                repetition,
                train,
                train_error,
                test_error,
            };
            info!(
                repetition,
                iterations = train.iterations,
                train_error,
                test_error,
                "repetition finished"
            );
            on_repetition(&report);
            Ok((report, network.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    let network = results
        .last()
        .map(|(_, dump)| dump.clone())
        .unwrap_or_default();
    let repetitions = results
        .into_iter()
        .map(|(report, _)| report)
        .collect::<Vec<_>>();

    let train_errors = repetitions
        .iter()
        .map(|report| report.train_error)
        .collect::<Vec<_>>();
    let test_errors = repetitions
        .iter()
        .filter_map(|report| report.test_error)
        .collect::<Vec<_>>();
    let train = Summary::of(&train_errors);
    let test = test_data.map(|_| Summary::of(&test_errors));
    info!(
        train_mean = train.mean,
        train_std_dev = train.std_dev,
        test_mean = test.map(|s| s.mean),
        "experiment finished"
    );

    Ok(ExperimentReport {
        repetitions,
        train,
        test,
        network,
    })
}
