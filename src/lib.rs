pub mod activation;
pub mod backprop;
pub mod config;
pub mod data;
pub mod error;
pub mod experiment;
pub mod layer;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod neuron;
pub mod optimizer;
pub mod train;

pub use activation::ActivationMode;
pub use config::{NetworkConfig, TrainConfig};
pub use data::Dataset;
pub use error::{Error, Result};
pub use experiment::{ExperimentReport, RepetitionReport};
pub use loss::LossMode;
pub use metrics::Summary;
pub use network::{LayerId, Network};
pub use neuron::Neuron;
pub use train::{Epoch, TrainOutcome, TrainReport};

#[macro_export]
macro_rules! assert_rel_eq_arr1 {
    ($actual:expr, $expected:expr) => {
        assert_eq!($actual.len(), $expected.len());
        ndarray::Zip::from(&$actual)
            .and(&$expected)
            .for_each(|v, w| {
                assert_relative_eq!(v, w, epsilon = 1e-10);
            });
    };
}
