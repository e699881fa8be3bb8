use crate::{
    activation::ActivationMode,
    error::{Error, Result},
    loss::LossMode,
    network::{Network, DEFAULT_LEARNING_RATE, DEFAULT_MOMENTUM},
};

/// Everything needed to build a network before it sees any data.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkConfig {
    pub hidden_layers: usize,
    pub hidden_neurons: usize,
    pub output_neurons: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    pub use_bias: bool,
    pub activation: ActivationMode,
    pub loss: LossMode,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden_layers: 1,
            hidden_neurons: 1,
            output_neurons: 1,
            learning_rate: DEFAULT_LEARNING_RATE,
            momentum: DEFAULT_MOMENTUM,
            use_bias: false,
            activation: ActivationMode::Sigmoid,
            loss: LossMode::Mse,
        }
    }
}

impl NetworkConfig {
    pub fn build(&self) -> Result<Network> {
        let mut network =
            Network::with_topology(self.hidden_layers, self.hidden_neurons, self.output_neurons)?;
        network.set_learning_rate(self.learning_rate)?;
        network.set_momentum(self.momentum)?;
        network.set_use_bias(self.use_bias);
        network.set_activation(self.activation);
        network.set_loss(self.loss);
        Ok(network)
    }
}

/// Parameters of the training loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainConfig {
    /// Upper bound on the number of epochs.
    pub max_iterations: usize,
    /// Training stops once an epoch changes the objective by less than this.
    pub min_improvement: f64,
    /// Batch backpropagation instead of one update per example.
    pub offline: bool,
    /// Independent trainings run by an experiment.
    pub repetitions: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            min_improvement: 1e-5,
            offline: false,
            repetitions: 1,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_improvement.is_finite() && self.min_improvement >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "minimum improvement",
                reason: format!("must be a non-negative number, got {}", self.min_improvement),
            });
        }
        if self.repetitions == 0 {
            return Err(Error::InvalidParameter {
                name: "repetitions",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    use crate::network::LayerId;

    #[test]
    fn build_network() {
        let config = NetworkConfig {
            hidden_layers: 2,
            hidden_neurons: 5,
            output_neurons: 3,
            learning_rate: 0.2,
            momentum: 0.7,
            use_bias: true,
            activation: ActivationMode::Softmax,
            loss: LossMode::CrossEntropy,
        };
        let network = config.build().unwrap();
        assert_eq!(2, network.num_hidden_layers());
        assert_eq!(Some(5), network.layer_size(LayerId::Hidden(1)));
        assert_eq!(3, network.output_size());
        assert_relative_eq!(0.2, network.learning_rate());
        assert_relative_eq!(0.7, network.momentum());
        assert!(network.use_bias());
        assert_eq!(ActivationMode::Softmax, network.activation());
        assert_eq!(LossMode::CrossEntropy, network.loss());
    }

    #[test]
    fn build_rejects_invalid_values() {
        let config = NetworkConfig {
            learning_rate: 2.0,
            ..Default::default()
        };
        assert!(matches!(config.build(), Err(Error::InvalidParameter { .. })));

        let config = NetworkConfig {
            hidden_neurons: 0,
            ..Default::default()
        };
        assert!(matches!(config.build(), Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn validate_train_config() {
        assert!(TrainConfig::default().validate().is_ok());
        for min_improvement in [-1.0, f64::NAN, f64::INFINITY] {
            let config = TrainConfig {
                min_improvement,
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
        let config = TrainConfig {
            repetitions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
