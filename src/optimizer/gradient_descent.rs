use crate::{
    error::{Error, Result},
    network::{DEFAULT_LEARNING_RATE, DEFAULT_MOMENTUM},
    neuron::Neuron,
    optimizer::Optimizer,
};

use ndarray::Zip;

/// Gradient descent with momentum:
/// `w -= learning_rate * change + learning_rate * momentum * last_change`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientDescent {
    learning_rate: f64,
    momentum: f64,
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            momentum: DEFAULT_MOMENTUM,
        }
    }
}

impl GradientDescent {
    pub fn new(learning_rate: f64, momentum: f64) -> Result<Self> {
        let mut optimizer = GradientDescent::default();
        optimizer.set_learning_rate(learning_rate)?;
        optimizer.set_momentum(momentum)?;
        Ok(optimizer)
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        check_unit_range("learning rate", learning_rate)?;
        self.learning_rate = learning_rate;
        Ok(())
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn set_momentum(&mut self, momentum: f64) -> Result<()> {
        check_unit_range("momentum", momentum)?;
        self.momentum = momentum;
        Ok(())
    }
}

fn check_unit_range(name: &'static str, value: f64) -> Result<()> {
    // NaN fails the range check too.
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::out_of_unit_range(name, value))
    }
}

impl Optimizer for GradientDescent {
    fn update(&self, neuron: &mut Neuron, use_bias: bool) {
        let rate = self.learning_rate;
        let inertia = self.learning_rate * self.momentum;
        Zip::from(&mut neuron.weights)
            .and(&neuron.weight_changes)
            .and(&neuron.last_weight_changes)
            .for_each(|weight, &change, &last_change| {
                *weight -= rate * change + inertia * last_change;
            });
        if use_bias {
            neuron.bias -= rate * neuron.bias_change + inertia * neuron.last_bias_change;
        }
        neuron.last_weight_changes.assign(&neuron.weight_changes);
        neuron.last_bias_change = neuron.bias_change;
    }
}
