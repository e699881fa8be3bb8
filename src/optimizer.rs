mod gradient_descent;

use crate::neuron::Neuron;

pub use gradient_descent::GradientDescent;

/// Trait to abstract the weight update applied after gradients are accumulated.
pub trait Optimizer {
    fn update(&self, neuron: &mut Neuron, use_bias: bool);
}
