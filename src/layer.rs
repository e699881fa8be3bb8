use ndarray::{Array1, ArrayView1};

use crate::neuron::Neuron;

/// Ordered group of neurons fed by the same upstream source.
#[derive(Clone, Debug, Default)]
pub struct Layer {
    neurons: Vec<Neuron>,
}

impl Layer {
    /// `size` freshly constructed, unconnected neurons.
    pub fn new(size: usize) -> Self {
        Self {
            neurons: (0..size).map(|_| Neuron::new()).collect(),
        }
    }

    pub fn from_neurons(neurons: Vec<Neuron>) -> Self {
        Self { neurons }
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn neurons_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons
    }

    pub fn get(&self, index: usize) -> Option<&Neuron> {
        self.neurons.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Neuron> {
        self.neurons.get_mut(index)
    }

    /// Fit every neuron to an upstream layer `width` values wide.
    /// Returns how many neurons had to be resized; a second call always returns 0.
    pub fn connect(&mut self, width: usize) -> usize {
        self.neurons
            .iter_mut()
            .map(|neuron| neuron.resize_connections(width))
            .filter(|&resized| resized)
            .count()
    }

    /// Snapshot of the current outputs, in neuron order.
    pub fn outputs(&self) -> Array1<f64> {
        self.neurons.iter().map(Neuron::output).collect()
    }

    /// Compute every neuron's output from the values of the upstream layer.
    pub fn forward(&mut self, inputs: ArrayView1<f64>, use_bias: bool, activation: fn(f64) -> f64) {
        for neuron in self.neurons.iter_mut() {
            neuron.output = activation(neuron.net_input(inputs, use_bias));
        }
    }

    /// `Σ_j delta_j · weight_j[index]` over this layer, i.e. the error this layer sends back to
    /// upstream neuron `index`.
    pub fn backward_error(&self, index: usize) -> f64 {
        self.neurons
            .iter()
            .map(|neuron| neuron.delta * neuron.weights[index])
            .sum()
    }
}
