use ndarray::{Array1, ArrayView1, Zip};

use crate::{
    activation::{sigmoid_derivative, ActivationMode},
    data::Dataset,
    error::{Error, Result},
    layer::Layer,
    network::{LayerId, Network},
    optimizer::Optimizer,
};

impl Network {
    /// Compute the output layer's deltas against `desired`.
    ///
    /// In [`ActivationMode::Softmax`] the output buffer is first rebuilt from the output neurons
    /// and normalized, and every delta takes the whole Jacobian of the normalization into
    /// account.
    /// Nothing is modified when `desired` does not match the output width.
    pub fn compute_output_deltas(&mut self, desired: ArrayView1<f64>) -> Result<()> {
        self.check_desired(desired)?;

        let loss = self.loss();
        match self.activation() {
            ActivationMode::Sigmoid => {
                for (neuron, &desired) in self.output_layer.neurons_mut().iter_mut().zip(desired) {
                    neuron.delta = loss.sigmoid_delta(desired, neuron.output);
                }
            }
            ActivationMode::Softmax => {
                self.outputs = self.output_layer.outputs();
                self.apply_softmax();

                let outputs = &self.outputs;
                let terms: Array1<f64> = Zip::from(&desired)
                    .and(outputs)
                    .map_collect(|&desired, &output| loss.error_term(desired, output));
                for (j, neuron) in self.output_layer.neurons_mut().iter_mut().enumerate() {
                    let output_j = outputs[j];
                    let sum: f64 = terms
                        .iter()
                        .zip(outputs.iter())
                        .enumerate()
                        .map(|(i, (&term, &output_i))| {
                            if i == j {
                                term * output_j * (1.0 - output_i)
                            } else {
                                -term * output_j * output_i
                            }
                        })
                        .sum();
                    neuron.delta = -sum;
                }
            }
        }
        Ok(())
    }

    /// Propagate the output deltas back through the hidden layers, last to first.
    pub fn compute_hidden_deltas(&mut self) {
        let last = self.hidden_layers.len() - 1;
        hidden_deltas(&mut self.hidden_layers[last], &self.output_layer);
        for index in (0..last).rev() {
            let (upstream, downstream) = self.hidden_layers.split_at_mut(index + 1);
            hidden_deltas(&mut upstream[index], &downstream[0]);
        }
    }

    /// Add `delta * upstream_output` to every weight change, and `delta` to every bias change
    /// when bias is enabled.
    pub fn accumulate_changes(&mut self) {
        let use_bias = self.use_bias();
        for index in 0..self.hidden_layers.len() {
            let upstream = self.upstream_outputs(LayerId::Hidden(index));
            for neuron in self.hidden_layers[index].neurons_mut() {
                neuron.accumulate_changes(upstream.view(), use_bias);
            }
        }
        let upstream = self.upstream_outputs(LayerId::Output);
        for neuron in self.output_layer.neurons_mut() {
            neuron.accumulate_changes(upstream.view(), use_bias);
        }
    }

    /// Zero every weight and bias change accumulator.
    pub fn clear_changes(&mut self) {
        for neuron in self.neurons_mut() {
            neuron.clear_changes();
        }
    }

    /// Apply the accumulated changes with momentum.
    pub fn update_weights(&mut self) {
        let optimizer = self.optimizer;
        let use_bias = self.use_bias();
        for neuron in self.neurons_mut() {
            optimizer.update(neuron, use_bias);
        }
    }

    /// Feed one example, propagate it and add its gradient to the accumulators.
    fn backpropagate(&mut self, input: ArrayView1<f64>, desired: ArrayView1<f64>) -> Result<()> {
        self.check_desired(desired)?;
        self.feed(input);
        self.propagate();
        self.compute_output_deltas(desired)?;
        self.compute_hidden_deltas();
        self.accumulate_changes();
        Ok(())
    }

    /// One online step: learn from a single example and update the weights immediately.
    pub fn online_step(&mut self, input: ArrayView1<f64>, desired: ArrayView1<f64>) -> Result<()> {
        self.check_desired(desired)?;
        self.clear_changes();
        self.backpropagate(input, desired)?;
        self.update_weights();
        Ok(())
    }

    /// One online step per example of `dataset`, in dataset order.
    pub fn online_epoch(&mut self, dataset: &Dataset) -> Result<()> {
        self.check_dataset(dataset)?;
        for (input, desired) in dataset.iter() {
            self.online_step(input, desired)?;
        }
        Ok(())
    }

    /// Accumulate the gradient of the whole `dataset`, then update the weights once.
    pub fn offline_epoch(&mut self, dataset: &Dataset) -> Result<()> {
        self.check_dataset(dataset)?;
        self.clear_changes();
        for (input, desired) in dataset.iter() {
            self.backpropagate(input, desired)?;
        }
        self.update_weights();
        Ok(())
    }

    pub(crate) fn check_desired(&self, desired: ArrayView1<f64>) -> Result<()> {
        if desired.len() != self.output_size() {
            return Err(Error::ShapeMismatch {
                what: "desired outputs",
                expected: self.output_size(),
                actual: desired.len(),
            });
        }
        Ok(())
    }
}

fn hidden_deltas(layer: &mut Layer, downstream: &Layer) {
    for (index, neuron) in layer.neurons_mut().iter_mut().enumerate() {
        neuron.delta = sigmoid_derivative(neuron.output) * downstream.backward_error(index);
    }
}
