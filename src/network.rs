use std::fmt;

use ndarray::{Array1, ArrayView1};
use ndarray_rand::rand::{rngs::StdRng, SeedableRng};
use ndarray_rand::rand_distr::{Distribution, Uniform};
use ndarray_rand::RandomExt;
use tracing::trace;

use crate::{
    activation::{normalize, one_hot_prediction, sigmoid, ActivationMode},
    error::{Error, Result},
    layer::Layer,
    loss::LossMode,
    neuron::Neuron,
    optimizer::GradientDescent,
};

pub const DEFAULT_LEARNING_RATE: f64 = 0.9;
pub const DEFAULT_MOMENTUM: f64 = 0.1;

/// Address of a layer that holds neurons. The input layer is only a buffer and has none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerId {
    Hidden(usize),
    Output,
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerId::Hidden(index) => write!(f, "hidden layer {}", index),
            LayerId::Output => write!(f, "output layer"),
        }
    }
}

/// Fully connected feed-forward network of sigmoid neurons.
///
/// The input layer is a plain buffer, followed by at least one hidden layer and the output
/// layer. Every neuron's weight count is kept equal to the width of the layer before it.
#[derive(Debug)]
pub struct Network {
    inputs: Array1<f64>,
    pub(crate) hidden_layers: Vec<Layer>,
    pub(crate) output_layer: Layer,
    /// What callers read as the network's output. Post-processing rewrites this buffer,
    /// never the output neurons themselves.
    pub(crate) outputs: Array1<f64>,
    pub(crate) optimizer: GradientDescent,
    use_bias: bool,
    activation: ActivationMode,
    loss: LossMode,
    rng: StdRng,
}

// A clone gets its own generator, so it never draws the same weights as the original.
impl Clone for Network {
    fn clone(&self) -> Self {
        Self {
            inputs: self.inputs.clone(),
            hidden_layers: self.hidden_layers.clone(),
            output_layer: self.output_layer.clone(),
            outputs: self.outputs.clone(),
            optimizer: self.optimizer,
            use_bias: self.use_bias,
            activation: self.activation,
            loss: self.loss,
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::new()
    }
}

impl Network {
    /// One input, one hidden layer of one neuron and one output neuron.
    pub fn new() -> Self {
        let mut network = Self {
            inputs: Array1::zeros(1),
            hidden_layers: vec![Layer::new(1)],
            output_layer: Layer::new(1),
            outputs: Array1::zeros(0),
            optimizer: GradientDescent::default(),
            use_bias: false,
            activation: ActivationMode::default(),
            loss: LossMode::default(),
            rng: StdRng::from_entropy(),
        };
        network.outputs = network.output_layer.outputs();
        network.repair_connections();
        network
    }

    pub fn with_topology(
        hidden_layers: usize,
        hidden_neurons: usize,
        output_neurons: usize,
    ) -> Result<Self> {
        let mut network = Network::new();
        network.set_hidden_topology(hidden_layers, hidden_neurons)?;
        network.set_output_size(output_neurons)?;
        Ok(network)
    }

    /// Replace the hidden stack by `num_layers` layers of `neurons_per_layer` fresh neurons.
    pub fn set_hidden_topology(
        &mut self,
        num_layers: usize,
        neurons_per_layer: usize,
    ) -> Result<()> {
        check_positive("number of hidden layers", num_layers)?;
        check_positive("number of hidden neurons", neurons_per_layer)?;

        self.hidden_layers = (0..num_layers).map(|_| Layer::new(neurons_per_layer)).collect();
        self.repair_connections();
        Ok(())
    }

    /// Replace the output layer by `size` fresh neurons.
    pub fn set_output_size(&mut self, size: usize) -> Result<()> {
        check_positive("number of output neurons", size)?;

        self.output_layer = Layer::new(size);
        self.outputs = self.output_layer.outputs();
        self.connect_output_layer();
        Ok(())
    }

    /// Resize every neuron's connections to the width of the layer before it.
    /// Returns the number of neurons that were touched, so a second call returns 0.
    pub fn repair_connections(&mut self) -> usize {
        let mut resized = self.connect_input_layer();
        for index in 1..self.hidden_layers.len() {
            let width = self.hidden_layers[index - 1].len();
            resized += self.hidden_layers[index].connect(width);
        }
        resized + self.connect_output_layer()
    }

    fn connect_input_layer(&mut self) -> usize {
        let resized = self.hidden_layers[0].connect(self.inputs.len());
        if resized > 0 {
            trace!(width = self.inputs.len(), resized, "reconnected first hidden layer");
        }
        resized
    }

    fn connect_output_layer(&mut self) -> usize {
        let width = self.last_hidden_layer().len();
        let resized = self.output_layer.connect(width);
        if resized > 0 {
            trace!(width, resized, "reconnected output layer");
        }
        resized
    }

    /// Store a copy of `inputs`, reconnecting the first hidden layer if the width changed.
    pub fn feed(&mut self, inputs: ArrayView1<f64>) {
        self.inputs = inputs.to_owned();
        self.connect_input_layer();
    }

    /// Run the stored input through every layer and refresh the output buffer.
    pub fn propagate(&mut self) {
        let use_bias = self.use_bias;
        let mut upstream = self.inputs.clone();
        for layer in self.hidden_layers.iter_mut() {
            layer.forward(upstream.view(), use_bias, sigmoid);
            upstream = layer.outputs();
        }
        self.output_layer.forward(upstream.view(), use_bias, sigmoid);
        self.outputs = self.output_layer.outputs();
    }

    /// Divide the output buffer by its sum. Only the buffer changes, not the neurons.
    pub fn apply_softmax(&mut self) {
        normalize(&mut self.outputs);
    }

    /// Turn the output buffer into a one-hot vector at its greatest component.
    pub fn apply_prediction(&mut self) {
        one_hot_prediction(&mut self.outputs);
    }

    pub fn inputs(&self) -> ArrayView1<f64> {
        self.inputs.view()
    }

    pub fn outputs(&self) -> ArrayView1<f64> {
        self.outputs.view()
    }

    pub fn output(&self, index: usize) -> Option<f64> {
        self.outputs.get(index).copied()
    }

    /// Upstream values of `layer`: the input buffer for the first hidden layer, the outputs of
    /// the previous layer otherwise.
    pub(crate) fn upstream_outputs(&self, layer: LayerId) -> Array1<f64> {
        match layer {
            LayerId::Hidden(0) => self.inputs.clone(),
            LayerId::Hidden(index) => self.hidden_layers[index - 1].outputs(),
            LayerId::Output => self.last_hidden_layer().outputs(),
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        self.optimizer.set_learning_rate(learning_rate)
    }

    pub fn momentum(&self) -> f64 {
        self.optimizer.momentum()
    }

    pub fn set_momentum(&mut self, momentum: f64) -> Result<()> {
        self.optimizer.set_momentum(momentum)
    }

    pub fn use_bias(&self) -> bool {
        self.use_bias
    }

    pub fn set_use_bias(&mut self, use_bias: bool) {
        self.use_bias = use_bias;
    }

    pub fn activation(&self) -> ActivationMode {
        self.activation
    }

    pub fn set_activation(&mut self, activation: ActivationMode) {
        self.activation = activation;
    }

    pub fn loss(&self) -> LossMode {
        self.loss
    }

    pub fn set_loss(&mut self, loss: LossMode) {
        self.loss = loss;
    }

    pub fn num_hidden_layers(&self) -> usize {
        self.hidden_layers.len()
    }

    pub fn output_size(&self) -> usize {
        self.output_layer.len()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        match id {
            LayerId::Hidden(index) => self.hidden_layers.get(index),
            LayerId::Output => Some(&self.output_layer),
        }
    }

    pub fn layer_size(&self, id: LayerId) -> Option<usize> {
        self.layer(id).map(Layer::len)
    }

    pub(crate) fn last_hidden_layer(&self) -> &Layer {
        // The hidden stack is never empty: every way of building it checks for that.
        &self.hidden_layers[self.hidden_layers.len() - 1]
    }

    pub fn neuron(&self, layer: LayerId, index: usize) -> Result<&Neuron> {
        self.layer(layer)
            .and_then(|l| l.get(index))
            .ok_or(Error::NeuronOutOfRange { layer, index })
    }

    fn neuron_mut(&mut self, layer: LayerId, index: usize) -> Result<&mut Neuron> {
        let found = match layer {
            LayerId::Hidden(i) => self.hidden_layers.get_mut(i),
            LayerId::Output => Some(&mut self.output_layer),
        };
        found
            .and_then(|l| l.get_mut(index))
            .ok_or(Error::NeuronOutOfRange { layer, index })
    }

    /// Overwrite a neuron's weights. The new vector must keep the current length.
    pub fn set_neuron_weights(
        &mut self,
        layer: LayerId,
        index: usize,
        weights: ArrayView1<f64>,
    ) -> Result<()> {
        let neuron = self.neuron_mut(layer, index)?;
        if neuron.weights.len() != weights.len() {
            return Err(Error::ShapeMismatch {
                what: "neuron weights",
                expected: neuron.weights.len(),
                actual: weights.len(),
            });
        }
        neuron.weights.assign(&weights);
        Ok(())
    }

    pub fn set_bias(&mut self, layer: LayerId, index: usize, bias: f64) -> Result<()> {
        self.neuron_mut(layer, index)?.bias = bias;
        Ok(())
    }

    /// Draw every weight, and every bias when enabled, uniformly from `[-1, 1]`.
    /// Gradient accumulators and momentum history are cleared.
    pub fn randomize_weights(&mut self) {
        let distribution = Uniform::new_inclusive(-1.0, 1.0);
        let use_bias = self.use_bias;
        let rng = &mut self.rng;
        for layer in self
            .hidden_layers
            .iter_mut()
            .chain(std::iter::once(&mut self.output_layer))
        {
            for neuron in layer.neurons_mut() {
                neuron.weights =
                    Array1::random_using(neuron.weights.len(), distribution, &mut *rng);
                if use_bias {
                    neuron.bias = distribution.sample(&mut *rng);
                }
                neuron.clear_history();
            }
        }
    }

    pub(crate) fn neurons_mut(&mut self) -> impl Iterator<Item = &mut Neuron> + '_ {
        self.hidden_layers
            .iter_mut()
            .chain(std::iter::once(&mut self.output_layer))
            .flat_map(|layer| layer.neurons_mut().iter_mut())
    }
}

fn check_positive(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        Err(Error::InvalidParameter {
            name,
            reason: "must be at least 1".to_string(),
        })
    } else {
        Ok(())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Learning rate: {}", self.learning_rate())?;
        writeln!(f, "Momentum: {}", self.momentum())?;
        writeln!(f, "Number of hidden layers: {}", self.num_hidden_layers())?;
        writeln!(f, "Size of hidden layers: {}", self.hidden_layers[0].len())?;
        writeln!(f, "Size of output layer: {}", self.output_size())?;
        writeln!(f)?;
        for (i, layer) in self.hidden_layers.iter().enumerate() {
            writeln!(f, "Layer {} of {}", i + 1, self.num_hidden_layers())?;
            for (j, neuron) in layer.neurons().iter().enumerate() {
                writeln!(f, "\tneuron {}: {}", j, neuron)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Output layer")?;
        for (j, neuron) in self.output_layer.neurons().iter().enumerate() {
            writeln!(f, "\tneuron {}: {}", j, neuron)?;
        }
        Ok(())
    }
}
