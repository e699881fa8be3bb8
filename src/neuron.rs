use std::fmt;

use ndarray::{Array1, ArrayView1};

/// Weight given to a connection created by a resize.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Output of a neuron that has never been propagated, the midpoint of the sigmoid.
pub const INITIAL_OUTPUT: f64 = 0.5;

/// A single learnable unit with one weight per incoming connection.
///
/// `weights`, `weight_changes` and `last_weight_changes` always have the same length.
#[derive(Clone, Debug)]
pub struct Neuron {
    pub(crate) weights: Array1<f64>,
    pub(crate) bias: f64,
    pub(crate) output: f64,
    pub(crate) delta: f64,
    pub(crate) weight_changes: Array1<f64>,
    pub(crate) last_weight_changes: Array1<f64>,
    pub(crate) bias_change: f64,
    pub(crate) last_bias_change: f64,
}

impl Default for Neuron {
    fn default() -> Self {
        Neuron::new()
    }
}

impl Neuron {
    /// A neuron with no connections yet.
    pub fn new() -> Self {
        Self {
            weights: Array1::zeros(0),
            bias: 0.0,
            output: INITIAL_OUTPUT,
            delta: 0.0,
            weight_changes: Array1::zeros(0),
            last_weight_changes: Array1::zeros(0),
            bias_change: 0.0,
            last_bias_change: 0.0,
        }
    }

    pub fn with_weights(weights: Array1<f64>) -> Self {
        let n = weights.len();
        Self {
            weights,
            weight_changes: Array1::zeros(n),
            last_weight_changes: Array1::zeros(n),
            ..Neuron::new()
        }
    }

    pub fn weights(&self) -> ArrayView1<f64> {
        self.weights.view()
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn weight_changes(&self) -> ArrayView1<f64> {
        self.weight_changes.view()
    }

    pub fn last_weight_changes(&self) -> ArrayView1<f64> {
        self.last_weight_changes.view()
    }

    pub fn bias_change(&self) -> f64 {
        self.bias_change
    }

    pub fn num_connections(&self) -> usize {
        self.weights.len()
    }

    /// Make the neuron accept exactly `width` inputs.
    /// Surplus connections are dropped from the end; missing ones get [`DEFAULT_WEIGHT`]
    /// and zeroed gradient slots. Surviving weights keep their values.
    /// Returns whether anything changed.
    pub fn resize_connections(&mut self, width: usize) -> bool {
        if self.weights.len() == width {
            return false;
        }
        self.weights = resized(&self.weights, width, DEFAULT_WEIGHT);
        self.weight_changes = resized(&self.weight_changes, width, 0.0);
        self.last_weight_changes = resized(&self.last_weight_changes, width, 0.0);
        true
    }

    /// Weighted sum of `inputs`, plus the bias when enabled.
    pub fn net_input(&self, inputs: ArrayView1<f64>, use_bias: bool) -> f64 {
        let sum = self.weights.dot(&inputs);
        if use_bias {
            sum + self.bias
        } else {
            sum
        }
    }

    pub(crate) fn clear_changes(&mut self) {
        self.weight_changes.fill(0.0);
        self.bias_change = 0.0;
    }

    pub(crate) fn clear_history(&mut self) {
        self.clear_changes();
        self.last_weight_changes.fill(0.0);
        self.last_bias_change = 0.0;
    }

    /// Add this neuron's gradient for one example, given the values that fed it.
    pub(crate) fn accumulate_changes(&mut self, upstream: ArrayView1<f64>, use_bias: bool) {
        self.weight_changes.scaled_add(self.delta, &upstream);
        if use_bias {
            self.bias_change += self.delta;
        }
    }
}

fn resized(values: &Array1<f64>, width: usize, fill: f64) -> Array1<f64> {
    values
        .iter()
        .copied()
        .chain(std::iter::repeat(fill))
        .take(width)
        .collect()
}

impl fmt::Display for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.weights.is_empty() {
            write!(f, "(")?;
            for (i, weight) in self.weights.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} x i{}", weight, i)?;
            }
            write!(f, ") + ")?;
        }
        write!(f, "{} ---> {}", self.bias, self.output)
    }
}
