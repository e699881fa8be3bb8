//! Train multilayer perceptrons on a dataset file and report their errors.
//!
//! Run with: cargo run --bin mlp -- --train tests/data/xor.dat --bias --hidden-neurons 4

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use perceptron::{
    experiment, ActivationMode, Dataset, LossMode, NetworkConfig, RepetitionReport, TrainConfig,
};

#[derive(Parser, Debug)]
#[command(name = "mlp", about = "Train a multilayer perceptron by backpropagation")]
struct Args {
    /// Training dataset
    #[arg(long)]
    train: PathBuf,

    /// Test dataset, evaluated after each training
    #[arg(long)]
    test: Option<PathBuf>,

    /// Number of hidden layers
    #[arg(long, default_value_t = 1)]
    hidden_layers: usize,

    /// Neurons in each hidden layer
    #[arg(long, default_value_t = 1)]
    hidden_neurons: usize,

    #[arg(long, default_value_t = perceptron::network::DEFAULT_LEARNING_RATE)]
    learning_rate: f64,

    #[arg(long, default_value_t = perceptron::network::DEFAULT_MOMENTUM)]
    momentum: f64,

    /// Upper bound on epochs per training
    #[arg(long, default_value_t = 1000)]
    max_iterations: usize,

    /// Stop once an epoch changes the error by less than this
    #[arg(long, default_value_t = 1e-5)]
    min_improvement: f64,

    /// Normalize the outputs and predict a single class
    #[arg(long)]
    softmax: bool,

    /// Minimize cross-entropy instead of mean squared error
    #[arg(long)]
    cross_entropy: bool,

    /// Give every neuron a trainable bias
    #[arg(long)]
    bias: bool,

    /// Update the weights once per epoch instead of once per example
    #[arg(long)]
    offline: bool,

    /// Independent trainings to average over
    #[arg(long, default_value_t = 1)]
    repetitions: usize,

    /// Print the last trained network
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let train_data = Dataset::load(&args.train)
        .with_context(|| format!("failed to load training data from {}", args.train.display()))?;
    let test_data = args
        .test
        .as_ref()
        .map(|path| {
            Dataset::load(path)
                .with_context(|| format!("failed to load test data from {}", path.display()))
        })
        .transpose()?;

    let network_config = NetworkConfig {
        hidden_layers: args.hidden_layers,
        hidden_neurons: args.hidden_neurons,
        output_neurons: train_data.outputs_len(),
        learning_rate: args.learning_rate,
        momentum: args.momentum,
        use_bias: args.bias,
        activation: if args.softmax {
            ActivationMode::Softmax
        } else {
            ActivationMode::Sigmoid
        },
        loss: if args.cross_entropy {
            LossMode::CrossEntropy
        } else {
            LossMode::Mse
        },
    };
    let train_config = TrainConfig {
        max_iterations: args.max_iterations,
        min_improvement: args.min_improvement,
        offline: args.offline,
        repetitions: args.repetitions,
    };

    let report = experiment::run(
        &network_config,
        &train_config,
        &train_data,
        test_data.as_ref(),
        print_repetition,
    )
    .context("experiment failed")?;

    println!(
        "Train error: {:.6} +- {:.6}",
        report.train.mean, report.train.std_dev
    );
    if let Some(test) = report.test {
        println!("Test error: {:.6} +- {:.6}", test.mean, test.std_dev);
    }
    if args.dump {
        println!();
        print!("{}", report.network);
    }
    Ok(())
}

fn print_repetition(report: &RepetitionReport) {
    match report.test_error {
        Some(test_error) => println!(
            "Repetition {}: {} epochs, train error {:.6}, test error {:.6}",
            report.repetition + 1,
            report.train.iterations,
            report.train_error,
            test_error
        ),
        None => println!(
            "Repetition {}: {} epochs, train error {:.6}",
            report.repetition + 1,
            report.train.iterations,
            report.train_error
        ),
    }
}
