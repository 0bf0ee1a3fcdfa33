use serde::{Serialize, Deserialize};

use crate::loss::loss_type::LossType;

/// Source of the gradient handed to the output layer's `backward`.
///
/// - `Residual`     — always `predicted - expected`, whatever loss is reported
/// - `LossBackward` — the configured loss's own `backward`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientSeed {
    #[default]
    Residual,
    LossBackward,
}

/// Configuration for a `train_sgd` run.
///
/// # Fields
/// - `learning_rate` — step size of every gradient-descent update
/// - `epochs`        — total number of full passes over the samples
/// - `batch_size`    — samples per mini-batch; must equal the network's batch size
/// - `loss`          — loss reported per epoch (and used as seed with `LossBackward`)
/// - `seed_mode`     — how the output gradient is derived
/// - `shuffle`       — reshuffle sample order at the start of every epoch
/// - `seed`          — rng seed for shuffling; entropy-seeded when `None`
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub loss: LossType,
    pub seed_mode: GradientSeed,
    pub shuffle: bool,
    pub seed: Option<u64>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with the residual seed and no shuffling.
    pub fn new(learning_rate: f64, epochs: usize, batch_size: usize, loss: LossType) -> Self {
        TrainConfig {
            learning_rate,
            epochs,
            batch_size,
            loss,
            seed_mode: GradientSeed::Residual,
            shuffle: false,
            seed: None,
        }
    }
}
