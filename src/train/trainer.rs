use std::time::Instant;

use log::{info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::{NnError, Result};
use crate::loss::{loss_type::LossType, mse::MseLoss};
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::{GradientSeed, TrainConfig};

// ---------------------------------------------------------------------------
// Single step
// ---------------------------------------------------------------------------

/// One forward / backward / update cycle seeded with the residual
/// `y - t`. Returns the MSE of the forward pass.
pub fn train_step(network: &mut Network, x: &[f64], t: &[f64], rate: f64) -> Result<f64> {
    train_step_with(network, x, t, rate, LossType::Mse, GradientSeed::Residual)
}

/// One forward / backward / update cycle.
///
/// `loss` is the value reported back; `seed` picks whether the output
/// gradient is the residual `y - t` or `loss`'s own backward.
pub fn train_step_with(
    network: &mut Network,
    x: &[f64],
    t: &[f64],
    rate: f64,
    loss: LossType,
    seed: GradientSeed,
) -> Result<f64> {
    let (dy, value) = {
        let y = network.forward(x)?;
        if t.len() != y.len() {
            return Err(NnError::invalid(format!(
                "target holds {} values, network produces {}", t.len(), y.len()
            )));
        }
        let mut dy = vec![0.0; y.len()];
        match seed {
            GradientSeed::Residual     => MseLoss::backward(&mut dy, y, t),
            GradientSeed::LossBackward => loss.backward(&mut dy, y, t),
        }
        (dy, loss.forward(y, t))
    };

    network.backward(&dy)?;
    network.update(rate)?;

    Ok(value)
}

// ---------------------------------------------------------------------------
// Mini-batch SGD
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs of mini-batch SGD and returns
/// the statistics of every epoch.
///
/// # Arguments
/// - `network` — initialised network; its batch size must equal `config.batch_size`
/// - `inputs`  — samples, each holding the input layer's `in` values
/// - `targets` — expected outputs, same length as `inputs`
/// - `config`  — hyperparameters
///
/// Each mini-batch stacks `batch_size` consecutive samples (in shuffled order
/// when `config.shuffle` is set) into one network call. Samples left over
/// after the last full batch are skipped for that epoch.
pub fn train_sgd(
    network: &mut Network,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    config: &TrainConfig,
) -> Result<Vec<EpochStats>> {
    let (in_size, out_size) = validate(network, inputs, targets, config)?;

    let n = inputs.len();
    let batch_size = config.batch_size;
    let batches = n / batch_size;
    if n % batch_size != 0 {
        warn!(
            "{} of {} samples do not fill a batch of {} and are skipped each epoch",
            n % batch_size, n, batch_size
        );
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut indices: Vec<usize> = (0..n).collect();
    let mut x_batch = Vec::with_capacity(batch_size * in_size);
    let mut t_batch = Vec::with_capacity(batch_size * out_size);
    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();
        if config.shuffle {
            indices.shuffle(&mut rng);
        }

        let mut total_loss = 0.0;
        for batch in indices.chunks_exact(batch_size) {
            x_batch.clear();
            t_batch.clear();
            for &idx in batch {
                x_batch.extend_from_slice(&inputs[idx]);
                t_batch.extend_from_slice(&targets[idx]);
            }
            total_loss += train_step_with(
                network,
                &x_batch,
                &t_batch,
                config.learning_rate,
                config.loss,
                config.seed_mode,
            )?;
        }

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss: total_loss / batches as f64,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!("epoch {}/{}: loss = {:.6}", stats.epoch, stats.total_epochs, stats.train_loss);
        history.push(stats);
    }

    Ok(history)
}

/// Checks the sample set against the network and returns its (in, out) sizes.
fn validate(
    network: &Network,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    config: &TrainConfig,
) -> Result<(usize, usize)> {
    let (first, last) = match (network.input(), network.output()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(NnError::null("network has no layers")),
    };
    if inputs.is_empty() {
        return Err(NnError::null("training samples"));
    }
    if inputs.len() != targets.len() {
        return Err(NnError::invalid(format!(
            "{} inputs but {} targets", inputs.len(), targets.len()
        )));
    }
    if config.batch_size < 1 || config.batch_size != first.params().batch_size {
        return Err(NnError::invalid(format!(
            "batch size {} does not match the network batch size {}",
            config.batch_size, first.params().batch_size
        )));
    }
    if inputs.len() < config.batch_size {
        return Err(NnError::invalid(format!(
            "{} samples cannot fill a batch of {}", inputs.len(), config.batch_size
        )));
    }

    let in_size = first.params().input_size;
    let out_size = last.output_size();
    if let Some(i) = inputs.iter().position(|x| x.len() != in_size) {
        return Err(NnError::invalid(format!("input {i} does not hold {in_size} values")));
    }
    if let Some(i) = targets.iter().position(|t| t.len() != out_size) {
        return Err(NnError::invalid(format!("target {i} does not hold {out_size} values")));
    }
    Ok((in_size, out_size))
}
