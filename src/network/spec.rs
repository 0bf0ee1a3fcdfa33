use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::layers::layer::LayerParams;
use crate::loss::loss_type::LossType;
use crate::network::network::Network;
use crate::train::train_config::{GradientSeed, TrainConfig};

/// Training hyperparameters stored alongside an architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSpec {
    pub learning_rate: f64,
    pub epochs: usize,
    #[serde(default)]
    pub seed_mode: GradientSeed,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// A fully serializable description of a network architecture plus the loss
/// used to report training progress.
///
/// `NetworkSpec` is the configuration record handed to the core: it can be
/// saved to / loaded from JSON and turned into an un-initialised `Network`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    /// Ordered list of layer records (input → output).
    pub layers: Vec<LayerParams>,
    /// Loss reported by the trainer.
    #[serde(default = "default_loss")]
    pub loss: LossType,
    #[serde(default)]
    pub training: Option<TrainSpec>,
}

fn default_loss() -> LossType {
    LossType::Mse
}

impl NetworkSpec {
    /// Appends every layer record to a fresh network. Layers are not
    /// initialised.
    pub fn build(&self) -> Network {
        Network::from_params(&self.layers)
    }

    /// Trainer configuration for a network built from this spec, if the spec
    /// carries training hyperparameters. The batch size is taken from the
    /// first layer record.
    pub fn train_config(&self) -> Option<TrainConfig> {
        let t = self.training.as_ref()?;
        let batch_size = self.layers.first().map_or(0, |l| l.batch_size);
        let mut config = TrainConfig::new(t.learning_rate, t.epochs, batch_size, self.loss);
        config.seed_mode = t.seed_mode;
        config.shuffle = t.shuffle;
        config.seed = t.seed;
        Some(config)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
