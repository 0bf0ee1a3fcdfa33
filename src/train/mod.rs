pub mod trainer;
pub mod epoch_stats;
pub mod train_config;

pub use trainer::{train_sgd, train_step, train_step_with};
pub use epoch_stats::EpochStats;
pub use train_config::{GradientSeed, TrainConfig};
