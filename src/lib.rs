pub mod error;
pub mod math;
pub mod layers;
pub mod network;
pub mod loss;
pub mod train;
pub mod config;

// Convenience re-exports
pub use error::{NnError, Result};
pub use math::tensor::{Shape, Tensor};
pub use math::blas::Transpose;
pub use layers::layer::{Layer, LayerParams, LayerType};
pub use network::network::Network;
pub use network::spec::NetworkSpec;
pub use loss::loss_type::LossType;
pub use train::trainer::{train_sgd, train_step, train_step_with};
pub use train::train_config::{GradientSeed, TrainConfig};
pub use train::epoch_stats::EpochStats;
