pub mod layer;
pub mod identity;
pub mod fully_connected;
pub mod sigmoid;
pub mod softmax;

pub use layer::{alloc, Layer, LayerParams, LayerType};
pub use identity::IdentityLayer;
pub use fully_connected::FullyConnectedLayer;
pub use sigmoid::SigmoidLayer;
pub use softmax::SoftmaxLayer;
