pub mod blas;
pub mod tensor;

pub use blas::Transpose;
pub use tensor::{Shape, Tensor};
