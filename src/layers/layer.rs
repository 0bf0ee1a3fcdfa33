use std::fmt;

use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::{
    fully_connected::FullyConnectedLayer,
    identity::IdentityLayer,
    sigmoid::SigmoidLayer,
    softmax::SoftmaxLayer,
};
use crate::math::tensor::{Shape, Tensor};

/// Selects the layer variant built from a `LayerParams` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    Identity,
    FullyConnected,
    Sigmoid,
    Softmax,
}

/// Plain per-layer parameter record.
///
/// Fields:
/// - `kind`        — which layer variant to build
/// - `batch_size`  — samples processed together by one forward/backward call
/// - `input_size`  — features per sample entering the layer
/// - `output_size` — features per sample leaving the layer; shape-preserving
///                   variants derive it from `input_size` and accept `0`
///
/// Records are not validated until the layer is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerParams {
    #[serde(rename = "type")]
    pub kind: LayerType,
    #[serde(default)]
    pub batch_size: usize,
    #[serde(default, rename = "in")]
    pub input_size: usize,
    #[serde(default, rename = "out")]
    pub output_size: usize,
}

impl LayerParams {
    pub fn new(kind: LayerType, batch_size: usize, input_size: usize, output_size: usize) -> LayerParams {
        LayerParams { kind, batch_size, input_size, output_size }
    }

    pub(crate) fn validate_common(&self) -> Result<()> {
        if self.batch_size < 1 {
            return Err(NnError::invalid("batch_size must be at least 1"));
        }
        if self.input_size < 1 {
            return Err(NnError::invalid("input size must be at least 1"));
        }
        Ok(())
    }

    /// Validates a shape-preserving record and returns its output size.
    pub(crate) fn validate_same_shape(&self) -> Result<usize> {
        self.validate_common()?;
        if self.output_size != 0 && self.output_size != self.input_size {
            return Err(NnError::invalid(format!(
                "{:?} layer maps {} inputs to {} outputs",
                self.kind, self.input_size, self.output_size
            )));
        }
        Ok(self.input_size)
    }

    /// Shape of a buffer holding `features` values for each sample of the batch.
    pub(crate) fn batch_shape(&self, features: usize) -> Shape {
        Shape::matrix(self.batch_size, features)
    }
}

/// A unit of a sequential network with manual forward and backward passes.
///
/// A layer owns its buffers: `x` (cached input), `y` (output), `dx` (input
/// gradient) and, for trainable variants, `w`, `b`, `dw`, `db`. All of them
/// are absent until `init` succeeds and again after `free`.
///
/// `forward` and `backward` return slices borrowed from the layer. They are
/// overwritten by the next call on the same layer; callers that need to keep
/// a result must copy it out.
pub trait Layer: fmt::Debug {
    /// Sizes are fixed once the layer exists; buffers allocated by `init`
    /// always match them.
    fn params(&self) -> &LayerParams;

    /// Validates the parameters and allocates every owned buffer.
    /// On failure nothing is allocated and the layer stays un-initialised.
    fn init(&mut self, rng: &mut StdRng) -> Result<()>;

    /// Caches `x`, computes and returns `y`.
    fn forward(&mut self, x: &[f64]) -> Result<&[f64]>;

    /// Computes and returns `dx` from the upstream gradient `dy`, using the
    /// input cached by the last `forward`. Trainable variants also overwrite
    /// `dw` and `db`.
    fn backward(&mut self, dy: &[f64]) -> Result<&[f64]>;

    /// Gradient step `param := param - rate * grad`. No-op without parameters.
    fn update(&mut self, _rate: f64) -> Result<()> {
        Ok(())
    }

    /// Zeroes `dw` and `db`. No-op without parameters.
    fn clear_grad(&mut self) {}

    /// Releases every owned buffer.
    fn free(&mut self);

    fn is_live(&self) -> bool;

    /// Features per sample produced by this layer.
    fn output_size(&self) -> usize {
        self.params().output_size
    }

    fn x(&self) -> Option<&Tensor>;
    fn y(&self) -> Option<&Tensor>;
    fn dx(&self) -> Option<&Tensor>;

    fn w(&self) -> Option<&Tensor> { None }
    fn b(&self) -> Option<&Tensor> { None }
    fn dw(&self) -> Option<&Tensor> { None }
    fn db(&self) -> Option<&Tensor> { None }

    fn w_mut(&mut self) -> Option<&mut Tensor> { None }
    fn b_mut(&mut self) -> Option<&mut Tensor> { None }
}

/// Allocates an un-initialised layer of the variant named by `params.kind`.
pub fn alloc(params: LayerParams) -> Box<dyn Layer> {
    match params.kind {
        LayerType::Identity       => Box::new(IdentityLayer::new(params)),
        LayerType::FullyConnected => Box::new(FullyConnectedLayer::new(params)),
        LayerType::Sigmoid        => Box::new(SigmoidLayer::new(params)),
        LayerType::Softmax        => Box::new(SoftmaxLayer::new(params)),
    }
}

/// Checks that `data` is a non-empty buffer of exactly `expected` values.
pub(crate) fn check_input(data: &[f64], expected: usize, what: &'static str) -> Result<()> {
    if data.is_empty() {
        return Err(NnError::null(what));
    }
    if data.len() != expected {
        return Err(NnError::invalid(format!(
            "{what} holds {} values, layer expects {expected}", data.len()
        )));
    }
    Ok(())
}

/// Buffers shared by every variant: cached input, output and input gradient.
#[derive(Debug, Default)]
pub(crate) struct IoBuffers {
    pub x: Option<Tensor>,
    pub y: Option<Tensor>,
    pub dx: Option<Tensor>,
}

impl IoBuffers {
    pub fn alloc(params: &LayerParams, out: usize) -> Result<IoBuffers> {
        Ok(IoBuffers {
            x: Some(Tensor::alloc(params.batch_shape(params.input_size))?),
            y: Some(Tensor::alloc(params.batch_shape(out))?),
            dx: Some(Tensor::alloc(params.batch_shape(params.input_size))?),
        })
    }

    pub fn free(&mut self) {
        Tensor::free(&mut self.x);
        Tensor::free(&mut self.y);
        Tensor::free(&mut self.dx);
    }

    pub fn is_live(&self) -> bool {
        self.x.is_some() && self.y.is_some() && self.dx.is_some()
    }

    /// Borrows (x, y, dx) mutably, failing if the layer is not initialised.
    pub fn live_mut(&mut self) -> Result<(&mut Tensor, &mut Tensor, &mut Tensor)> {
        match (self.x.as_mut(), self.y.as_mut(), self.dx.as_mut()) {
            (Some(x), Some(y), Some(dx)) => Ok((x, y, dx)),
            _ => Err(NnError::null("layer is not initialised")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_deserialize_from_flat_record() {
        let p: LayerParams = serde_json::from_str(
            r#"{ "type": "fully_connected", "batch_size": 4, "in": 2, "out": 10 }"#
        ).unwrap();
        assert_eq!(p, LayerParams::new(LayerType::FullyConnected, 4, 2, 10));

        let q: LayerParams = serde_json::from_str(r#"{ "type": "sigmoid" }"#).unwrap();
        assert_eq!(q, LayerParams::new(LayerType::Sigmoid, 0, 0, 0));
    }

    #[test]
    fn alloc_builds_each_variant_uninitialised() {
        for kind in [LayerType::Identity, LayerType::FullyConnected, LayerType::Sigmoid, LayerType::Softmax] {
            let layer = alloc(LayerParams::new(kind, 1, 3, 3));
            assert_eq!(layer.params().kind, kind);
            assert!(!layer.is_live());
            assert!(layer.x().is_none());
            assert!(layer.y().is_none());
            assert!(layer.dx().is_none());
            assert!(layer.w().is_none());
            assert!(layer.dw().is_none());
        }
    }

    #[test]
    fn same_shape_validation() {
        let ok = LayerParams::new(LayerType::Sigmoid, 2, 3, 0).validate_same_shape();
        assert_eq!(ok.unwrap(), 3);
        let bad = LayerParams::new(LayerType::Sigmoid, 2, 3, 4).validate_same_shape();
        assert!(matches!(bad, Err(NnError::InvalidParameter { .. })));
        let no_batch = LayerParams::new(LayerType::Sigmoid, 0, 3, 3).validate_same_shape();
        assert!(no_batch.is_err());
    }
}
