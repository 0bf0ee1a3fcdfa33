use std::f64::consts::E;

use log::debug;
use rand::rngs::StdRng;

use crate::error::Result;
use crate::layers::layer::{check_input, IoBuffers, Layer, LayerParams};
use crate::math::{blas, tensor::Tensor};

/// Element-wise logistic activation `y = 1 / (1 + e^-x)`.
#[derive(Debug)]
pub struct SigmoidLayer {
    params: LayerParams,
    io: IoBuffers,
}

impl SigmoidLayer {
    pub fn new(params: LayerParams) -> SigmoidLayer {
        SigmoidLayer { params, io: IoBuffers::default() }
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + E.powf(-x))
}

impl Layer for SigmoidLayer {
    fn params(&self) -> &LayerParams { &self.params }

    fn init(&mut self, _rng: &mut StdRng) -> Result<()> {
        let out = self.params.validate_same_shape()?;
        self.io = IoBuffers::alloc(&self.params, out)?;
        self.params.output_size = out;
        debug!("sigmoid layer initialised: batch={} size={}", self.params.batch_size, out);
        Ok(())
    }

    fn forward(&mut self, x: &[f64]) -> Result<&[f64]> {
        let (cache, y, _) = self.io.live_mut()?;
        check_input(x, cache.size(), "sigmoid input")?;
        blas::copy(cache.size(), x, 1, cache.data_mut(), 1);
        for (yi, &xi) in y.data_mut().iter_mut().zip(cache.data()) {
            *yi = sigmoid(xi);
        }
        Ok(y.data())
    }

    /// `dx = dy * y * (1 - y)`, using the output cached by `forward`.
    fn backward(&mut self, dy: &[f64]) -> Result<&[f64]> {
        let (_, y, dx) = self.io.live_mut()?;
        check_input(dy, y.size(), "sigmoid gradient")?;
        for ((dxi, &yi), &dyi) in dx.data_mut().iter_mut().zip(y.data()).zip(dy) {
            *dxi = dyi * yi * (1.0 - yi);
        }
        Ok(dx.data())
    }

    fn free(&mut self) {
        self.io.free();
    }

    fn is_live(&self) -> bool { self.io.is_live() }

    fn output_size(&self) -> usize { self.params.input_size }

    fn x(&self) -> Option<&Tensor> { self.io.x.as_ref() }
    fn y(&self) -> Option<&Tensor> { self.io.y.as_ref() }
    fn dx(&self) -> Option<&Tensor> { self.io.dx.as_ref() }
}
