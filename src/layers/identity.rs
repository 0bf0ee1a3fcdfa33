use log::debug;
use rand::rngs::StdRng;

use crate::error::Result;
use crate::layers::layer::{check_input, IoBuffers, Layer, LayerParams};
use crate::math::{blas, tensor::Tensor};

/// Pass-through layer (`y = x`, `dx = dy`); a structural placeholder.
#[derive(Debug)]
pub struct IdentityLayer {
    params: LayerParams,
    io: IoBuffers,
}

impl IdentityLayer {
    pub fn new(params: LayerParams) -> IdentityLayer {
        IdentityLayer { params, io: IoBuffers::default() }
    }
}

impl Layer for IdentityLayer {
    fn params(&self) -> &LayerParams { &self.params }

    fn init(&mut self, _rng: &mut StdRng) -> Result<()> {
        let out = self.params.validate_same_shape()?;
        self.io = IoBuffers::alloc(&self.params, out)?;
        self.params.output_size = out;
        debug!("identity layer initialised: batch={} size={}", self.params.batch_size, out);
        Ok(())
    }

    fn forward(&mut self, x: &[f64]) -> Result<&[f64]> {
        let (cache, y, _) = self.io.live_mut()?;
        check_input(x, cache.size(), "identity input")?;
        let n = cache.size();
        blas::copy(n, x, 1, cache.data_mut(), 1);
        blas::copy(n, x, 1, y.data_mut(), 1);
        Ok(y.data())
    }

    fn backward(&mut self, dy: &[f64]) -> Result<&[f64]> {
        let (_, y, dx) = self.io.live_mut()?;
        check_input(dy, y.size(), "identity gradient")?;
        blas::copy(dx.size(), dy, 1, dx.data_mut(), 1);
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
