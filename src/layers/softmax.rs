use log::debug;
use rand::rngs::StdRng;

use crate::error::Result;
use crate::layers::layer::{check_input, IoBuffers, Layer, LayerParams};
use crate::math::{blas, tensor::Tensor};

/// Row-wise softmax over each sample of the batch.
///
/// `backward` applies the full Jacobian-vector product
/// `dx_j = y_j * (dy_j - sum_k dy_k * y_k)`, so it composes with any loss
/// gradient. Pairing it with the combined softmax + cross-entropy gradient
/// `y - t` would apply the Jacobian twice.
#[derive(Debug)]
pub struct SoftmaxLayer {
    params: LayerParams,
    io: IoBuffers,
}

impl SoftmaxLayer {
    pub fn new(params: LayerParams) -> SoftmaxLayer {
        SoftmaxLayer { params, io: IoBuffers::default() }
    }
}

impl Layer for SoftmaxLayer {
    fn params(&self) -> &LayerParams { &self.params }

    fn init(&mut self, _rng: &mut StdRng) -> Result<()> {
        let out = self.params.validate_same_shape()?;
        self.io = IoBuffers::alloc(&self.params, out)?;
        self.params.output_size = out;
        debug!("softmax layer initialised: batch={} size={}", self.params.batch_size, out);
        Ok(())
    }

    fn forward(&mut self, x: &[f64]) -> Result<&[f64]> {
        let width = self.params.input_size;
        let (cache, y, _) = self.io.live_mut()?;
        check_input(x, cache.size(), "softmax input")?;
        blas::copy(cache.size(), x, 1, cache.data_mut(), 1);

        for (row, out) in cache.data().chunks(width).zip(y.data_mut().chunks_mut(width)) {
            // Shift by the row max so exp() cannot overflow.
            let c = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let sum: f64 = row.iter().map(|&v| (v - c).exp()).sum();
            for (o, &v) in out.iter_mut().zip(row) {
                *o = (v - c).exp() / sum;
            }
        }
        Ok(y.data())
    }

    fn backward(&mut self, dy: &[f64]) -> Result<&[f64]> {
        let width = self.params.input_size;
        let (_, y, dx) = self.io.live_mut()?;
        check_input(dy, y.size(), "softmax gradient")?;

        let rows = y.data().chunks(width)
            .zip(dy.chunks(width))
            .zip(dx.data_mut().chunks_mut(width));
        for ((y_row, dy_row), dx_row) in rows {
            let weighted = blas::dot(width, dy_row, 1, y_row, 1);
            for ((d, &yj), &dyj) in dx_row.iter_mut().zip(y_row).zip(dy_row) {
                *d = yj * (dyj - weighted);
            }
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
