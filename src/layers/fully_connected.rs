use log::debug;
use rand::rngs::StdRng;

use crate::error::{NnError, Result};
use crate::layers::layer::{check_input, IoBuffers, Layer, LayerParams};
use crate::math::blas::{self, Transpose};
use crate::math::tensor::{Shape, Tensor};

/// Affine layer `y = x·W + b` over a batch.
///
/// `W` is stored `in x out` row-major: row `k` holds the weights leaving
/// input `k`. `b` holds one bias per output.
#[derive(Debug)]
pub struct FullyConnectedLayer {
    params: LayerParams,
    io: IoBuffers,
    trainable: Option<Params>,
}

/// Weights, biases and their gradients, allocated together by `init`.
#[derive(Debug)]
struct Params {
    w: Tensor,
    b: Tensor,
    dw: Tensor,
    db: Tensor,
    /// Column of ones used to sum `dy` over the batch.
    ones: Tensor,
}

impl FullyConnectedLayer {
    pub fn new(params: LayerParams) -> FullyConnectedLayer {
        FullyConnectedLayer { params, io: IoBuffers::default(), trainable: None }
    }

    fn validate(&self) -> Result<()> {
        self.params.validate_common()?;
        if self.params.output_size < 1 {
            return Err(NnError::invalid("output size must be at least 1"));
        }
        Ok(())
    }
}

impl Layer for FullyConnectedLayer {
    fn params(&self) -> &LayerParams { &self.params }

    fn init(&mut self, rng: &mut StdRng) -> Result<()> {
        self.validate()?;
        let LayerParams { batch_size, input_size, output_size, .. } = self.params;

        let io = IoBuffers::alloc(&self.params, output_size)?;
        let mut trainable = Params {
            w: Tensor::xavier(Shape::matrix(input_size, output_size), input_size, rng)?,
            b: Tensor::alloc(Shape::matrix(1, output_size))?,
            dw: Tensor::alloc(Shape::matrix(input_size, output_size))?,
            db: Tensor::alloc(Shape::matrix(1, output_size))?,
            ones: Tensor::alloc(Shape::matrix(batch_size, 1))?,
        };
        trainable.ones.fill(1.0);

        self.io = io;
        self.trainable = Some(trainable);
        debug!(
            "fully-connected layer initialised: batch={} in={} out={}",
            batch_size, input_size, output_size
        );
        Ok(())
    }

    fn forward(&mut self, x: &[f64]) -> Result<&[f64]> {
        let LayerParams { batch_size, input_size, output_size, .. } = self.params;
        let p = self.trainable.as_ref().ok_or(NnError::null("layer is not initialised"))?;
        let (cache, y, _) = self.io.live_mut()?;
        check_input(x, cache.size(), "fully-connected input")?;
        blas::copy(cache.size(), x, 1, cache.data_mut(), 1);

        // Seed every output row with the bias, then accumulate x·W on top.
        for row in y.data_mut().chunks_mut(output_size) {
            blas::copy(output_size, p.b.data(), 1, row, 1);
        }
        blas::gemm(
            Transpose::NoTrans, Transpose::NoTrans,
            batch_size, output_size, input_size,
            1.0, cache.data(), input_size,
            p.w.data(), output_size,
            1.0, y.data_mut(), output_size,
        );
        Ok(y.data())
    }

    /// `dx = dy·Wᵀ`, `dw = xᵀ·dy` and `db = column-sum(dy)`, each summed over
    /// the batch and overwriting the previous gradients.
    fn backward(&mut self, dy: &[f64]) -> Result<&[f64]> {
        let LayerParams { batch_size, input_size, output_size, .. } = self.params;
        let p = self.trainable.as_mut().ok_or(NnError::null("layer is not initialised"))?;
        let (cache, y, dx) = self.io.live_mut()?;
        check_input(dy, y.size(), "fully-connected gradient")?;

        blas::gemm(
            Transpose::NoTrans, Transpose::Trans,
            batch_size, input_size, output_size,
            1.0, dy, output_size,
            p.w.data(), output_size,
            0.0, dx.data_mut(), input_size,
        );
        blas::gemm(
            Transpose::Trans, Transpose::NoTrans,
            input_size, output_size, batch_size,
            1.0, cache.data(), input_size,
            dy, output_size,
            0.0, p.dw.data_mut(), output_size,
        );
        blas::gemv(
            Transpose::Trans,
            output_size, batch_size,
            1.0, dy, output_size,
            p.ones.data(), 1,
            0.0, p.db.data_mut(), 1,
        );
        Ok(dx.data())
    }

    fn update(&mut self, rate: f64) -> Result<()> {
        let p = self.trainable.as_mut().ok_or(NnError::null("layer is not initialised"))?;
        blas::axpy(p.w.size(), -rate, p.dw.data(), 1, p.w.data_mut(), 1);
        blas::axpy(p.b.size(), -rate, p.db.data(), 1, p.b.data_mut(), 1);
        Ok(())
    }

    fn clear_grad(&mut self) {
        if let Some(p) = self.trainable.as_mut() {
            p.dw.fill(0.0);
            p.db.fill(0.0);
        }
    }

    fn free(&mut self) {
        self.io.free();
        self.trainable = None;
    }

    fn is_live(&self) -> bool {
        self.io.is_live() && self.trainable.is_some()
    }

    fn x(&self) -> Option<&Tensor> { self.io.x.as_ref() }
    fn y(&self) -> Option<&Tensor> { self.io.y.as_ref() }
    fn dx(&self) -> Option<&Tensor> { self.io.dx.as_ref() }

    fn w(&self) -> Option<&Tensor> { self.trainable.as_ref().map(|p| &p.w) }
    fn b(&self) -> Option<&Tensor> { self.trainable.as_ref().map(|p| &p.b) }
    fn dw(&self) -> Option<&Tensor> { self.trainable.as_ref().map(|p| &p.dw) }
    fn db(&self) -> Option<&Tensor> { self.trainable.as_ref().map(|p| &p.db) }

    fn w_mut(&mut self) -> Option<&mut Tensor> { self.trainable.as_mut().map(|p| &mut p.w) }
    fn b_mut(&mut self) -> Option<&mut Tensor> { self.trainable.as_mut().map(|p| &mut p.b) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::layer::LayerType;
    use rand::SeedableRng;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < 1e-9, "index {i}: {a} != {e}");
        }
    }

    /// 2 -> 3 layer with W = [[0, 1, 2], [3, 4, 5]] and b = [1, 1, 1].
    fn fixture(batch: usize) -> FullyConnectedLayer {
        let mut fc = FullyConnectedLayer::new(LayerParams::new(LayerType::FullyConnected, batch, 2, 3));
        fc.init(&mut StdRng::seed_from_u64(0)).unwrap();
        fc.w_mut().unwrap().copy_from_array(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 6).unwrap();
        fc.b_mut().unwrap().fill(1.0);
        fc
    }

    #[test]
    fn init_allocates_consistent_buffers() {
        let fc = fixture(4);
        assert_eq!(fc.x().unwrap().shape(), Shape::matrix(4, 2));
        assert_eq!(fc.y().unwrap().shape(), Shape::matrix(4, 3));
        assert_eq!(fc.dx().unwrap().shape(), Shape::matrix(4, 2));
        assert_eq!(fc.w().unwrap().shape(), Shape::matrix(2, 3));
        assert_eq!(fc.dw().unwrap().shape(), Shape::matrix(2, 3));
        assert_eq!(fc.b().unwrap().size(), 3);
        assert_eq!(fc.db().unwrap().size(), 3);
    }

    #[test]
    fn init_rejects_invalid_params_without_allocating() {
        let mut rng = StdRng::seed_from_u64(0);
        for params in [
            LayerParams::new(LayerType::FullyConnected, 0, 2, 3),
            LayerParams::new(LayerType::FullyConnected, 1, 0, 3),
            LayerParams::new(LayerType::FullyConnected, 1, 2, 0),
        ] {
            let mut fc = FullyConnectedLayer::new(params);
            assert!(matches!(fc.init(&mut rng), Err(NnError::InvalidParameter { .. })));
            assert!(!fc.is_live());
            assert!(fc.x().is_none() && fc.w().is_none() && fc.dw().is_none());
        }
    }

    #[test]
    fn batch_ones_column_is_a_tensor() {
        let fc = fixture(3);
        let ones = &fc.trainable.as_ref().unwrap().ones;
        assert_eq!(ones.shape(), Shape::matrix(3, 1));
        assert!(ones.data().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn live_layer_keeps_its_sizes() {
        let mut fc = fixture(1);
        // Only the allocated shape is accepted; nothing can resize a live layer.
        assert!(matches!(fc.forward(&[1.0]), Err(NnError::InvalidParameter { .. })));
        assert!(matches!(fc.forward(&[1.0, 1.0, 1.0]), Err(NnError::InvalidParameter { .. })));
        assert_eq!(fc.params().output_size, 3);
        let y = fc.forward(&[1.0, 1.0]).unwrap().to_vec();
        assert_eq!(y.len(), fc.output_size());
        assert_close(&y, &[4.0, 6.0, 8.0]);
    }

    #[test]
    fn forward_computes_affine_map() {
        let mut fc = fixture(1);
        assert_close(fc.forward(&[1.0, 1.0]).unwrap(), &[4.0, 6.0, 8.0]);
    }

    #[test]
    fn forward_over_a_batch() {
        let mut fc = fixture(2);
        assert_close(fc.forward(&[1.0, 1.0, 1.0, 2.0]).unwrap(), &[4.0, 6.0, 8.0, 7.0, 10.0, 13.0]);
    }

    #[test]
    fn forward_with_missing_input_leaves_output() {
        let mut fc = fixture(1);
        fc.forward(&[1.0, 1.0]).unwrap();
        assert!(matches!(fc.forward(&[]), Err(NnError::NullArgument { .. })));
        assert_close(fc.y().unwrap().data(), &[4.0, 6.0, 8.0]);
    }

    #[test]
    fn backward_computes_all_gradients() {
        let mut fc = fixture(1);
        fc.forward(&[1.0, 2.0]).unwrap();
        assert_close(fc.backward(&[8.0, 12.0, 16.0]).unwrap(), &[44.0, 152.0]);
        assert_close(fc.dw().unwrap().data(), &[8.0, 12.0, 16.0, 16.0, 24.0, 32.0]);
        assert_close(fc.db().unwrap().data(), &[8.0, 12.0, 16.0]);
    }

    #[test]
    fn backward_sums_gradients_over_the_batch() {
        let mut fc = fixture(2);
        fc.forward(&[1.0, 2.0, 1.0, 2.0]).unwrap();
        fc.backward(&[8.0, 12.0, 16.0, 8.0, 12.0, 16.0]).unwrap();
        assert_close(fc.dw().unwrap().data(), &[16.0, 24.0, 32.0, 32.0, 48.0, 64.0]);
        assert_close(fc.db().unwrap().data(), &[16.0, 24.0, 32.0]);
    }

    #[test]
    fn backward_with_missing_gradient_leaves_buffers() {
        let mut fc = fixture(1);
        fc.forward(&[1.0, 1.0]).unwrap();
        assert!(fc.backward(&[]).is_err());
        assert!(fc.backward(&[1.0, 2.0]).is_err());
        assert!(fc.dx().unwrap().data().iter().all(|&v| v == 0.0));
        assert!(fc.dw().unwrap().data().iter().all(|&v| v == 0.0));
        assert!(fc.db().unwrap().data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn update_steps_against_the_gradient() {
        let mut fc = fixture(1);
        fc.forward(&[1.0, 2.0]).unwrap();
        fc.backward(&[8.0, 12.0, 16.0]).unwrap();
        fc.update(0.5).unwrap();
        assert_close(fc.w().unwrap().data(), &[-4.0, -5.0, -6.0, -5.0, -8.0, -11.0]);
        assert_close(fc.b().unwrap().data(), &[-3.0, -5.0, -7.0]);
    }

    #[test]
    fn clear_grad_zeroes_gradients() {
        let mut fc = fixture(1);
        fc.forward(&[1.0, 2.0]).unwrap();
        fc.backward(&[8.0, 12.0, 16.0]).unwrap();
        fc.clear_grad();
        assert!(fc.dw().unwrap().data().iter().all(|&v| v == 0.0));
        assert!(fc.db().unwrap().data().iter().all(|&v| v == 0.0));
        fc.update(1.0).unwrap();
        assert_close(fc.w().unwrap().data(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn free_releases_every_buffer() {
        let mut fc = fixture(1);
        fc.free();
        assert!(!fc.is_live());
        assert!(fc.x().is_none() && fc.y().is_none() && fc.dx().is_none());
        assert!(fc.w().is_none() && fc.b().is_none() && fc.dw().is_none() && fc.db().is_none());
        assert!(fc.update(0.1).is_err());
    }
}
