use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{NnError, Result};

/// 4D tensor shape in (N, C, H, W) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub d: [usize; 4],
}

impl Shape {
    pub fn new(n: usize, c: usize, h: usize, w: usize) -> Shape {
        Shape { d: [n, c, h, w] }
    }

    /// A (rows, cols) matrix laid out as (rows, cols, 1, 1).
    pub fn matrix(rows: usize, cols: usize) -> Shape {
        Shape::new(rows, cols, 1, 1)
    }

    pub fn n(&self) -> usize { self.d[0] }
    pub fn c(&self) -> usize { self.d[1] }
    pub fn h(&self) -> usize { self.d[2] }
    pub fn w(&self) -> usize { self.d[3] }

    pub fn size(&self) -> usize {
        self.d.iter().product()
    }

    pub fn is_valid(&self) -> bool {
        self.d.iter().all(|&dim| dim >= 1)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.d[0], self.d[1], self.d[2], self.d[3])
    }
}

/// Owned, shape-tagged flat buffer. `data.len() == shape.size()` always.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f64>,
}

impl Tensor {
    /// Allocates a zero-filled tensor. Rejects any dimension below 1.
    pub fn alloc(shape: Shape) -> Result<Tensor> {
        if !shape.is_valid() {
            return Err(NnError::invalid(format!("tensor shape {shape} has a zero dimension")));
        }
        let size = shape.size();
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| NnError::AllocationFailure { requested: size })?;
        data.resize(size, 0.0);
        Ok(Tensor { shape, data })
    }

    /// Allocates a tensor of `shape` and copies `src` into it; `src` must hold
    /// exactly `shape.size()` values.
    pub fn from_slice(shape: Shape, src: &[f64]) -> Result<Tensor> {
        let mut t = Tensor::alloc(shape)?;
        if src.len() != t.size() {
            return Err(NnError::invalid(format!(
                "{} values given for tensor of shape {shape}", src.len()
            )));
        }
        t.data.copy_from_slice(src);
        Ok(t)
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal(rng: &mut StdRng) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Xavier (Glorot) initialization: samples from N(0, sqrt(1 / fan_in)).
    ///
    /// Suited to Sigmoid and Identity activations; keeps the variance of
    /// activations and gradients roughly equal across layers.
    pub fn xavier(shape: Shape, fan_in: usize, rng: &mut StdRng) -> Result<Tensor> {
        if fan_in == 0 {
            return Err(NnError::invalid("xavier fan-in must be at least 1"));
        }
        let mut t = Tensor::alloc(shape)?;
        let std_dev = (1.0 / fan_in as f64).sqrt();
        for v in t.data.iter_mut() {
            *v = Tensor::sample_standard_normal(rng) * std_dev;
        }
        Ok(t)
    }

    /// Copies the first `count` values of `src` into the tensor.
    /// Fails without mutation if `count` exceeds either buffer.
    pub fn copy_from_array(&mut self, src: &[f64], count: usize) -> Result<()> {
        if count > self.size() || count > src.len() {
            return Err(NnError::invalid(format!(
                "copy of {count} values into tensor of size {} from {} values",
                self.size(), src.len()
            )));
        }
        self.data[..count].copy_from_slice(&src[..count]);
        Ok(())
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// Releases the tensor held in `slot`, leaving it empty.
    pub fn free(slot: &mut Option<Tensor>) {
        *slot = None;
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_is_zeroed_and_sized() {
        let t = Tensor::alloc(Shape::new(2, 3, 4, 5)).unwrap();
        assert_eq!(t.size(), 120);
        assert_eq!(t.shape().c(), 3);
        assert!(t.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn alloc_rejects_zero_dimension() {
        for d in 0..4 {
            let mut dims = [1, 2, 3, 4];
            dims[d] = 0;
            let r = Tensor::alloc(Shape { d: dims });
            assert!(matches!(r, Err(NnError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn from_slice_copies_exact_values() {
        let t = Tensor::from_slice(Shape::matrix(2, 2), &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(t.shape(), Shape::matrix(2, 2));
        assert_eq!(t.data(), &[1.0, 2.0, 3.0, 4.0]);

        let short = Tensor::from_slice(Shape::matrix(2, 2), &[1.0, 2.0, 3.0]);
        assert!(matches!(short, Err(NnError::InvalidParameter { .. })));
        let long = Tensor::from_slice(Shape::matrix(1, 2), &[1.0, 2.0, 3.0]);
        assert!(matches!(long, Err(NnError::InvalidParameter { .. })));
        assert!(Tensor::from_slice(Shape::matrix(0, 2), &[]).is_err());
    }

    #[test]
    fn copy_from_array_respects_count() {
        let mut t = Tensor::alloc(Shape::matrix(1, 4)).unwrap();
        t.copy_from_array(&[1.0, 2.0, 3.0], 2).unwrap();
        assert_eq!(t.data(), &[1.0, 2.0, 0.0, 0.0]);

        let too_many = t.copy_from_array(&[0.0; 8], 5);
        assert!(too_many.is_err());
        assert_eq!(t.data(), &[1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn fill_and_free() {
        let mut slot = Some(Tensor::alloc(Shape::matrix(2, 2)).unwrap());
        slot.as_mut().unwrap().fill(0.5);
        assert_eq!(slot.as_ref().unwrap().data(), &[0.5; 4]);
        Tensor::free(&mut slot);
        assert!(slot.is_none());
        Tensor::free(&mut slot);
        assert!(slot.is_none());
    }

    #[test]
    fn xavier_is_reproducible_for_a_seed() {
        let a = Tensor::xavier(Shape::matrix(3, 4), 3, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = Tensor::xavier(Shape::matrix(3, 4), 3, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
        assert!(a.data().iter().any(|&v| v != 0.0));
    }
}
