pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²)
    pub fn forward(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>() / n
    }

    /// Residual `predicted - expected`, written into `out`. This is also the
    /// fixed gradient seed used by the trainer.
    pub fn backward(out: &mut [f64], predicted: &[f64], expected: &[f64]) {
        for ((o, p), e) in out.iter_mut().zip(predicted).zip(expected) {
            *o = p - e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_squared_error() {
        assert_eq!(MseLoss::forward(&[1.0, 2.0], &[0.0, 4.0]), 2.5);
    }

    #[test]
    fn residual() {
        let mut out = [0.0; 2];
        MseLoss::backward(&mut out, &[1.0, 2.0], &[0.0, 4.0]);
        assert_eq!(out, [1.0, -2.0]);
    }
}
