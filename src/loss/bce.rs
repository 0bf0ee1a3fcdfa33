pub struct BceLoss;

const EPS: f64 = 1e-12;

impl BceLoss {
    /// Scalar BCE: -mean(t·ln(p+ε) + (1-t)·ln(1-p+ε))
    pub fn forward(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(p, t)| -(t * (p + EPS).ln() + (1.0 - t) * (1.0 - p + EPS).ln()))
            .sum::<f64>() / n
    }

    /// Per-output gradient of the mean: (p - t) / ((p + ε) · (1 - p + ε)) / n
    pub fn backward(out: &mut [f64], predicted: &[f64], expected: &[f64]) {
        let n = predicted.len() as f64;
        for ((o, p), t) in out.iter_mut().zip(predicted).zip(expected) {
            *o = (p - t) / ((p + EPS) * (1.0 - p + EPS)) / n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_of_confident_predictions() {
        let loss = BceLoss::forward(&[0.7, 0.3], &[1.0, 0.0]);
        assert!((loss - 0.356675).abs() < 1e-5);
    }

    #[test]
    fn gradient_is_scaled_by_size() {
        let mut diff = [0.0; 2];
        BceLoss::backward(&mut diff, &[0.7, 0.3], &[1.0, 0.0]);
        assert!((diff[0] + 0.714285).abs() < 1e-5);
        assert!((diff[1] - 0.714285).abs() < 1e-5);
    }
}
