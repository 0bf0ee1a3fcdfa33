use serde::{Serialize, Deserialize};

use crate::loss::{bce::BceLoss, mse::MseLoss};

/// Selects a loss function.
///
/// - `Mse` — Mean-squared error; pair with Identity or Sigmoid output.
/// - `Bce` — Binary cross-entropy; pair with Sigmoid output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    Bce,
}

impl LossType {
    /// Scalar loss of `predicted` against `expected`.
    pub fn forward(&self, predicted: &[f64], expected: &[f64]) -> f64 {
        match self {
            LossType::Mse => MseLoss::forward(predicted, expected),
            LossType::Bce => BceLoss::forward(predicted, expected),
        }
    }

    /// Writes the per-output gradient into `out`.
    pub fn backward(&self, out: &mut [f64], predicted: &[f64], expected: &[f64]) {
        match self {
            LossType::Mse => MseLoss::backward(out, predicted, expected),
            LossType::Bce => BceLoss::backward(out, predicted, expected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_variant() {
        let (y, t) = ([0.7, 0.3], [1.0, 0.0]);
        assert_eq!(LossType::Mse.forward(&y, &t), MseLoss::forward(&y, &t));
        assert_eq!(LossType::Bce.forward(&y, &t), BceLoss::forward(&y, &t));

        let mut out = [0.0; 2];
        LossType::Bce.backward(&mut out, &y, &t);
        assert!(out[0] < 0.0 && out[1] > 0.0);
    }

    #[test]
    fn deserializes_snake_case() {
        let l: LossType = serde_json::from_str("\"bce\"").unwrap();
        assert_eq!(l, LossType::Bce);
    }
}
