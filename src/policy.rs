use crate::board::{Stone};

/// External position evaluator, blended into node values like AMAF.
pub trait Evaluator<B>: Send + Sync {
  /// Probability in [0, 1] that `color` wins from `board`.
  fn evaluate(&self, color: Stone, board: &B) -> f64;
}

/// Learned move-weight source consulted by the playout samplers.
///
/// The returned value is added to the base weight of the vertex; the result
/// is floored at 1. Returning NaN keeps the vertex out of playouts entirely.
pub trait MoveWeights: Send + Sync {
  fn weight(&self, color: Stone, fingerprint: u32) -> f64;
}

/// Base playout weight of an empty vertex.
pub const INIT_WEIGHT: f64 = 500.0;

pub fn adjusted_weight(adjust: f64) -> f64 {
  if adjust.is_nan() {
    0.0
  } else {
    (INIT_WEIGHT + adjust).max(1.0)
  }
}
