/// Trailing-window error-ratio alert evaluation
pub mod evaluator;

pub use evaluator::AlertEvaluator;
