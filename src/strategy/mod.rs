// Trading strategy module
pub mod momentum;

pub use momentum::TwoTickMomentum;

use crate::models::{QuoteTick, TradeAction};

/// Base trait for entry-signal strategies.
///
/// `history` is the bounded window of recent last-traded prices maintained
/// by the engine, oldest first, with the current tick's price already
/// appended.
pub trait Strategy: Send {
    /// Inspect recent prices against the current quote; return an entry to
    /// stage for the next tick, or None
    fn evaluate(&self, history: &[f64], tick: &QuoteTick) -> Option<TradeAction>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Number of recorded prices the engine must retain before signals can
    /// form
    fn min_history(&self) -> usize;
}
