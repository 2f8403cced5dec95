// Order lifecycle tracking and the tick-driven engine
pub mod engine;
pub mod orders;

pub use engine::TradeEngine;
pub use orders::{Fill, OrderLifecycle};
