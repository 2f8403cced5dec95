use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One quote update for an instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteTick {
    pub instrument_id: String,
    pub bid_price: f64,
    pub ask_price: f64,
    pub last_price: f64,
    pub volume: i64,
    /// Wall-clock time the tick was received, local exchange time
    pub received_at: DateTime<Local>,
}

/// Direction + offset of an order, as the trading gateway encodes it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeAction {
    /// Open a long position
    Buy,
    /// Open a short position
    Sell,
    /// Close a short position
    BuyClose,
    /// Close a long position
    SellClose,
}

impl TradeAction {
    /// The two actions that open a new position
    pub fn is_open(&self) -> bool {
        matches!(self, TradeAction::Buy | TradeAction::Sell)
    }

    pub fn is_buy_side(&self) -> bool {
        matches!(self, TradeAction::Buy | TradeAction::BuyClose)
    }
}

/// Lifecycle stage of an order from submission to terminal outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Submitted,
    Acked,
    Filled,
    CancelRequested,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Client-side record of one in-flight order
#[derive(Debug, Clone)]
pub struct OrderRecord {
    /// Client-assigned reference, unique per session
    pub order_ref: String,
    pub instrument_id: String,
    pub action: TradeAction,
    pub price: f64,
    pub volume: i64,
    pub submitted_at: DateTime<Local>,
    pub status: OrderStatus,
    /// Gateway-assigned system id, known once acknowledged
    pub sys_id: Option<String>,
    /// Exchange id, known once acknowledged
    pub exchange_id: Option<String>,
}

impl OrderRecord {
    /// A cancel request needs both gateway-assigned ids
    pub fn can_cancel(&self) -> bool {
        self.sys_id.is_some() && self.exchange_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_action_sides() {
        assert!(TradeAction::Buy.is_open());
        assert!(TradeAction::Sell.is_open());
        assert!(!TradeAction::BuyClose.is_open());
        assert!(!TradeAction::SellClose.is_open());

        assert!(TradeAction::Buy.is_buy_side());
        assert!(TradeAction::BuyClose.is_buy_side());
        assert!(!TradeAction::Sell.is_buy_side());
        assert!(!TradeAction::SellClose.is_buy_side());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::Submitted.is_terminal());
        assert!(!OrderStatus::Acked.is_terminal());
        assert!(!OrderStatus::CancelRequested.is_terminal());
    }

    #[test]
    fn test_cancel_needs_both_ids() {
        let mut record = OrderRecord {
            order_ref: "1".to_string(),
            instrument_id: "rb2410".to_string(),
            action: TradeAction::Buy,
            price: 3500.0,
            volume: 1,
            submitted_at: Local::now(),
            status: OrderStatus::Submitted,
            sys_id: None,
            exchange_id: None,
        };
        assert!(!record.can_cancel());

        record.sys_id = Some("100001".to_string());
        assert!(!record.can_cancel());

        record.exchange_id = Some("SHFE".to_string());
        assert!(record.can_cancel());
    }
}
