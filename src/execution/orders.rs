// In-flight order tracking: single-order-in-flight discipline and
// stale-order recovery

use chrono::{DateTime, Duration, Local};
use std::collections::HashMap;

use crate::error::Error;
use crate::gateway::{CancelRequest, OrderInput, TradingGateway};
use crate::models::{OrderRecord, OrderStatus, TradeAction};
use crate::Result;

/// Reported when a fill confirms, so the caller can apply the position
/// change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub action: TradeAction,
    pub volume: i64,
}

impl Fill {
    /// Signed lot delta: buy-side fills add, sell-side fills subtract
    pub fn delta(&self) -> i64 {
        if self.action.is_buy_side() {
            self.volume
        } else {
            -self.volume
        }
    }
}

/// Tracks in-flight orders and owns the pending-order (re-entrancy) flag.
///
/// At most one order record is non-terminal at any time; the flag is set on
/// submission and cleared by a fill, a rejection, or a stale-order cancel.
pub struct OrderLifecycle {
    next_ref: u32,
    pending: bool,
    orders: HashMap<String, OrderRecord>,
    timeout: Duration,
}

impl OrderLifecycle {
    pub fn new(timeout: Duration) -> Self {
        Self {
            next_ref: 1,
            pending: false,
            orders: HashMap::new(),
            timeout,
        }
    }

    /// Whether an order is in flight (the strategy's re-entrancy guard)
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Number of non-terminal records, for invariant checks
    pub fn open_orders(&self) -> usize {
        self.orders
            .values()
            .filter(|order| !order.status.is_terminal())
            .count()
    }

    /// Submit a one-lot limit order and start tracking it
    pub fn submit(
        &mut self,
        gateway: &dyn TradingGateway,
        instrument_id: &str,
        price: f64,
        action: TradeAction,
        now: DateTime<Local>,
    ) -> Result<String> {
        let order_ref = self.next_ref.to_string();
        self.next_ref += 1;

        let input = OrderInput {
            order_ref: order_ref.clone(),
            instrument_id: instrument_id.to_string(),
            action,
            price,
            volume: 1,
        };
        gateway.submit_order(&input)?;

        self.pending = true;
        self.orders.insert(
            order_ref.clone(),
            OrderRecord {
                order_ref: order_ref.clone(),
                instrument_id: instrument_id.to_string(),
                action,
                price,
                volume: 1,
                submitted_at: now,
                status: OrderStatus::Submitted,
                sys_id: None,
                exchange_id: None,
            },
        );
        tracing::info!(order_ref = %order_ref, ?action, price, "order submitted");
        Ok(order_ref)
    }

    /// Record the gateway-assigned ids needed for cancellation. Does not
    /// change the pending flag.
    pub fn on_ack(&mut self, order_ref: &str, sys_id: &str, exchange_id: &str) {
        if let Some(order) = self.orders.get_mut(order_ref) {
            order.sys_id = Some(sys_id.to_string());
            order.exchange_id = Some(exchange_id.to_string());
            if order.status == OrderStatus::Submitted {
                order.status = OrderStatus::Acked;
            }
        }
    }

    /// Submission-time rejection: the order never reached the book, so the
    /// strategy may re-evaluate on the next tick
    pub fn on_reject(&mut self, order_ref: &str, error: &str) {
        if self.orders.remove(order_ref).is_some() {
            self.pending = false;
            let e = Error::OrderRejected(error.to_string());
            tracing::warn!(order_ref, error = %e, "pending order cleared");
        }
    }

    /// Apply a lifecycle update; returns the fill when the order traded
    pub fn on_update(&mut self, order_ref: &str, status: OrderStatus) -> Option<Fill> {
        match status {
            OrderStatus::Filled => {
                let order = self.orders.remove(order_ref)?;
                self.pending = false;
                tracing::info!(order_ref, "order filled");
                Some(Fill {
                    action: order.action,
                    volume: order.volume,
                })
            }
            OrderStatus::Cancelled => {
                if self.orders.remove(order_ref).is_some() {
                    self.pending = false;
                    tracing::info!(order_ref, "order cancelled");
                }
                None
            }
            OrderStatus::Rejected => {
                self.on_reject(order_ref, "rejected by gateway");
                None
            }
            other => {
                if let Some(order) = self.orders.get_mut(order_ref) {
                    order.status = other;
                }
                None
            }
        }
    }

    /// Cancel non-terminal orders older than the timeout.
    ///
    /// An order whose gateway ids are not yet known cannot be cancelled; it
    /// is left untouched for the next pass. A failed cancel request is also
    /// retried on the next pass.
    pub fn cancel_stale(&mut self, gateway: &dyn TradingGateway, now: DateTime<Local>) {
        let stale: Vec<String> = self
            .orders
            .values()
            .filter(|order| !order.status.is_terminal() && now - order.submitted_at >= self.timeout)
            .map(|order| order.order_ref.clone())
            .collect();

        for order_ref in stale {
            let Some(order) = self.orders.get(&order_ref) else {
                continue;
            };
            if !order.can_cancel() {
                tracing::debug!(
                    order_ref = %order_ref,
                    "stale order has no gateway ids yet, deferring cancel"
                );
                continue;
            }
            let cancel = CancelRequest {
                order_ref: order_ref.clone(),
                instrument_id: order.instrument_id.clone(),
                sys_id: order.sys_id.clone().unwrap_or_default(),
                exchange_id: order.exchange_id.clone().unwrap_or_default(),
            };
            match gateway.cancel_order(&cancel) {
                Ok(()) => {
                    self.orders.remove(&order_ref);
                    self.pending = false;
                    tracing::info!(order_ref = %order_ref, "cancel requested for stale order");
                }
                Err(e) => {
                    tracing::warn!(
                        order_ref = %order_ref,
                        error = %e,
                        "cancel request failed, will retry on next pass"
                    );
                }
            }
        }
    }
}
