// Tick-driven trading engine.
//
// Strategy state (tick history, staged intent, position) and the order
// lifecycle live together behind one lock: ticks arrive on the market-data
// task while order events arrive on the trading task, and the runner wraps
// this struct in an Arc<Mutex<_>> shared by both.

use chrono::{DateTime, Duration, Local, NaiveTime};
use std::sync::Arc;

use crate::execution::orders::OrderLifecycle;
use crate::gateway::TradingGateway;
use crate::models::{OrderStatus, QuoteTick, TradeAction};
use crate::refdata;
use crate::strategy::Strategy;

pub struct TradeEngine {
    instrument_id: String,
    sessions: Vec<(NaiveTime, NaiveTime)>,
    strategy: Box<dyn Strategy>,
    gateway: Arc<dyn TradingGateway>,
    orders: OrderLifecycle,
    /// Recent last-traded prices, oldest first, bounded by the strategy's
    /// history requirement
    history: Vec<f64>,
    /// Entry staged by the strategy, executed on the next tick's quote
    staged: Option<TradeAction>,
    /// Signed lot count; mutated only by confirmed fills
    position: i64,
}

impl TradeEngine {
    pub fn new(
        instrument_id: String,
        sessions: Vec<(NaiveTime, NaiveTime)>,
        strategy: Box<dyn Strategy>,
        gateway: Arc<dyn TradingGateway>,
        order_timeout: Duration,
    ) -> Self {
        Self {
            instrument_id,
            sessions,
            strategy,
            gateway,
            orders: OrderLifecycle::new(order_timeout),
            history: Vec::new(),
            staged: None,
            position: 0,
        }
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn staged_intent(&self) -> Option<TradeAction> {
        self.staged
    }

    pub fn has_pending_order(&self) -> bool {
        self.orders.has_pending()
    }

    /// Evaluate one inbound tick. Must never block: every gateway call made
    /// here is fire-and-forget.
    pub fn on_tick(&mut self, tick: &QuoteTick) {
        tracing::debug!(
            instrument = %tick.instrument_id,
            bid = tick.bid_price,
            ask = tick.ask_price,
            last = tick.last_price,
            volume = tick.volume,
            "tick"
        );

        if !refdata::in_session(tick.received_at.time(), &self.sessions) {
            tracing::debug!("tick outside trading sessions, no action");
            return;
        }

        // Stale-order recovery runs before anything else; it may clear the
        // pending flag if a timed-out order could be cancelled
        self.orders.cancel_stale(self.gateway.as_ref(), tick.received_at);

        if self.orders.has_pending() {
            return;
        }

        self.history.push(tick.last_price);
        if self.history.len() > self.strategy.min_history() {
            self.history.remove(0);
        }

        if self.position == 0 {
            // An intent staged on the previous tick executes at this tick's
            // quote, decoupling signal detection from order placement
            if let Some(action) = self.staged.take() {
                let price = if action == TradeAction::Sell {
                    tick.ask_price
                } else {
                    tick.bid_price
                };
                self.submit(price, action, tick.received_at);
                return;
            }

            if let Some(action) = self.strategy.evaluate(&self.history, tick) {
                tracing::info!(?action, strategy = self.strategy.name(), "signal formed, staging entry");
                self.staged = Some(action);
            }
        } else if self.position > 0 {
            self.submit(tick.bid_price, TradeAction::SellClose, tick.received_at);
        } else {
            self.submit(tick.ask_price, TradeAction::BuyClose, tick.received_at);
        }
    }

    fn submit(&mut self, price: f64, action: TradeAction, now: DateTime<Local>) {
        if let Err(e) =
            self.orders
                .submit(self.gateway.as_ref(), &self.instrument_id, price, action, now)
        {
            tracing::error!(error = %e, ?action, "order submission failed");
        }
    }

    /// Trading-gateway ack: wires up the ids needed to cancel, or reports a
    /// submission rejection
    pub fn on_order_ack(
        &mut self,
        order_ref: &str,
        sys_id: Option<&str>,
        exchange_id: Option<&str>,
        error: Option<&str>,
    ) {
        if let Some(error) = error {
            self.orders.on_reject(order_ref, error);
            return;
        }
        if let (Some(sys_id), Some(exchange_id)) = (sys_id, exchange_id) {
            self.orders.on_ack(order_ref, sys_id, exchange_id);
        }
    }

    /// Order lifecycle update; a confirmed fill is the only place the
    /// position changes
    pub fn on_order_update(&mut self, order_ref: &str, status: OrderStatus) {
        if let Some(fill) = self.orders.on_update(order_ref, status) {
            self.position += fill.delta();
            tracing::info!(position = self.position, "position updated by fill");
        }
    }

    /// Timer entry point for stale-order recovery between ticks
    pub fn cancel_stale(&mut self, now: DateTime<Local>) {
        self.orders.cancel_stale(self.gateway.as_ref(), now);
    }
}
