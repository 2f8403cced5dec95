// Event-delivery loops and process lifecycle.
//
// One task per gateway drains that gateway's event channel, so events from a
// single gateway are processed strictly in order while the two gateways run
// concurrently. A third task polls for stale orders once a second.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::Error;
use crate::execution::TradeEngine;
use crate::gateway::{MarketDataGateway, MdEvent, TdEvent, TradingGateway};
use crate::session::{MarketDataSession, SessionState, TradingSession};
use crate::Result;

pub struct Runner {
    pub engine: Arc<Mutex<TradeEngine>>,
    pub md_session: MarketDataSession,
    pub td_session: TradingSession,
    pub md_gateway: Arc<dyn MarketDataGateway>,
    pub td_gateway: Arc<dyn TradingGateway>,
    pub stale_poll: Duration,
}

impl Runner {
    /// Start both handshakes and run until Ctrl-C or either event loop
    /// exits
    pub async fn run(
        mut self,
        md_events: UnboundedReceiver<MdEvent>,
        td_events: UnboundedReceiver<TdEvent>,
    ) -> Result<()> {
        self.md_session.connect()?;
        self.td_session.connect()?;

        let md_task = tokio::spawn(market_data_loop(
            md_events,
            self.md_session,
            self.engine.clone(),
        ));
        let td_task = tokio::spawn(trading_loop(
            td_events,
            self.td_session,
            self.engine.clone(),
        ));
        tokio::spawn(stale_order_loop(self.engine.clone(), self.stale_poll));

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received Ctrl+C, shutting down");
            }
            result = md_task => {
                tracing::error!("market-data loop exited: {:?}", result);
            }
            result = td_task => {
                tracing::error!("trading loop exited: {:?}", result);
            }
        }

        // In-flight orders are deliberately not auto-cancelled here; the
        // operator has to deal with them on the next start
        if self.engine.lock().unwrap().has_pending_order() {
            tracing::warn!("an order is still in flight; it will not be auto-cancelled");
        }

        self.md_gateway.release();
        self.td_gateway.release();
        Ok(())
    }
}

async fn market_data_loop(
    mut events: UnboundedReceiver<MdEvent>,
    mut session: MarketDataSession,
    engine: Arc<Mutex<TradeEngine>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            MdEvent::Tick(tick) => {
                engine.lock().unwrap().on_tick(&tick);
            }
            other => {
                if let Err(e) = session.handle_event(&other) {
                    tracing::error!(error = %e, "market-data session halted");
                }
            }
        }
    }
    if session.state() != SessionState::Ready {
        let e = Error::ConnectionFailure {
            gateway: "market-data",
            reason: "event delivery ended before the handshake completed".to_string(),
        };
        tracing::error!(error = %e, "market-data session lost");
    } else {
        tracing::warn!("market-data event channel closed");
    }
}

async fn trading_loop(
    mut events: UnboundedReceiver<TdEvent>,
    mut session: TradingSession,
    engine: Arc<Mutex<TradeEngine>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TdEvent::OrderAck {
                order_ref,
                sys_id,
                exchange_id,
                error,
            } => {
                engine.lock().unwrap().on_order_ack(
                    &order_ref,
                    sys_id.as_deref(),
                    exchange_id.as_deref(),
                    error.as_deref(),
                );
            }
            TdEvent::OrderUpdate { order_ref, status } => {
                engine.lock().unwrap().on_order_update(&order_ref, status);
            }
            other => {
                if let Err(e) = session.handle_event(&other) {
                    tracing::error!(error = %e, "trading session halted");
                }
            }
        }
    }
    if session.state() != SessionState::Ready {
        let e = Error::ConnectionFailure {
            gateway: "trading",
            reason: "event delivery ended before the handshake completed".to_string(),
        };
        tracing::error!(error = %e, "trading session lost");
    } else {
        tracing::warn!("trading event channel closed");
    }
}

/// Timeout-based cancellation is polled, not scheduled precisely;
/// sub-second precision is not needed
async fn stale_order_loop(engine: Arc<Mutex<TradeEngine>>, poll: Duration) {
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        engine.lock().unwrap().cancel_stale(Local::now());
    }
}
