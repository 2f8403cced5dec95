// In-process simulated gateways: no network, no vendor bindings.
// Used for paper trading and for the integration tests.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc::UnboundedSender;

use super::{
    AuthRequest, CancelRequest, LoginCredentials, MarketDataGateway, MdEvent, OrderInput, TdEvent,
    TradingGateway,
};
use crate::error::Error;
use crate::models::{OrderStatus, QuoteTick};
use crate::Result;

/// Market-data gateway that acks the handshake immediately and, once
/// subscribed, emits a synthetic tick stream.
///
/// The simulated market quotes a constant price with the last trade pinned
/// to the bid, which is enough to exercise the signal, entry and unwind
/// paths deterministically.
pub struct PaperMarketDataGateway {
    events: UnboundedSender<MdEvent>,
    tick_interval: Duration,
    mark_price: f64,
    running: Arc<AtomicBool>,
    volume: Arc<AtomicI64>,
}

impl PaperMarketDataGateway {
    pub fn new(events: UnboundedSender<MdEvent>) -> Self {
        Self {
            events,
            tick_interval: Duration::from_millis(500),
            mark_price: 3500.0,
            running: Arc::new(AtomicBool::new(false)),
            volume: Arc::new(AtomicI64::new(0)),
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    fn send(&self, event: MdEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| Error::Gateway("market-data event channel closed".to_string()))
    }
}

impl MarketDataGateway for PaperMarketDataGateway {
    fn connect(&self) -> Result<()> {
        self.send(MdEvent::Connected)
    }

    fn login(&self, _credentials: &LoginCredentials) -> Result<()> {
        self.send(MdEvent::LoginResult {
            ok: true,
            error: None,
        })
    }

    fn subscribe(&self, instrument_ids: &[String]) -> Result<()> {
        let instrument = instrument_ids
            .first()
            .cloned()
            .ok_or_else(|| Error::Gateway("no instruments to subscribe".to_string()))?;

        self.running.store(true, Ordering::SeqCst);
        let events = self.events.clone();
        let running = self.running.clone();
        let volume = self.volume.clone();
        let mark = self.mark_price;
        let tick_interval = self.tick_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_interval);
            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                let tick = QuoteTick {
                    instrument_id: instrument.clone(),
                    bid_price: mark,
                    ask_price: mark + 1.0,
                    last_price: mark,
                    volume: volume.fetch_add(1, Ordering::SeqCst) + 1,
                    received_at: Local::now(),
                };
                if events.send(MdEvent::Tick(tick)).is_err() {
                    break;
                }
            }
        });

        Ok(())
    }

    fn release(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Trading gateway that acknowledges and fills every order immediately, and
/// acks every cancel. Events are queued in submission order.
pub struct PaperTradingGateway {
    events: UnboundedSender<TdEvent>,
    next_sys_id: AtomicU32,
}

impl PaperTradingGateway {
    pub fn new(events: UnboundedSender<TdEvent>) -> Self {
        Self {
            events,
            next_sys_id: AtomicU32::new(100_000),
        }
    }

    fn send(&self, event: TdEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| Error::Gateway("trading event channel closed".to_string()))
    }
}

impl TradingGateway for PaperTradingGateway {
    fn connect(&self) -> Result<()> {
        self.send(TdEvent::Connected)
    }

    fn authenticate(&self, _auth: &AuthRequest) -> Result<()> {
        self.send(TdEvent::AuthResult {
            ok: true,
            error: None,
        })
    }

    fn login(&self, _credentials: &LoginCredentials) -> Result<()> {
        self.send(TdEvent::LoginResult {
            ok: true,
            error: None,
        })
    }

    fn submit_order(&self, order: &OrderInput) -> Result<()> {
        let sys_id = self.next_sys_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.send(TdEvent::OrderAck {
            order_ref: order.order_ref.clone(),
            sys_id: Some(sys_id),
            exchange_id: Some("SIM".to_string()),
            error: None,
        })?;
        self.send(TdEvent::OrderUpdate {
            order_ref: order.order_ref.clone(),
            status: OrderStatus::Filled,
        })
    }

    fn cancel_order(&self, cancel: &CancelRequest) -> Result<()> {
        self.send(TdEvent::OrderUpdate {
            order_ref: cancel.order_ref.clone(),
            status: OrderStatus::Cancelled,
        })
    }

    fn release(&self) {}
}
