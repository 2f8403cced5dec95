// Gateway capability surface: narrow interfaces over the vendor bindings
pub mod paper;

pub use paper::{PaperMarketDataGateway, PaperTradingGateway};

use crate::models::{OrderStatus, QuoteTick, TradeAction};
use crate::Result;

/// Credentials for the login step on either gateway
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub broker_id: String,
    pub user_id: String,
    pub password: String,
    pub investor_id: String,
}

/// Terminal-authentication request, required by the trading gateway before
/// login
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub broker_id: String,
    pub user_id: String,
    pub app_id: String,
    pub auth_code: String,
}

/// One outbound order submission.
///
/// Orders are always limit orders with an immediate-or-cancel style time
/// condition; the vendor binding fills in the remaining protocol fields.
#[derive(Debug, Clone)]
pub struct OrderInput {
    pub order_ref: String,
    pub instrument_id: String,
    pub action: TradeAction,
    pub price: f64,
    pub volume: i64,
}

/// Cancel request; needs the gateway-assigned ids from the order ack
#[derive(Debug, Clone)]
pub struct CancelRequest {
    pub order_ref: String,
    pub instrument_id: String,
    pub sys_id: String,
    pub exchange_id: String,
}

/// Inbound events from the market-data gateway, delivered in issuance order
/// on a single logical session
#[derive(Debug, Clone)]
pub enum MdEvent {
    Connected,
    LoginResult { ok: bool, error: Option<String> },
    Tick(QuoteTick),
}

/// Inbound events from the trading gateway
#[derive(Debug, Clone)]
pub enum TdEvent {
    Connected,
    AuthResult {
        ok: bool,
        error: Option<String>,
    },
    LoginResult {
        ok: bool,
        error: Option<String>,
    },
    /// `error` set means the submission was rejected; otherwise the ids are
    /// the handles needed to cancel
    OrderAck {
        order_ref: String,
        sys_id: Option<String>,
        exchange_id: Option<String>,
        error: Option<String>,
    },
    OrderUpdate {
        order_ref: String,
        status: OrderStatus,
    },
}

/// Outbound surface of the market-data connection.
///
/// Every call is fire-and-forget: an `Ok` return means the request was
/// dispatched, and the outcome arrives later as an `MdEvent`.
pub trait MarketDataGateway: Send + Sync {
    fn connect(&self) -> Result<()>;
    fn login(&self, credentials: &LoginCredentials) -> Result<()>;
    fn subscribe(&self, instrument_ids: &[String]) -> Result<()>;
    /// Release the connection; no further events are delivered
    fn release(&self);
}

/// Outbound surface of the trading connection. Fire-and-forget, like
/// [`MarketDataGateway`].
pub trait TradingGateway: Send + Sync {
    fn connect(&self) -> Result<()>;
    fn authenticate(&self, auth: &AuthRequest) -> Result<()>;
    fn login(&self, credentials: &LoginCredentials) -> Result<()>;
    fn submit_order(&self, order: &OrderInput) -> Result<()>;
    fn cancel_order(&self, cancel: &CancelRequest) -> Result<()>;
    /// Release the connection; no further events are delivered
    fn release(&self);
}
