// Gateway session handshake state machines.
//
// Transitions are driven exclusively by inbound gateway events; a negative
// acknowledgment halts progression in place and the caller must call
// `connect()` again to restart the whole sequence.

use std::sync::Arc;

use crate::error::Error;
use crate::gateway::{
    AuthRequest, LoginCredentials, MarketDataGateway, MdEvent, TdEvent, TradingGateway,
};
use crate::Result;

/// Handshake stage of one gateway connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    LoggingIn,
    Ready,
}

/// Market-data connection: connect -> login -> subscribe
pub struct MarketDataSession {
    state: SessionState,
    gateway: Arc<dyn MarketDataGateway>,
    credentials: LoginCredentials,
    instruments: Vec<String>,
}

impl MarketDataSession {
    pub fn new(
        gateway: Arc<dyn MarketDataGateway>,
        credentials: LoginCredentials,
        instruments: Vec<String>,
    ) -> Self {
        Self {
            state: SessionState::Disconnected,
            gateway,
            credentials,
            instruments,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Kick off the handshake. Re-invoking restarts the sequence from
    /// scratch; partial progress is discarded.
    pub fn connect(&mut self) -> Result<()> {
        self.state = SessionState::Connecting;
        self.gateway.connect()
    }

    /// Advance the handshake on an inbound event. Ticks are not handled
    /// here; the runner routes them straight to the engine.
    pub fn handle_event(&mut self, event: &MdEvent) -> Result<()> {
        match event {
            MdEvent::Connected => {
                tracing::info!("market-data gateway connected, logging in");
                self.state = SessionState::LoggingIn;
                self.gateway.login(&self.credentials)
            }
            MdEvent::LoginResult { ok: true, .. } => {
                tracing::info!(
                    instruments = ?self.instruments,
                    "market-data login ok, subscribing"
                );
                self.gateway.subscribe(&self.instruments)?;
                self.state = SessionState::Ready;
                Ok(())
            }
            // Negative ack: no transition, no automatic retry; the caller
            // must re-invoke connect() to restart the sequence
            MdEvent::LoginResult { ok: false, error } => Err(Error::LoginFailure(
                error.clone().unwrap_or_else(|| "unknown".to_string()),
            )),
            MdEvent::Tick(_) => Ok(()),
        }
    }
}

/// Trading connection: connect -> authenticate -> login
pub struct TradingSession {
    state: SessionState,
    gateway: Arc<dyn TradingGateway>,
    auth: AuthRequest,
    credentials: LoginCredentials,
}

impl TradingSession {
    pub fn new(
        gateway: Arc<dyn TradingGateway>,
        auth: AuthRequest,
        credentials: LoginCredentials,
    ) -> Self {
        Self {
            state: SessionState::Disconnected,
            gateway,
            auth,
            credentials,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Kick off the handshake. Re-invoking restarts the sequence from
    /// scratch.
    pub fn connect(&mut self) -> Result<()> {
        self.state = SessionState::Connecting;
        self.gateway.connect()
    }

    /// Advance the handshake on an inbound event. Order events are not
    /// handled here; the runner routes them to the engine.
    pub fn handle_event(&mut self, event: &TdEvent) -> Result<()> {
        match event {
            TdEvent::Connected => {
                tracing::info!("trading gateway connected, authenticating");
                self.state = SessionState::Authenticating;
                self.gateway.authenticate(&self.auth)
            }
            TdEvent::AuthResult { ok: true, .. } => {
                tracing::info!("trading authentication ok, logging in");
                self.state = SessionState::LoggingIn;
                self.gateway.login(&self.credentials)
            }
            TdEvent::AuthResult { ok: false, error } => Err(Error::AuthFailure(
                error.clone().unwrap_or_else(|| "unknown".to_string()),
            )),
            TdEvent::LoginResult { ok: true, .. } => {
                tracing::info!("trading login ok, session ready");
                self.state = SessionState::Ready;
                Ok(())
            }
            TdEvent::LoginResult { ok: false, error } => Err(Error::LoginFailure(
                error.clone().unwrap_or_else(|| "unknown".to_string()),
            )),
            TdEvent::OrderAck { .. } | TdEvent::OrderUpdate { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testutil::{RecordingMarketDataGateway, RecordingTradingGateway};
    use std::sync::atomic::Ordering;

    fn credentials() -> LoginCredentials {
        LoginCredentials {
            broker_id: "9999".to_string(),
            user_id: "000001".to_string(),
            password: "secret".to_string(),
            investor_id: "000001".to_string(),
        }
    }

    fn auth() -> AuthRequest {
        AuthRequest {
            broker_id: "9999".to_string(),
            user_id: "000001".to_string(),
            app_id: "client_test".to_string(),
            auth_code: "0000000000000000".to_string(),
        }
    }

    #[test]
    fn test_market_data_happy_path_reaches_ready() {
        let gateway = Arc::new(RecordingMarketDataGateway::default());
        let mut session = MarketDataSession::new(
            gateway.clone(),
            credentials(),
            vec!["rb2410".to_string()],
        );
        assert_eq!(session.state(), SessionState::Disconnected);

        session.connect().unwrap();
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(gateway.connects.load(Ordering::SeqCst), 1);

        session.handle_event(&MdEvent::Connected).unwrap();
        assert_eq!(session.state(), SessionState::LoggingIn);
        assert_eq!(gateway.logins.load(Ordering::SeqCst), 1);

        session
            .handle_event(&MdEvent::LoginResult {
                ok: true,
                error: None,
            })
            .unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(
            gateway.subscriptions.lock().unwrap().as_slice(),
            &[vec!["rb2410".to_string()]]
        );
    }

    #[test]
    fn test_market_data_login_failure_halts_progression() {
        let gateway = Arc::new(RecordingMarketDataGateway::default());
        let mut session = MarketDataSession::new(
            gateway.clone(),
            credentials(),
            vec!["rb2410".to_string()],
        );

        session.connect().unwrap();
        session.handle_event(&MdEvent::Connected).unwrap();
        let result = session.handle_event(&MdEvent::LoginResult {
            ok: false,
            error: Some("wrong password".to_string()),
        });
        assert!(matches!(result, Err(Error::LoginFailure(_))));

        // No transition, no subscription, no automatic retry
        assert_eq!(session.state(), SessionState::LoggingIn);
        assert!(gateway.subscriptions.lock().unwrap().is_empty());
        assert_eq!(gateway.logins.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_trading_happy_path_reaches_ready() {
        let gateway = Arc::new(RecordingTradingGateway::default());
        let mut session = TradingSession::new(gateway.clone(), auth(), credentials());

        session.connect().unwrap();
        session.handle_event(&TdEvent::Connected).unwrap();
        assert_eq!(session.state(), SessionState::Authenticating);
        assert_eq!(gateway.auths.load(Ordering::SeqCst), 1);

        session
            .handle_event(&TdEvent::AuthResult {
                ok: true,
                error: None,
            })
            .unwrap();
        assert_eq!(session.state(), SessionState::LoggingIn);
        assert_eq!(gateway.logins.load(Ordering::SeqCst), 1);

        session
            .handle_event(&TdEvent::LoginResult {
                ok: true,
                error: None,
            })
            .unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn test_trading_auth_failure_halts_progression() {
        let gateway = Arc::new(RecordingTradingGateway::default());
        let mut session = TradingSession::new(gateway.clone(), auth(), credentials());

        session.connect().unwrap();
        session.handle_event(&TdEvent::Connected).unwrap();
        let result = session.handle_event(&TdEvent::AuthResult {
            ok: false,
            error: Some("bad auth code".to_string()),
        });
        assert!(matches!(result, Err(Error::AuthFailure(_))));

        assert_eq!(session.state(), SessionState::Authenticating);
        assert_eq!(gateway.logins.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reconnect_restarts_from_scratch() {
        let gateway = Arc::new(RecordingTradingGateway::default());
        let mut session = TradingSession::new(gateway.clone(), auth(), credentials());

        session.connect().unwrap();
        session.handle_event(&TdEvent::Connected).unwrap();
        let _ = session.handle_event(&TdEvent::AuthResult {
            ok: false,
            error: Some("bad auth code".to_string()),
        });

        // Caller-initiated restart runs the whole sequence again
        session.connect().unwrap();
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(gateway.connects.load(Ordering::SeqCst), 2);

        session.handle_event(&TdEvent::Connected).unwrap();
        assert_eq!(gateway.auths.load(Ordering::SeqCst), 2);
    }
}
