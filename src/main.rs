use anyhow::Context;
use chrono::Duration as ChronoDuration;
use clap::Parser;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use futbot::config::Settings;
use futbot::execution::TradeEngine;
use futbot::gateway::{
    AuthRequest, LoginCredentials, MarketDataGateway, PaperMarketDataGateway,
    PaperTradingGateway, TradingGateway,
};
use futbot::refdata::ReferenceData;
use futbot::runner::Runner;
use futbot::session::{MarketDataSession, TradingSession};
use futbot::strategy::TwoTickMomentum;

#[derive(Parser, Debug)]
#[command(name = "futbot", about = "Tick-driven futures trading client")]
struct Args {
    /// Path to the settings file
    #[arg(long, default_value = "futbot.yaml")]
    config: String,

    /// Product name to trade (a key of the products table)
    #[arg(long, default_value = "rebar")]
    product: String,

    /// Run against the in-process paper gateways instead of live servers
    #[arg(long)]
    paper: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();
    tracing::info!("🚀 futbot starting");

    let settings = Settings::load(&args.config)
        .with_context(|| format!("failed to load settings from {}", args.config))?;
    let servers = settings
        .active_servers()
        .with_context(|| {
            format!(
                "no server group '{}/{}' in settings",
                settings.environment, settings.group
            )
        })?
        .clone();
    tracing::info!(
        environment = %settings.environment,
        group = %settings.group,
        md = %servers.market_data_address,
        td = %servers.trading_address,
        "server group selected"
    );

    let refdata = ReferenceData::from_settings(&settings)?;
    let product_id = refdata.product_id(&args.product)?.to_string();
    let main_contract = refdata.main_contract(&product_id)?;
    let sessions = refdata.trading_sessions(&product_id)?.to_vec();
    tracing::info!(
        product = %args.product,
        contract = %main_contract,
        sessions = sessions.len(),
        "resolved trading instrument"
    );

    if !args.paper {
        // Live vendor bindings plug in through the gateway traits; this
        // build only ships the paper pair
        anyhow::bail!("no live gateway binding in this build; run with --paper");
    }
    tracing::info!("📄 paper mode: simulated gateways, no orders leave the process");

    let (md_tx, md_rx) = mpsc::unbounded_channel();
    let (td_tx, td_rx) = mpsc::unbounded_channel();
    let md_gateway: Arc<dyn MarketDataGateway> = Arc::new(PaperMarketDataGateway::new(md_tx));
    let td_gateway: Arc<dyn TradingGateway> = Arc::new(PaperTradingGateway::new(td_tx));

    let credentials = LoginCredentials {
        broker_id: settings.account.broker_id.clone(),
        user_id: settings.account.user_id.clone(),
        password: settings.account.password.clone(),
        investor_id: settings.account.investor_id.clone(),
    };
    let auth = AuthRequest {
        broker_id: settings.account.broker_id.clone(),
        user_id: settings.account.user_id.clone(),
        app_id: settings.account.app_id.clone(),
        auth_code: settings.account.auth_code.clone(),
    };

    let engine = Arc::new(Mutex::new(TradeEngine::new(
        main_contract.clone(),
        sessions,
        Box::new(TwoTickMomentum),
        td_gateway.clone(),
        ChronoDuration::seconds(settings.execution.order_timeout_secs as i64),
    )));

    let md_session = MarketDataSession::new(
        md_gateway.clone(),
        credentials.clone(),
        vec![main_contract],
    );
    let td_session = TradingSession::new(td_gateway.clone(), auth, credentials);

    let runner = Runner {
        engine,
        md_session,
        td_session,
        md_gateway,
        td_gateway,
        stale_poll: Duration::from_secs(settings.execution.stale_poll_secs),
    };
    runner.run(md_rx, td_rx).await?;

    tracing::info!("👋 futbot stopped");
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("futbot=info")),
        )
        .init();
}
