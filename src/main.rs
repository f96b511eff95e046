use std::sync::Arc;

use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paperdesk::services::{AccountStore, FeeSchedule, LedgerEvent, LedgerService};
use paperdesk::types::ServerMessage;
use paperdesk::websocket::{ws_handler, ClientRegistry};
use paperdesk::{api, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paperdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting paperdesk server on {}:{}", config.host, config.port);

    // Open the durable account store and restore (or freshly create) the ledger
    let store = Arc::new(
        AccountStore::new(&config.database_path)?
            .with_key(&config.account_key)
            .with_staleness(config.stale_after_ms()),
    );
    let fees = FeeSchedule {
        commission_rate: config.fees.commission_rate,
        min_commission: config.fees.min_commission,
        transfer_fee_rate: config.fees.transfer_fee_rate,
        stamp_duty_rate: config.fees.stamp_duty_rate,
    };
    let ledger = Arc::new(LedgerService::new(
        store,
        fees,
        config.initial_capital,
        &config.currency,
    ));

    // Registry of connected WebSocket clients
    let clients = ClientRegistry::new();

    // Fan ledger change events out to every connected client
    {
        let clients = clients.clone();
        let mut events = ledger.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                let message = match event {
                    LedgerEvent::Changed => ServerMessage::LedgerChanged,
                    LedgerEvent::SaveFailed => ServerMessage::SaveWarning {
                        message: "account state is live but not being saved".to_string(),
                    },
                };
                if let Ok(json) = serde_json::to_string(&message) {
                    clients.broadcast_all(&json);
                }
            }
            warn!("Ledger event channel closed");
        });
    }

    // Create application state
    let state = AppState {
        config: config.clone(),
        ledger,
        clients,
    };

    // CORS layer for browser dashboard clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
