use std::{
    fs::OpenOptions,
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use plaid_proxy::{
    AppState, MarkPolicy, PaginationConfig, PlaidClient, ProviderConfig, build_router,
    graceful_shutdown,
};

/// The proxy server between the Second Brain Obsidian plugin and the Plaid
/// API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, default_value = "plaid_proxy.db")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Reject mark-processed calls that name transactions outside the batch
    /// instead of silently ignoring those IDs.
    #[arg(long)]
    reject_unknown_ids: bool,
}

#[tokio::main]
async fn main() {
    // The Plaid credentials may live in a `.env` file next to the binary.
    let _ = dotenvy::dotenv();

    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let provider_config = ProviderConfig::from_env();
    if !provider_config.is_configured() {
        tracing::warn!(
            "PLAID_CLIENT_ID and/or PLAID_SECRET are not set. \
             Requests must carry their own credentials."
        );
    }
    tracing::info!(
        "Plaid environment: {}",
        provider_config.environment.as_str()
    );

    let mark_policy = if args.reject_unknown_ids {
        MarkPolicy::RejectUnknownIds
    } else {
        MarkPolicy::Permissive
    };

    let conn = Connection::open(&args.db_path).expect("Could not open the database.");
    let app_state = AppState::new(
        conn,
        Arc::new(PlaidClient::new()),
        provider_config,
        PaginationConfig::default(),
        mark_policy,
    )
    .expect("Could not initialize the database.");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(app_state));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
