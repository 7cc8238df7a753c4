use axum::{
    Router,
    routing::{get, post},
};

use http::{Method, header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
    cors::CorsLayer,
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod state;
mod db;
mod crypto {
    pub mod envelope;
}

mod models {
    pub mod session;
    pub mod token;
    pub mod attendance;
}

mod repositories {
    pub mod sessions;
    pub mod tokens;
    pub mod attendance;
}

mod services {
    pub mod qr;
    pub mod schedules;
}

mod handlers {
    pub mod qr;
    pub mod respond;
    pub mod schedules;
}

mod validation {
    pub mod fields;
}

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config)?;

    match db::ensure_schema(&state.db).await {
        Ok(()) => {
            tracing::info!("✅ Database schema ensured");
        }
        Err(e) => {
            tracing::error!("❌ Failed to ensure database schema: {}", e);
            return Err(e.into());
        }
    }

    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:5173".parse().unwrap(),
            "http://127.0.0.1:5173".parse().unwrap(),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let qr_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(20)
            .burst_size(100)
            .use_headers()
            .finish()
            .unwrap(),
    );

    let qr_routes = Router::new()
        .route(
            "/api/qr",
            post(handlers::qr::issue).put(handlers::qr::redeem),
        )
        .layer(tower_governor::GovernorLayer::new(qr_governor_conf))
        .with_state(state.clone());

    let schedule_routes = Router::new()
        .route(
            "/api/schedules",
            post(handlers::schedules::create)
                .put(handlers::schedules::list)
                .delete(handlers::schedules::remove),
        )
        .with_state(state.clone());

    let app = Router::new()
        .route("/", get(handlers::respond::root))
        .merge(qr_routes)
        .merge(schedule_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(cors)
        .fallback(handlers::respond::not_found);

    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("✅ All systems operational");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
