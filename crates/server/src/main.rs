use server::{config, db, health, telemetry};

#[tokio::main]
async fn main() {
    let config = config::load_config();

    telemetry::init_tracing(&config.telemetry);
    let otel = telemetry::init_telemetry(&config.telemetry);
    health::record_start_time();

    let repos = match db::connect(&config.database).await {
        Ok(repos) => repos,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialise the store");
            std::process::exit(1);
        }
    };
    tracing::info!(store = config.database.backend.as_str(), "store ready");

    let state = db::AppState::new(repos, config.pagination.clone());
    let mut router = server::app(state);
    if otel {
        router = router.layer(telemetry::OtelTraceLayer);
    }

    let address = config.server.bind_address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%address, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(%address, "todo server listening; docs at /docs");

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
