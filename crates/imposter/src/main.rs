use imposter::{ImposterError, ImposterServer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), ImposterError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imposter=info,imposter_room=info,imposter_game=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = std::env::var("IMPOSTER_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = ImposterServer::builder().bind(&bind_addr).build().await?;
    match server.local_addr() {
        Ok(addr) => tracing::info!(%addr, "listening"),
        Err(e) => tracing::warn!(error = %e, "local address unavailable"),
    }

    server.run().await
}
