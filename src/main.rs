use std::path::PathBuf;

use tracing::info;

use model_store::api;
use model_store::config::Settings;
use model_store::store::ModelStore;

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                // Use INFO level as default
                .add_directive(tracing::Level::INFO.into()),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to initialize logger");

    let settings = Settings::load(std::env::args_os().nth(1).map(PathBuf::from))
        .expect("failed to load settings");

    let store =
        ModelStore::open(&settings.data_dir).expect("failed to open model store directory");
    info!(data_dir = %settings.data_dir.display(), "model store opened");

    let app = api::router(store);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");
    info!(%addr, "HTTP server bound");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to register interrupt handler");
            info!("Received signal. Shutting down.");
        })
        .await
        .expect("server exited with error");
}
