use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod config;
mod download;
mod error;
mod handlers;
mod model;
mod risk;
mod scorer;

use config::Config;
use download::ensure_model_exists;
use handlers::AppState;
use model::{Classifier, TensorflowClassifier};

fn load_classifier(config: &Config) -> Option<Arc<dyn Classifier>> {
    match TensorflowClassifier::load(&config.model_path, config.model.clone()) {
        Ok(model) => {
            tracing::info!("Loaded model from {}", config.model_path.display());
            Some(Arc::new(model))
        }
        Err(err) => {
            tracing::error!(
                "Could not load model {}: {}; /predict will be unavailable",
                config.model_path.display(),
                err
            );
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "distraction_risk=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let classifier = if ensure_model_exists(&config.model_path, config.model_url.as_deref()).await {
        load_classifier(&config)
    } else {
        None
    };

    let app = app::create_router(AppState { classifier }, config.body_limit_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
