use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Html,
    Json,
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::model::{Classifier, TopPrediction};
use crate::scorer::{self, ExperienceTier, PredictionResult};

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    /// `None` when the model failed to load at startup.
    pub classifier: Option<Arc<dyn Classifier>>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        model_loaded: state.classifier.is_some(),
    })
}

#[derive(Default)]
struct PredictForm {
    file: Option<(Option<String>, Vec<u8>)>,
    threshold: Option<String>,
    user_experience: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> AppResult<PredictForm> {
    let mut form = PredictForm::default();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_owned);
                let bytes = field.bytes().await?;
                form.file = Some((file_name, bytes.to_vec()));
            }
            Some("threshold") => form.threshold = Some(field.text().await?),
            Some("user_experience") => form.user_experience = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<PredictionResult>> {
    let classifier = state.classifier.ok_or(AppError::ModelUnavailable)?;

    let form = read_form(multipart?).await?;
    let threshold = scorer::parse_threshold(form.threshold.as_deref());
    let experience = form
        .user_experience
        .as_deref()
        .map(ExperienceTier::from_form)
        .unwrap_or_default();

    let (file_name, image_data) = form.file.ok_or(AppError::MissingFile)?;
    if file_name.as_deref() == Some("") || image_data.is_empty() {
        return Err(AppError::EmptyFile);
    }

    // Decoding and the session run are CPU-bound; keep them off the runtime
    // workers.
    let top = tokio::task::spawn_blocking(move || -> AppResult<TopPrediction> {
        let image = image::load_from_memory(&image_data)?;
        Ok(classifier.classify(&image)?)
    })
    .await??;
    let result = scorer::assess(top, threshold, experience);

    tracing::info!(
        class = result.class_name,
        confidence = %result.confidence_percent,
        score = result.final_score,
        threshold,
        experience = %experience,
        "prediction served"
    );

    Ok(Json(result))
}
