//! Error handling

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::model::ClassifierError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Modelo no cargado")]
    ModelUnavailable,

    #[error("No hay archivo en la solicitud")]
    MissingFile,

    #[error("No hay archivo seleccionado")]
    EmptyFile,

    #[error("Formulario inválido: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Se esperaba un formulario multipart: {0}")]
    NotMultipart(#[from] MultipartRejection),

    #[error("No se pudo decodificar la imagen: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Ocurrió un error en el servidor: {0}")]
    Inference(#[from] ClassifierError),

    #[error("Ocurrió un error en el servidor: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::MissingFile
            | AppError::EmptyFile
            | AppError::Multipart(_)
            | AppError::NotMultipart(_) => StatusCode::BAD_REQUEST,
            AppError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Inference(_) | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("predict failed: {}", self);
        } else {
            tracing::warn!("rejected request: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
