use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard envelope returned by every handler.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T, M> IntoResponse for StdResponse<T, M>
where
    T: Serialize,
    M: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    ForbiddenResource(String),

    #[error("Not found")]
    NotFound,

    #[error("{0} is unreachable")]
    ServiceUnreachable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenResource(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ServiceUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Other(err) => {
                tracing::error!(error = ?err, "Unhandled error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body: StdResponse<(), String> = StdResponse {
            data: None,
            message: Some(message),
        };
        (status, Json(body)).into_response()
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => AppError::NotFound,
            other => AppError::Other(other.into()),
        }
    }
}
