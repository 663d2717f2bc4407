use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::{error::ErrorReport, render::RenderError};

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.envelope())).into_response();
        ErrorReport::from_error("infra::http::render", status, &self).attach(&mut response);
        response
    }
}
