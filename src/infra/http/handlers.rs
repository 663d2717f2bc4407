use axum::{
    Form, Json,
    body::Body,
    extract::{FromRequest, Path, Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::CONTENT_TYPE,
    },
    response::{IntoResponse, Response},
};
use mathcast_api_types::{Features, RenderBody};
use serde::Deserialize;

use crate::application::{
    error::ErrorReport,
    render::{ArtifactBody, RenderRequest, ResponsePayload},
};

use super::state::HttpState;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Default, Deserialize)]
pub struct LookupParams {
    outformat: Option<String>,
    #[serde(rename = "type")]
    input_type: Option<String>,
    q: Option<String>,
}

/// `GET /get/{outformat}/{type}/{q}`. No features are passed, so speech is
/// produced only when the speech format itself is requested.
pub async fn lookup(State(state): State<HttpState>, Path(params): Path<LookupParams>) -> Response {
    let LookupParams {
        outformat,
        input_type,
        q,
    } = params;

    let request = RenderRequest {
        markup: q.unwrap_or_default(),
        input_type,
        output_format: outformat,
        features: Some(Features::default()),
    };
    render(&state, request).await
}

pub async fn lookup_root(State(state): State<HttpState>) -> Response {
    render(&state, RenderRequest::default()).await
}

/// `POST /`, rendering JSON.
pub async fn submit_default(State(state): State<HttpState>, request: Request) -> Response {
    submit(&state, None, request).await
}

/// `POST /{outformat}`.
pub async fn submit_format(
    State(state): State<HttpState>,
    Path(outformat): Path<String>,
    request: Request,
) -> Response {
    submit(&state, Some(outformat), request).await
}

pub async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn submit(state: &HttpState, outformat: Option<String>, request: Request) -> Response {
    let body = match read_body(request).await {
        Ok(body) => body,
        Err(response) => return response,
    };

    let speech_on = state.service.capabilities().speech_on;
    let request = RenderRequest {
        markup: body.q.unwrap_or_default(),
        input_type: body.input_type,
        output_format: outformat,
        features: Some(Features {
            speech: speech_on && !body.nospeech,
        }),
    };
    render(state, request).await
}

async fn read_body(request: Request) -> Result<RenderBody, Response> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with(JSON_CONTENT_TYPE) {
        Json::<RenderBody>::from_request(request, &())
            .await
            .map(|Json(body)| body)
            .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))
    } else if content_type.starts_with(FORM_CONTENT_TYPE) {
        Form::<RenderBody>::from_request(request, &())
            .await
            .map(|Form(body)| body)
            .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))
    } else {
        // No recognizable body; the missing query is reported by the pipeline.
        Ok(RenderBody::default())
    }
}

fn rejected(status: StatusCode, message: String) -> Response {
    let mut response = (status, message.clone()).into_response();
    ErrorReport::from_message("infra::http::body", status, message).attach(&mut response);
    response
}

async fn render(state: &HttpState, request: RenderRequest) -> Response {
    match state.service.render(request).await {
        Ok(payload) => payload_response(payload),
        Err(err) => err.into_response(),
    }
}

fn payload_response(payload: ResponsePayload) -> Response {
    let mut headers = HeaderMap::new();
    for (name, value) in payload.headers() {
        match HeaderValue::try_from(value) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(name), value);
            }
            Err(err) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let mut response = status.into_response();
                ErrorReport::from_error("infra::http::headers", status, &err)
                    .attach(&mut response);
                return response;
            }
        }
    }

    let body = match payload {
        ResponsePayload::Artifact { body, .. } => match body {
            ArtifactBody::Text(text) => Body::from(text),
            ArtifactBody::Binary(bytes) => Body::from(bytes),
        },
        other => match serde_json::to_vec(&other.to_json()) {
            Ok(bytes) => Body::from(bytes),
            Err(err) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let mut response = status.into_response();
                ErrorReport::from_error("infra::http::encode", status, &err)
                    .attach(&mut response);
                return response;
            }
        },
    };

    (StatusCode::OK, headers, body).into_response()
}
