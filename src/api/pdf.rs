use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, warn};

use crate::api::AppState;
use crate::error::AppError;
use crate::models::{GeneratePdfRequest, MERGED_FILENAME};

const PDF_CONTENT_TYPE: &str = "application/pdf";

fn attachment_disposition() -> String {
    format!("attachment; filename=\"{}\"", MERGED_FILENAME)
}

/// 存活检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /generate-pdf
///
/// 请求体 `{"htmls": ["<html>...", ...]}`，成功时以附件形式返回合并后的 PDF。
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Response {
    match generate_pdf(&state, payload).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                AppError::Validation(_) => warn!("⚠️ 拒绝请求: {}", e),
                _ => error!("[ERROR] PDF 生成失败: {}", e),
            }
            e.into_response()
        }
    }
}

async fn generate_pdf(
    state: &AppState,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) =
        payload.map_err(|e| AppError::validation(format!("无法解析 JSON: {}", e.body_text())))?;
    let htmls = GeneratePdfRequest::from_json(&body)?;

    let document = state.pipeline.generate(&htmls).await?;

    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, attachment_disposition()),
        ],
        document.bytes,
    )
        .into_response())
}
