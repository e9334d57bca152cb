//! HTTP 接口层
//!
//! - `POST /generate-pdf`：HTML 列表 → 合并后的 PDF
//! - `GET /health`：存活检查

pub mod pdf;


use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::orchestrator::DocumentPipeline;

pub use pdf::{handle_generate_pdf, handle_health};

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DocumentPipeline>,
}

impl AppState {
    pub fn new(pipeline: DocumentPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// 构建路由
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    // 允许任意来源的浏览器前端调用
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/generate-pdf", post(handle_generate_pdf))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
