//! # Slide PDF Server
//!
//! 把一组 HTML 幻灯片渲染为 16:9 PDF 并合并为一个文件的 HTTP 服务
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 启动 / 关闭无头浏览器（`BrowserSession`）
//! - `infrastructure/` - `PdfPrinter`，唯一的 page owner，提供加载和打印能力
//!
//! ### ② 能力层（Services）
//! - `TempWorkspace` - 请求级临时目录，结束时整体删除
//! - `merge_pages` - 按顺序合并单页 PDF
//!
//! ### ③ 流程层（Workflow）
//! - `SlideCtx` - 上下文封装（request_id + slide index）
//! - `SlideFlow` - 一张幻灯片：加载 → 视口 → 打印
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量渲染，管理浏览器资源和并发
//! - `orchestrator/document_processor` - 单次请求：工作目录 → 渲染 → 合并 → 清理
//!
//! ### ⑤ 接口层（API）
//! - `api/` - `POST /generate-pdf`、`GET /health`

pub mod api;
pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod test_support;

// 重新导出常用类型
pub use app::App;
pub use config::{Config, RenderStrategy};
pub use error::{AppError, AppResult, MergeError, RenderError};
pub use models::{MergedDocument, PageLayout, RenderJob, RenderedPage};
pub use orchestrator::{ChromiumBackend, DocumentPipeline, RenderBackend};
pub use services::{count_pages, merge_pages, TempWorkspace};
