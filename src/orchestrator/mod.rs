//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `document_processor` - 单次请求处理器
//! - 管理临时工作目录的生命周期
//! - 串联 渲染 → 合并
//!
//! ### `batch_processor` - 批量幻灯片渲染器
//! - 管理浏览器资源（Browser、Page）
//! - 控制并发数量（Semaphore）
//! - 按输入顺序收集结果
//!
//! ## 层次关系
//!
//! ```text
//! document_processor (处理一个请求)
//!     ↓
//! batch_processor (处理 Vec<RenderJob>)
//!     ↓
//! workflow::SlideFlow (处理单张幻灯片)
//!     ↓
//! infrastructure (基础设施：PdfPrinter / BrowserSession)
//! ```

pub mod batch_processor;
pub mod document_processor;

pub use batch_processor::{fan_out, AbortSignal, ChromiumBackend, RenderBackend};
pub use document_processor::DocumentPipeline;
