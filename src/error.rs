use std::io;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chromiumoxide::error::CdpError;
use serde::Serialize;
use thiserror::Error;

/// 应用程序错误类型
///
/// 请求处理边界上的唯一错误类型，`Validation` 映射为 400，其余映射为 500。
#[derive(Debug, Error)]
pub enum AppError {
    /// 请求体校验失败
    #[error("请求参数无效: {0}")]
    Validation(String),
    /// 临时工作目录错误
    #[error("临时目录错误: {0}")]
    Workspace(#[from] WorkspaceError),
    /// 渲染错误
    #[error("渲染失败: {0}")]
    Render(#[from] RenderError),
    /// 合并错误
    #[error("合并失败: {0}")]
    Merge(#[from] MergeError),
}

impl AppError {
    /// 创建校验错误
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Workspace(_) | AppError::Render(_) | AppError::Merge(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// 浏览器渲染错误
///
/// `slide` 均为从 1 开始的幻灯片编号。
#[derive(Debug, Error)]
pub enum RenderError {
    /// 浏览器配置或启动失败
    #[error("启动无头浏览器失败: {reason}")]
    Launch { reason: String },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreation {
        #[source]
        source: CdpError,
    },
    /// 导航失败
    #[error("幻灯片 {slide} 加载失败: {source}")]
    Navigation {
        slide: usize,
        #[source]
        source: CdpError,
    },
    /// 设置视口失败
    #[error("幻灯片 {slide} 设置视口失败: {source}")]
    Viewport {
        slide: usize,
        #[source]
        source: CdpError,
    },
    /// 导出 PDF 失败
    #[error("幻灯片 {slide} 导出 PDF 失败: {source}")]
    PdfExport {
        slide: usize,
        #[source]
        source: CdpError,
    },
    /// 浏览器返回的内容不是 PDF
    #[error("幻灯片 {slide} 的输出不是有效的 PDF")]
    InvalidOutput { slide: usize },
    /// 渲染超时
    #[error("幻灯片 {slide} 渲染超时 ({secs} 秒)")]
    Timeout { slide: usize, secs: u64 },
    /// 渲染任务异常退出
    #[error("渲染任务异常退出: {reason}")]
    TaskFailed { reason: String },
    /// 其他幻灯片失败，本张被取消
    #[error("渲染已取消")]
    Cancelled,
    /// 渲染结果数量或顺序与输入不一致
    #[error("渲染结果不完整: 期望 {expected} 页, 实际 {actual} 页")]
    Incomplete { expected: usize, actual: usize },
}

/// PDF 合并错误
#[derive(Debug, Error)]
pub enum MergeError {
    /// 没有可合并的页面
    #[error("没有可合并的 PDF")]
    Empty,
    /// 中间 PDF 无法解析
    #[error("第 {slide} 张幻灯片的 PDF 无法解析: {source}")]
    Parse {
        slide: usize,
        #[source]
        source: lopdf::Error,
    },
    /// 单张幻灯片的 PDF 不是恰好一页
    #[error("第 {slide} 张幻灯片应为 1 页, 实际 {pages} 页")]
    PageCount { slide: usize, pages: usize },
    /// PDF 结构不完整
    #[error("PDF 结构无效: {0}")]
    Structure(String),
    /// 序列化失败
    #[error("写出合并后的 PDF 失败: {0}")]
    Save(String),
}

/// 临时工作目录错误
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// 创建目录失败
    #[error("创建临时目录失败: {0}")]
    Create(#[source] io::Error),
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}", path = .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// 删除目录失败
    #[error("删除临时目录失败 ({path}): {source}", path = .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 值无法解析
    #[error("环境变量 {var_name} 的值 '{value}' 无效, 可选: {expected}")]
    InvalidValue {
        var_name: String,
        value: String,
        expected: String,
    },
    /// 值必须大于 0
    #[error("环境变量 {var_name} 必须大于 0")]
    MustBePositive { var_name: String },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = AppError::validation("htmls 不能为空");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("htmls 不能为空"));
    }

    #[test]
    fn test_render_and_merge_map_to_server_error() {
        let render: AppError = RenderError::Timeout { slide: 3, secs: 30 }.into();
        assert_eq!(render.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(render.to_string().contains("幻灯片 3"));

        let merge: AppError = MergeError::Empty.into();
        assert_eq!(merge.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
