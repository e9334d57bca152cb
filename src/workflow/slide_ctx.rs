//! 幻灯片渲染上下文
//!
//! 封装"我正在处理哪个请求的第几张幻灯片"这一信息

use std::fmt::Display;

/// 幻灯片渲染上下文
#[derive(Debug, Clone)]
pub struct SlideCtx {
    /// 请求 ID（仅用于日志）
    pub request_id: String,

    /// 幻灯片在输入中的索引（从0开始）
    pub index: usize,

    /// 本次请求的幻灯片总数
    pub total: usize,
}

impl SlideCtx {
    pub fn new(request_id: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            request_id: request_id.into(),
            index,
            total,
        }
    }

    /// 从 1 开始的编号
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

impl Display for SlideCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[请求 {}] [幻灯片 {}/{}]",
            self.request_id,
            self.number(),
            self.total
        )
    }
}
