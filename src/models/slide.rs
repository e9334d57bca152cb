//! 幻灯片相关的数据模型
//!
//! 所有模型都只在一次请求内存在，顺序即页码。

use std::path::PathBuf;

use serde_json::Value as JsonValue;

use crate::error::AppError;

/// 合并后 PDF 的下载文件名
pub const MERGED_FILENAME: &str = "merged_slides.pdf";

/// 浏览器中 1 英寸对应的 CSS 像素
const CSS_PX_PER_INCH: f64 = 96.0;
/// PDF 中 1 英寸对应的点数
const PT_PER_INCH: f64 = 72.0;

/// 页面版式：固定的像素视口，同时也是导出的纸张大小
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub width_px: u32,
    pub height_px: u32,
}

impl PageLayout {
    /// 16:9 幻灯片版式 (1280×720)
    pub const SLIDE: PageLayout = PageLayout {
        width_px: 1280,
        height_px: 720,
    };

    pub fn paper_width_in(&self) -> f64 {
        f64::from(self.width_px) / CSS_PX_PER_INCH
    }

    pub fn paper_height_in(&self) -> f64 {
        f64::from(self.height_px) / CSS_PX_PER_INCH
    }

    pub fn width_pt(&self) -> f64 {
        self.paper_width_in() * PT_PER_INCH
    }

    pub fn height_pt(&self) -> f64 {
        self.paper_height_in() * PT_PER_INCH
    }
}

/// `POST /generate-pdf` 的请求体
///
/// 只做结构校验，不关心 HTML 内容本身。
pub struct GeneratePdfRequest;

impl GeneratePdfRequest {
    /// 从 JSON 中取出有序的 HTML 列表
    ///
    /// # 返回
    /// - `htmls` 缺失、不是数组、为空、或含有非字符串元素时返回 `AppError::Validation`
    pub fn from_json(body: &JsonValue) -> Result<Vec<String>, AppError> {
        let object = body
            .as_object()
            .ok_or_else(|| AppError::validation("请求体必须是 JSON 对象"))?;

        let htmls = object
            .get("htmls")
            .ok_or_else(|| AppError::validation("缺少 'htmls' 字段"))?
            .as_array()
            .ok_or_else(|| AppError::validation("'htmls' 必须是数组"))?;

        if htmls.is_empty() {
            return Err(AppError::validation("'htmls' 不能为空"));
        }

        htmls
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::validation(format!("'htmls[{}]' 必须是字符串", i)))
            })
            .collect()
    }
}

/// 渲染任务：一张幻灯片在工作目录中的 HTML 文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    /// 输入顺序（从 0 开始）
    pub index: usize,
    /// 写入工作目录的 HTML 文件
    pub html_path: PathBuf,
}

impl RenderJob {
    /// 供浏览器导航的本地文件 URL
    pub fn file_url(&self) -> String {
        format!("file://{}", self.html_path.display())
    }

    /// 从 1 开始的幻灯片编号，用于日志和错误信息
    pub fn slide_number(&self) -> usize {
        self.index + 1
    }
}

/// 一张幻灯片渲染出的单页 PDF
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub index: usize,
    pub bytes: Vec<u8>,
}

/// 合并后的完整文档
#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_slide_layout_is_16_by_9() {
        let layout = PageLayout::SLIDE;
        assert_eq!(layout.width_px * 9, layout.height_px * 16);
        assert!((layout.paper_height_in() - 7.5).abs() < 1e-9);
        assert!((layout.width_pt() - 960.0).abs() < 1e-9);
        assert!((layout.height_pt() - 540.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_json_keeps_order() {
        let body = json!({ "htmls": ["<p>1</p>", "<p>2</p>", "<p>3</p>"] });
        let htmls = GeneratePdfRequest::from_json(&body).unwrap();
        assert_eq!(htmls, vec!["<p>1</p>", "<p>2</p>", "<p>3</p>"]);
    }

    #[test]
    fn test_from_json_rejects_bad_payloads() {
        let cases = [
            json!({}),
            json!({ "htmls": [] }),
            json!({ "htmls": "<p>1</p>" }),
            json!({ "htmls": null }),
            json!({ "htmls": ["<p>1</p>", 2] }),
            json!(["<p>1</p>"]),
        ];
        for body in cases {
            let err = GeneratePdfRequest::from_json(&body).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "body: {}", body);
        }
    }

    #[test]
    fn test_job_url_and_number() {
        let job = RenderJob {
            index: 0,
            html_path: PathBuf::from("/tmp/slides-x/s1.html"),
        };
        assert_eq!(job.file_url(), "file:///tmp/slides-x/s1.html");
        assert_eq!(job.slide_number(), 1);
    }
}
