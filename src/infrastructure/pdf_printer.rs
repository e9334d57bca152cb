//! PDF 打印器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"加载 / 设置视口 / 打印"的能力

use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use tracing::warn;

use crate::models::PageLayout;

/// PDF 打印器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 不认识幻灯片 / 请求
/// - 不处理超时和重试
pub struct PdfPrinter {
    page: Page,
}

impl PdfPrinter {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 导航到指定 URL 并等待加载完成
    pub async fn load(&self, url: &str) -> Result<(), CdpError> {
        self.page.goto(url).await?;
        Ok(())
    }

    /// 固定视口大小，不受 HTML 内容尺寸影响
    pub async fn set_viewport(&self, layout: PageLayout) -> Result<(), CdpError> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(layout.width_px),
            i64::from(layout.height_px),
            1.0,
            false,
        );
        self.page.execute(params).await?;
        Ok(())
    }

    /// 把当前页面打印为 PDF
    pub async fn print(&self, layout: PageLayout) -> Result<Vec<u8>, CdpError> {
        self.page.pdf(print_params(layout)).await
    }

    /// 关闭页面
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            warn!("⚠️ 关闭页面失败: {}", e);
        }
    }
}

/// 纸张与视口等大，无边距，打印背景，只导出第一页
pub fn print_params(layout: PageLayout) -> PrintToPdfParams {
    PrintToPdfParams {
        print_background: Some(true),
        paper_width: Some(layout.paper_width_in()),
        paper_height: Some(layout.paper_height_in()),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        prefer_css_page_size: Some(false),
        page_ranges: Some("1".to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_params_match_slide_viewport() {
        let params = print_params(PageLayout::SLIDE);
        assert_eq!(params.print_background, Some(true));
        assert_eq!(params.margin_top, Some(0.0));
        assert_eq!(params.margin_right, Some(0.0));
        assert_eq!(params.margin_bottom, Some(0.0));
        assert_eq!(params.margin_left, Some(0.0));
        assert_eq!(params.page_ranges.as_deref(), Some("1"));

        let width = params.paper_width.unwrap();
        let height = params.paper_height.unwrap();
        assert!((width * 96.0 - 1280.0).abs() < 1e-6);
        assert!((height * 96.0 - 720.0).abs() < 1e-6);
    }
}
