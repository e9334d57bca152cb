//! 请求级临时工作目录
//!
//! 一次请求的所有中间文件（HTML、浏览器 profile）都放在这里，
//! `close()` 或 drop 时整体递归删除。

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::WorkspaceError;
use crate::models::RenderJob;
use crate::utils::logging::truncate_text;

const WORKSPACE_PREFIX: &str = "slides-";

/// 临时工作目录
#[derive(Debug)]
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    /// 创建新的工作目录
    ///
    /// # 参数
    /// - `root`: 父目录，为空时使用系统临时目录
    pub fn create(root: Option<&Path>) -> Result<Self, WorkspaceError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root).map_err(WorkspaceError::Create)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(WorkspaceError::Create)?;

        debug!("创建临时目录: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// 把一张幻灯片的 HTML 写入 `s{index+1}.html`
    pub fn write_slide(&self, index: usize, html: &str) -> Result<RenderJob, WorkspaceError> {
        let html_path = self.dir.path().join(format!("s{}.html", index + 1));
        fs::write(&html_path, html.as_bytes()).map_err(|source| WorkspaceError::Write {
            path: html_path.clone(),
            source,
        })?;
        debug!(
            "写入 {}: {}",
            html_path.display(),
            truncate_text(html.trim(), 60)
        );
        Ok(RenderJob { index, html_path })
    }

    /// 按顺序写入全部幻灯片
    pub fn write_slides(&self, htmls: &[String]) -> Result<Vec<RenderJob>, WorkspaceError> {
        htmls
            .iter()
            .enumerate()
            .map(|(index, html)| self.write_slide(index, html))
            .collect()
    }

    /// 浏览器 profile 目录，每个浏览器实例独占一个
    pub fn profile_dir(&self, slot: usize) -> PathBuf {
        self.dir.path().join(format!("profile-{}", slot))
    }

    /// 递归删除工作目录
    pub fn close(self) -> Result<(), WorkspaceError> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|source| WorkspaceError::Cleanup { path: path.clone(), source })?;
        debug!("已删除临时目录: {}", path.display());
        Ok(())
    }

    /// 删除目录，失败时只记录日志
    pub fn close_quietly(self) {
        if let Err(e) = self.close() {
            warn!("⚠️ {}", e);
        }
    }
}
