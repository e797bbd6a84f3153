//! FileWatermarkStore - watermark をテキストファイル 1 つに保存
//!
//! # フォーマット
//! ファイルの中身は ISO-8601 の文字列 1 つだけ（末尾の改行は許容）。
//!
//! # 書き込み
//! 同じディレクトリの `<name>.tmp` に書いてから rename するので、
//! 書き込み途中で落ちても元の値が残ります。

use async_trait::async_trait;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

use crate::domain::{GitwatchError, Watermark};
use crate::ports::{Clock, WatermarkStore};

pub struct FileWatermarkStore {
    path: PathBuf,
    /// ファイルがないときの初期値（None なら現在時刻）
    fallback: Option<Watermark>,
    clock: Arc<dyn Clock>,
}

impl FileWatermarkStore {
    pub fn new(path: impl Into<PathBuf>, fallback: Option<Watermark>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            fallback,
            clock,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn storage_error(&self, action: &str, err: impl std::fmt::Display) -> GitwatchError {
        GitwatchError::Storage(format!("{action} {}: {err}", self.path.display()))
    }
}

#[async_trait]
impl WatermarkStore for FileWatermarkStore {
    async fn read(&self) -> Result<Watermark, GitwatchError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => raw
                .parse::<Watermark>()
                .map_err(|e| self.storage_error("unparseable watermark in", e)),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                let initial = self
                    .fallback
                    .unwrap_or_else(|| Watermark::from_datetime(self.clock.now()));
                info!(path = %self.path.display(), since = %initial, "initializing watermark file");
                self.write(initial).await?;
                Ok(initial)
            }
            Err(e) => Err(self.storage_error("failed to read", e)),
        }
    }

    async fn write(&self, watermark: Watermark) -> Result<(), GitwatchError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error("failed to create directory for", e))?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, watermark.to_iso_string())
            .await
            .map_err(|e| self.storage_error("failed to write", e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.storage_error("failed to replace", e))?;

        debug!(path = %self.path.display(), %watermark, "watermark written");
        Ok(())
    }
}
