//! AppBuilder - RunOrchestrator の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - 必須の port（WatermarkStore / CommitSource / Mailer）と追跡パスが
//!   揃っていなければ build() で BuildError を返す
//! - 足りないものは 1 回のエラーでまとめて報告する
//! - Digest テンプレートも build() 時にコンパイルする（最初の Run を待たない）

use std::sync::Arc;

use super::digest::DigestFormatter;
use super::orchestrator::{RunOrchestrator, RunSettings};
use super::retry::RetryPolicy;
use crate::config::DEFAULT_SUBJECT;
use crate::domain::GitwatchError;
use crate::ports::{
    ChatNotifier, Clock, CommitSource, IdGenerator, Mailer, SystemClock, UlidGenerator,
    WatermarkStore,
};

/// AppBuilder は RunOrchestrator を構築
///
/// # 使用例
/// ```ignore
/// let orchestrator = AppBuilder::new()
///     .watermark_store(Arc::new(FileWatermarkStore::new(path, None, clock.clone())))
///     .commit_source(Arc::new(gitlab))
///     .mailer(Arc::new(smtp))
///     .tracked_path("config/app.yml")
///     .build()?;
/// ```
pub struct AppBuilder {
    store: Option<Arc<dyn WatermarkStore>>,
    source: Option<Arc<dyn CommitSource>>,
    mailer: Option<Arc<dyn Mailer>>,
    chat: Option<Arc<dyn ChatNotifier>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    tracked_path: Option<String>,
    subject: String,
    retry: RetryPolicy,
    dry_run: bool,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing components: {0:?}. These must be provided before build().")]
    MissingComponents(Vec<&'static str>),

    #[error(transparent)]
    Formatter(#[from] GitwatchError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            source: None,
            mailer: None,
            chat: None,
            clock: None,
            ids: None,
            tracked_path: None,
            subject: DEFAULT_SUBJECT.to_string(),
            retry: RetryPolicy::standard(),
            dry_run: false,
        }
    }

    pub fn watermark_store(mut self, store: Arc<dyn WatermarkStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn commit_source(mut self, source: Arc<dyn CommitSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// チャット通知（任意）
    pub fn chat(mut self, chat: Arc<dyn ChatNotifier>) -> Self {
        self.chat = Some(chat);
        self
    }

    /// 省略時は SystemClock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 省略時は clock を使う UlidGenerator
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn tracked_path(mut self, path: impl Into<String>) -> Self {
        self.tracked_path = Some(path.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// RunOrchestrator を構築
    ///
    /// # 検証
    /// - 必須 port と追跡パスが揃っているか
    /// - Digest テンプレートがコンパイルできるか
    pub fn build(self) -> Result<RunOrchestrator, BuildError> {
        let mut missing = Vec::new();
        if self.store.is_none() {
            missing.push("watermark_store");
        }
        if self.source.is_none() {
            missing.push("commit_source");
        }
        if self.mailer.is_none() {
            missing.push("mailer");
        }
        if self.tracked_path.as_deref().is_none_or(str::is_empty) {
            missing.push("tracked_path");
        }

        let (Some(store), Some(source), Some(mailer), Some(tracked_path), true) = (
            self.store,
            self.source,
            self.mailer,
            self.tracked_path,
            missing.is_empty(),
        ) else {
            return Err(BuildError::MissingComponents(missing));
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let formatter = DigestFormatter::new()?;

        Ok(RunOrchestrator::new(
            store,
            source,
            mailer,
            self.chat,
            formatter,
            clock,
            ids,
            RunSettings {
                tracked_path,
                subject: self.subject,
                retry: self.retry,
                dry_run: self.dry_run,
            },
        ))
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
