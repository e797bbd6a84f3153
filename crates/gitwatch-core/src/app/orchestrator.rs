//! RunOrchestrator - 1 tick 分の変更検知パイプライン
//!
//! # フロー
//! 1. WatermarkStore::read() で since を取得
//! 2. CommitSource::fetch_commits() で since 以降の Commit を全ページ取得
//! 3. collect_batch() で Commit ごとに diff を解決・絞り込み
//! 4. Batch が空ならログだけ、あれば DigestFormatter で描画して Mailer で送信
//! 5. すべて成功したら watermark を Run 開始時刻へ前進
//!
//! # 失敗時
//! どのステップで失敗しても watermark は書かずにエラーを返します。
//! 次の tick は同じ区間を再取得するので、配送は at-least-once になります。
//! チャット通知は best-effort で、失敗しても Run の成否に影響しません。
//!
//! # 再入防止
//! 前の Run が実行中のまま次の起動要求が来たら、その要求はスキップします。

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::aggregator::collect_batch;
use super::digest::DigestFormatter;
use super::retry::{RetryPolicy, with_retry};
use crate::domain::{GitwatchError, RunId, RunOutcome, RunReport, RunState, Watermark};
use crate::ports::{ChatNotifier, Clock, CommitSource, IdGenerator, Mailer, WatermarkStore};

/// Run ごとに変わらない設定
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub tracked_path: String,
    pub subject: String,
    pub retry: RetryPolicy,
    /// true なら Digest をログに出すだけで、メール送信と watermark の前進をしない
    pub dry_run: bool,
}

pub struct RunOrchestrator {
    store: Arc<dyn WatermarkStore>,
    source: Arc<dyn CommitSource>,
    mailer: Arc<dyn Mailer>,
    chat: Option<Arc<dyn ChatNotifier>>,
    formatter: DigestFormatter,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    settings: RunSettings,
    in_flight: Mutex<()>,
}

impl RunOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        store: Arc<dyn WatermarkStore>,
        source: Arc<dyn CommitSource>,
        mailer: Arc<dyn Mailer>,
        chat: Option<Arc<dyn ChatNotifier>>,
        formatter: DigestFormatter,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        settings: RunSettings,
    ) -> Self {
        Self {
            store,
            source,
            mailer,
            chat,
            formatter,
            clock,
            ids,
            settings,
            in_flight: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run を 1 回実行する（エラーはそのまま返す）
    pub async fn run_once(&self) -> Result<RunOutcome, GitwatchError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("previous run still in flight, skipping this tick");
            return Ok(RunOutcome::Skipped);
        };

        let run_id = self.ids.generate_run_id();
        let started_at = self.clock.now();
        let span = info_span!("run", %run_id);
        self.execute(run_id, started_at)
            .instrument(span)
            .await
            .map(RunOutcome::Completed)
    }

    /// scheduler から呼ばれる入口
    ///
    /// run_once() の結果をログに残し、失敗時はチャットにも知らせます。
    /// 結果はそのまま返すので、`--once` 実行では終了コードに使えます。
    pub async fn tick(&self) -> Result<RunOutcome, GitwatchError> {
        let result = self.run_once().await;
        match &result {
            Ok(RunOutcome::Completed(report)) => {
                info!(
                    run_id = %report.run_id,
                    commits = report.commits_seen,
                    records = report.records,
                    delivered = report.delivered,
                    advanced_to = ?report.advanced_to.map(|w| w.to_iso_string()),
                    "run completed"
                );
            }
            Ok(RunOutcome::Skipped) => {}
            Err(err) => {
                error!(error = %err, kind = ?err.kind(), "run failed, watermark not advanced");
                self.notify_chat(&format!(
                    "gitwatch: check for {} failed: {err}",
                    self.settings.tracked_path
                ))
                .await;
            }
        }
        result
    }

    async fn execute(
        &self,
        run_id: RunId,
        started_at: DateTime<Utc>,
    ) -> Result<RunReport, GitwatchError> {
        let path = self.settings.tracked_path.as_str();
        let retry = &self.settings.retry;

        debug!(state = ?RunState::ReadWatermark, "entering state");
        let since = self.store.read().await?;

        debug!(state = ?RunState::FetchCommits, %since, "entering state");
        let source = self.source.as_ref();
        let since_ref = &since;
        let commits = with_retry(retry, "fetch_commits", move || {
            source.fetch_commits(path, since_ref)
        })
        .await?;
        info!(commits = commits.len(), %since, "fetched commit history");

        debug!(state = ?RunState::ResolveDiffs, "entering state");
        let batch = collect_batch(source, &commits, path, retry).await?;

        debug!(state = ?RunState::Aggregate, records = batch.len(), "entering state");
        let mut report = RunReport {
            run_id,
            since,
            commits_seen: commits.len(),
            records: batch.len(),
            delivered: false,
            advanced_to: None,
        };

        if batch.is_empty() {
            info!(at = %Watermark::from_datetime(started_at), "no file changes");
        } else {
            debug!(state = ?RunState::Format, "entering state");
            let html = self.formatter.render(&batch)?;
            debug!(%html, "rendered digest");

            if self.settings.dry_run {
                info!(records = batch.len(), "dry run: digest rendered, not sending and not advancing watermark");
                return Ok(report);
            }

            debug!(state = ?RunState::Deliver, "entering state");
            self.mailer.send_digest(&self.settings.subject, &html).await?;
            report.delivered = true;

            self.notify_chat(&format!(
                "gitwatch: {} new change(s) to {}",
                batch.len(),
                path
            ))
            .await;
        }

        if self.settings.dry_run {
            return Ok(report);
        }

        debug!(state = ?RunState::AdvanceWatermark, "entering state");
        let next = since.advanced_to(started_at);
        self.store.write(next).await?;
        report.advanced_to = Some(next);

        debug!(state = ?RunState::Idle, "entering state");
        Ok(report)
    }

    async fn notify_chat(&self, message: &str) {
        if let Some(chat) = &self.chat {
            chat.send_text(message).await;
        }
    }
}
