//! Notification Aggregator - Commit ごとに diff を解決して Batch を作る
//!
//! # フロー
//! 1. Commit を取得順に 1 件ずつ処理（並列化しない、順序を保つ）
//! 2. CommitSource::fetch_diff() で diff を取得
//! 3. extract_tracked_content() で追跡ファイル分に絞る
//! 4. 内容があれば ChangeRecord を追加、なければ黙って除外
//!
//! # エラー方針
//! どれか 1 件でも diff 取得に失敗したら Batch 全体を捨ててエラーを返します（部分配送はしない）。

use tracing::debug;

use super::filter::extract_tracked_content;
use super::retry::{RetryPolicy, with_retry};
use crate::domain::{ChangeRecord, Commit, GitwatchError, NotificationBatch};
use crate::ports::CommitSource;

pub async fn collect_batch(
    source: &dyn CommitSource,
    commits: &[Commit],
    tracked_path: &str,
    retry: &RetryPolicy,
) -> Result<NotificationBatch, GitwatchError> {
    let mut batch = NotificationBatch::new();

    for commit in commits {
        let id = &commit.id;
        let changes = with_retry(retry, "fetch_diff", move || source.fetch_diff(id)).await?;

        match extract_tracked_content(&changes, tracked_path) {
            Some(content) => {
                debug!(commit = %commit.id.short(), title = %commit.title, "tracked file changed");
                batch.push(ChangeRecord::from_commit(commit, content));
            }
            None => {
                debug!(commit = %commit.id.short(), "commit does not touch tracked file");
            }
        }
    }

    Ok(batch)
}
