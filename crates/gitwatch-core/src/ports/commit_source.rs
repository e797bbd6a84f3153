//! CommitSource port - リモートの commit 履歴と diff
//!
//! # 実装
//! - **GitLabClient**: GitLab v4 API（reqwest）

use async_trait::async_trait;

use crate::domain::{Commit, CommitId, FileChange, GitwatchError, Watermark};

/// CommitSource は Commit History Fetcher と Diff Resolver を兼ねる
///
/// # 契約
/// - `fetch_commits`: `path` に触れた `since` 以降の Commit を全ページ分、API の順序のまま返す。
///   失敗は `GitwatchError::Fetch`
/// - `fetch_diff`: 1 Commit の全ファイル分の diff を返す（ページングされていれば全ページ）。
///   失敗は `GitwatchError::DiffFetch`
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn fetch_commits(
        &self,
        path: &str,
        since: &Watermark,
    ) -> Result<Vec<Commit>, GitwatchError>;

    async fn fetch_diff(&self, commit: &CommitId) -> Result<Vec<FileChange>, GitwatchError>;
}
