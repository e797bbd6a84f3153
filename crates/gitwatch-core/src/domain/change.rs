//! ChangeRecord / NotificationBatch - 1 回の Run で集めた変更
//!
//! # 不変条件
//! - ChangeRecord は追跡ファイルに触れた Commit からしか作られない
//! - NotificationBatch の順序は Commit 取得順（再ソートしない）

use serde::Serialize;

use super::commit::Commit;

/// ChangeRecord は Digest の 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub author_name: String,
    pub title: String,
    pub committed_date: String,
    pub diff_content: String,
}

impl ChangeRecord {
    /// Commit と、追跡ファイルに絞った diff テキストから作成
    pub fn from_commit(commit: &Commit, diff_content: impl Into<String>) -> Self {
        Self {
            author_name: commit.author_name.clone(),
            title: commit.title.clone(),
            committed_date: commit.committed_date.clone(),
            diff_content: diff_content.into(),
        }
    }
}

/// NotificationBatch は挿入順を保つ ChangeRecord の列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationBatch {
    records: Vec<ChangeRecord>,
}

impl NotificationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ChangeRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
