//! State - Run の状態と結果
//!
//! # 状態遷移（1 tick）
//! ```text
//! Idle -> ReadWatermark -> FetchCommits -> ResolveDiffs -> Aggregate
//!      -> (batch 空) -> AdvanceWatermark -> Idle
//!      -> (batch あり) -> Format -> Deliver -> AdvanceWatermark -> Idle
//! ```
//! どの状態でエラーになっても watermark を書かずに Idle へ戻ります。

use super::ids::RunId;
use super::watermark::Watermark;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    ReadWatermark,
    FetchCommits,
    ResolveDiffs,
    Aggregate,
    Format,
    Deliver,
    AdvanceWatermark,
}

/// RunReport は完了した Run の要約
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: RunId,
    /// Run 開始時に読んだ watermark
    pub since: Watermark,
    /// リモートが返した Commit 数
    pub commits_seen: usize,
    /// 追跡ファイルに触れた Commit 数（= Digest のエントリ数）
    pub records: usize,
    /// Digest メールを送ったか
    pub delivered: bool,
    /// 書き込んだ watermark（dry run では None）
    pub advanced_to: Option<Watermark>,
}

/// RunOutcome は 1 回の起動要求に対する結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// 前の Run がまだ実行中だったのでスキップした
    Skipped,
}
