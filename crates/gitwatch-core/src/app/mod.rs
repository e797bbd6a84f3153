//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて変更検知のパイプラインを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **RunOrchestrator**: 1 tick 分の Run（read→fetch→resolve→format→deliver→advance）
//! - **Scheduler**: cron 周期で Run を起動するループ
//! - **DigestFormatter**: Batch を HTML メール本文に描画
//! - **with_retry**: Transient なエラーだけを backoff 付きで再試行

pub mod aggregator;
pub mod builder;
pub mod digest;
pub mod filter;
pub mod orchestrator;
pub mod retry;
pub mod scheduler;

// 主要な型を再エクスポート
pub use self::aggregator::collect_batch;
pub use self::builder::{AppBuilder, BuildError};
pub use self::digest::DigestFormatter;
pub use self::filter::extract_tracked_content;
pub use self::orchestrator::{RunOrchestrator, RunSettings};
pub use self::retry::{RetryPolicy, with_retry};
pub use self::scheduler::{ScheduledJob, SchedulerHandle, TickSchedule, spawn};
