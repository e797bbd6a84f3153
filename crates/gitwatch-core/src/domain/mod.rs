//! Domain model (watermark, commits, change records, errors, run state).
//!
//! ここには I/O を一切含めません。ports / impls / app から参照される型だけを置きます。
//! - **ids**: Run ID（ULID ベース）
//! - **watermark**: 前回チェック時刻（since）
//! - **commit**: リモートから取得した Commit / FileChange
//! - **change**: ChangeRecord と NotificationBatch
//! - **state**: Run の状態遷移と結果
//! - **errors**: エラー型と分類

pub mod change;
pub mod commit;
pub mod errors;
pub mod ids;
pub mod state;
pub mod watermark;

pub use self::change::{ChangeRecord, NotificationBatch};
pub use self::commit::{Commit, CommitId, FileChange};
pub use self::errors::{ConfigError, ErrorKind, GitwatchError};
pub use self::ids::RunId;
pub use self::state::{RunOutcome, RunReport, RunState};
pub use self::watermark::Watermark;
