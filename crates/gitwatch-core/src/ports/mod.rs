//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! Run Orchestrator はここにある trait だけに依存し、
//! ファイルシステム・HTTP・SMTP には直接触れません。
//!
//! # 設計原則
//! - watermark は WatermarkStore 経由でのみ読み書きする（テストではインメモリ実装に差し替え）
//! - リモート API は CommitSource、配送は Mailer / ChatNotifier に閉じ込める
//! - 時刻は Clock から取る（テストでは FixedClock）

pub mod chat;
pub mod clock;
pub mod commit_source;
pub mod id_generator;
pub mod mailer;
pub mod watermark_store;

// 主要な trait を再エクスポート
pub use self::chat::ChatNotifier;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::commit_source::CommitSource;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::mailer::Mailer;
pub use self::watermark_store::WatermarkStore;
