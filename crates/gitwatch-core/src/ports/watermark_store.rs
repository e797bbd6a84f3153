//! WatermarkStore port - 前回チェック時刻の永続化
//!
//! # 実装
//! - **FileWatermarkStore**: ローカルファイル 1 つ（本番用）
//! - **InMemoryWatermarkStore**: テスト用

use async_trait::async_trait;

use crate::domain::{GitwatchError, Watermark};

/// WatermarkStore は単一スロットの watermark を読み書きする
///
/// # 契約
/// - `read`: 値がなければ設定値 or 現在時刻で初期化し、それを永続化して返す
/// - `write`: アトミックに上書きする（途中状態を残さない）
/// - ストレージの失敗は `GitwatchError::Storage` で返す。リトライはしない
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    async fn read(&self) -> Result<Watermark, GitwatchError>;

    async fn write(&self, watermark: Watermark) -> Result<(), GitwatchError>;
}
