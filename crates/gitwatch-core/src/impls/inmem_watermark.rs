//! InMemoryWatermarkStore - テスト用の watermark スロット
//!
//! FileWatermarkStore と同じ初期化規則（fallback → 現在時刻）に従います。

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{GitwatchError, Watermark};
use crate::ports::{Clock, WatermarkStore};

pub struct InMemoryWatermarkStore {
    slot: Mutex<Option<Watermark>>,
    fallback: Option<Watermark>,
    clock: Arc<dyn Clock>,
}

impl InMemoryWatermarkStore {
    pub fn new(fallback: Option<Watermark>, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(None),
            fallback,
            clock,
        }
    }

    /// 既に値が入った状態で作成
    pub fn with_value(value: Watermark, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(Some(value)),
            fallback: None,
            clock,
        }
    }

    /// 初期化せずに現在のスロットを覗く
    pub async fn peek(&self) -> Option<Watermark> {
        *self.slot.lock().await
    }
}

#[async_trait]
impl WatermarkStore for InMemoryWatermarkStore {
    async fn read(&self) -> Result<Watermark, GitwatchError> {
        let mut slot = self.slot.lock().await;
        let value = slot.get_or_insert_with(|| {
            self.fallback
                .unwrap_or_else(|| Watermark::from_datetime(self.clock.now()))
        });
        Ok(*value)
    }

    async fn write(&self, watermark: Watermark) -> Result<(), GitwatchError> {
        *self.slot.lock().await = Some(watermark);
        Ok(())
    }
}
