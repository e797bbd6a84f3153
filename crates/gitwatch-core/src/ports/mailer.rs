//! Mailer port - Digest メールの配送
//!
//! # 実装
//! - **SmtpMailer**: lettre の非同期 SMTP transport

use async_trait::async_trait;

use crate::domain::GitwatchError;

/// Mailer は HTML メールを設定済みの宛先全員に 1 通送る
///
/// transport の失敗は `GitwatchError::Delivery` で返します。
/// 呼び出し側（Orchestrator）はこれを Run の失敗として扱い、watermark を進めません。
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_digest(&self, subject: &str, html: &str) -> Result<(), GitwatchError>;
}
