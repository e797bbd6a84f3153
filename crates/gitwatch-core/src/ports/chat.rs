//! ChatNotifier port - チャットへのテキスト通知（best-effort）
//!
//! # 実装
//! - **WebhookChatNotifier**: `{"msgtype":"text"}` 形式の webhook

use async_trait::async_trait;

/// ChatNotifier はテキストを 1 件投稿する
///
/// # 設計原則
/// - 失敗はログに残すだけで呼び出し側へ返さない
/// - リトライしない
/// - メール配送や watermark の前進には影響しない
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn send_text(&self, message: &str);
}
