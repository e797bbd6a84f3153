//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **FileWatermarkStore**: watermark をローカルファイルに保存（本番用）
//! - **InMemoryWatermarkStore**: テスト・dry run 用
//! - **GitLabClient**: CommitSource の GitLab v4 実装
//! - **SmtpMailer**: Mailer の SMTP 実装
//! - **WebhookChatNotifier**: ChatNotifier の webhook 実装

pub mod file_watermark;
pub mod gitlab;
pub mod inmem_watermark;
pub mod smtp;
pub mod webhook_chat;

// 主要な型を再エクスポート
pub use self::file_watermark::FileWatermarkStore;
pub use self::gitlab::GitLabClient;
pub use self::inmem_watermark::InMemoryWatermarkStore;
pub use self::smtp::SmtpMailer;
pub use self::webhook_chat::WebhookChatNotifier;
