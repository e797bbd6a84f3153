//! Errors - エラー型と分類
//!
//! # 分類（ErrorKind）
//! - Transient: 一時的なエラー（タイムアウト、429、5xx）。Run 内で限定的にリトライする
//! - Permanent: 恒久的なエラー（4xx、デコード失敗、テンプレート不備）
//! - Infrastructure: ローカル資源やメール配送の障害
//!
//! どの種類でも Run は中断され、watermark は進みません。
//! 次の tick で同じ区間を再取得します（at-least-once）。

use thiserror::Error;

use super::commit::CommitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// GitwatchError は Run 中に起きうるエラー
#[derive(Debug, Error)]
pub enum GitwatchError {
    #[error("failed to fetch commits: {message}")]
    Fetch { kind: ErrorKind, message: String },

    #[error("failed to fetch diff for commit {commit}: {message}")]
    DiffFetch {
        commit: CommitId,
        kind: ErrorKind,
        message: String,
    },

    #[error("failed to render digest: {0}")]
    Render(String),

    #[error("failed to deliver notification: {0}")]
    Delivery(String),

    #[error("watermark storage error: {0}")]
    Storage(String),
}

impl GitwatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch { kind, .. } | Self::DiffFetch { kind, .. } => *kind,
            Self::Render(_) => ErrorKind::Permanent,
            Self::Delivery(_) | Self::Storage(_) => ErrorKind::Infrastructure,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

/// ConfigError は起動時の設定エラー（致命的）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::transient_fetch(GitwatchError::Fetch { kind: ErrorKind::Transient, message: "timeout".into() }, true)]
    #[case::permanent_fetch(GitwatchError::Fetch { kind: ErrorKind::Permanent, message: "404".into() }, false)]
    #[case::transient_diff(GitwatchError::DiffFetch { commit: CommitId::new("abc"), kind: ErrorKind::Transient, message: "502".into() }, true)]
    #[case::storage(GitwatchError::Storage("disk full".into()), false)]
    #[case::delivery(GitwatchError::Delivery("smtp down".into()), false)]
    #[case::render(GitwatchError::Render("missing field".into()), false)]
    fn only_transient_errors_are_retryable(#[case] err: GitwatchError, #[case] expected: bool) {
        assert_eq!(err.is_retryable(), expected);
    }

    #[test]
    fn missing_config_lists_every_key() {
        let err = ConfigError::Missing(vec!["GITLAB_URL".into(), "FILE_PATH".into()]);
        assert_eq!(
            err.to_string(),
            "missing required configuration: GITLAB_URL, FILE_PATH"
        );
    }

    #[test]
    fn diff_error_names_the_commit() {
        let err = GitwatchError::DiffFetch {
            commit: CommitId::new("deadbeef"),
            kind: ErrorKind::Permanent,
            message: "HTTP 404".into(),
        };
        assert!(err.to_string().contains("deadbeef"));
    }
}
