//! Watermark - 前回チェック時刻（since）
//!
//! # 永続化フォーマット
//! - ISO-8601 / RFC 3339、UTC、ミリ秒精度、`Z` サフィックス
//!   （例: `2024-01-01T12:00:00.000Z`）
//! - 読み込み時は任意のオフセット付き RFC 3339 を受け付け、UTC に正規化する
//!
//! # 不変条件
//! - 値は常にミリ秒境界に切り上げて保持する（書いて読んでも値が変わらない）
//! - `advanced_to` は必ず前回より大きい値を返す（前進のみ）

use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    /// DateTime から作成（ミリ秒境界に切り上げ）
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let truncated = at.trunc_subsecs(3);
        if truncated < at {
            Self(truncated + TimeDelta::milliseconds(1))
        } else {
            Self(truncated)
        }
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// 永続化・API クエリに使う文字列表現
    pub fn to_iso_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Run 開始時刻 `started_at` への前進
    ///
    /// 開始時刻が前回値以下（時計の巻き戻り、未来の初期値など）の場合でも
    /// 前回値 + 1ms を返し、前進のみを保証します。
    pub fn advanced_to(&self, started_at: DateTime<Utc>) -> Self {
        let candidate = Self::from_datetime(started_at);
        let floor = Self(self.0 + TimeDelta::milliseconds(1));
        candidate.max(floor)
    }
}

impl FromStr for Watermark {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = DateTime::parse_from_rfc3339(s.trim())?;
        Ok(Self::from_datetime(parsed.with_timezone(&Utc)))
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(at: DateTime<Utc>) -> Self {
        Self::from_datetime(at)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}
