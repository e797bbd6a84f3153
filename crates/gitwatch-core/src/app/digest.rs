//! Digest Formatter - NotificationBatch を HTML 1 通に描画する
//!
//! # 設計原則
//! - テンプレートは `templates/digest.hbs` に置き、コンパイル時に埋め込む
//! - コミット情報と diff はリモート由来の信頼できない入力なので、
//!   すべて `{{ }}`（HTML エスケープあり）で埋め込む。`{{{ }}}` は使わない
//! - strict mode: テンプレートが参照するフィールドが欠けていたら RenderError

use handlebars::Handlebars;
use serde::Serialize;

use crate::domain::{ChangeRecord, GitwatchError, NotificationBatch};

const DIGEST_TEMPLATE: &str = "digest";
const DIGEST_SOURCE: &str = include_str!("../../templates/digest.hbs");

/// テンプレートに渡すデータ契約
#[derive(Serialize)]
struct DigestContext<'a> {
    records: &'a [ChangeRecord],
}

pub struct DigestFormatter {
    hbs: Handlebars<'static>,
}

impl DigestFormatter {
    pub fn new() -> Result<Self, GitwatchError> {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_template_string(DIGEST_TEMPLATE, DIGEST_SOURCE)
            .map_err(|e| GitwatchError::Render(format!("invalid digest template: {e}")))?;
        Ok(Self { hbs })
    }

    pub fn render(&self, batch: &NotificationBatch) -> Result<String, GitwatchError> {
        let context = DigestContext {
            records: batch.records(),
        };
        self.hbs
            .render(DIGEST_TEMPLATE, &context)
            .map_err(|e| GitwatchError::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(author: &str, title: &str, diff: &str) -> ChangeRecord {
        ChangeRecord {
            author_name: author.into(),
            title: title.into(),
            committed_date: "2024-01-01T10:00:00.000+09:00".into(),
            diff_content: diff.into(),
        }
    }

    fn batch(records: Vec<ChangeRecord>) -> NotificationBatch {
        let mut batch = NotificationBatch::new();
        for r in records {
            batch.push(r);
        }
        batch
    }

    #[test]
    fn renders_entries_in_order_with_dividers_between() {
        let formatter = DigestFormatter::new().unwrap();
        let html = formatter
            .render(&batch(vec![
                record("alice", "first change", "+a"),
                record("bob", "second change", "+b"),
                record("carol", "third change", "+c"),
            ]))
            .unwrap();

        let first = html.find("first change").unwrap();
        let second = html.find("second change").unwrap();
        let third = html.find("third change").unwrap();
        assert!(first < second && second < third);

        assert_eq!(html.matches("<hr>").count(), 2);
        let last_hr = html.rfind("<hr>").unwrap();
        assert!(last_hr < third, "divider must not follow the last entry");

        assert!(html.contains("<strong>Author:</strong> alice"));
        assert!(html.contains("<pre><code>+a</code></pre>"));
    }

    #[test]
    fn single_entry_has_no_divider() {
        let formatter = DigestFormatter::new().unwrap();
        let html = formatter
            .render(&batch(vec![record("alice", "only", "+x")]))
            .unwrap();
        assert!(!html.contains("<hr>"));
    }

    #[test]
    fn untrusted_fields_are_html_escaped() {
        let formatter = DigestFormatter::new().unwrap();
        let html = formatter
            .render(&batch(vec![record(
                "<img src=x onerror=alert(1)>",
                "fix <script>alert('x')</script>",
                "-<b>old</b>\n+a & b",
            )]))
            .unwrap();

        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img"));
        assert!(!html.contains("<b>old</b>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[test]
    fn diff_newlines_are_preserved() {
        let formatter = DigestFormatter::new().unwrap();
        let diff = "@@ -1,2 +1,2 @@\n-old\n+new\n";
        let html = formatter
            .render(&batch(vec![record("alice", "t", diff)]))
            .unwrap();
        assert!(html.contains("@@ -1,2 +1,2 @@\n-old\n+new\n"));
    }
}
