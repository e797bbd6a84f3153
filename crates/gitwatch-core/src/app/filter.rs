//! File-Change Filter - 1 Commit の diff から追跡ファイル分だけを取り出す

use crate::domain::FileChange;

/// `tracked_path` と完全一致する最初のエントリの diff を返す
///
/// glob やパターンはサポートしません。diff が空（モード変更のみなど）の場合は
/// 「内容なし」として None を返します。
pub fn extract_tracked_content<'a>(changes: &'a [FileChange], tracked_path: &str) -> Option<&'a str> {
    changes
        .iter()
        .find(|change| change.new_path == tracked_path)
        .map(|change| change.diff.as_str())
        .filter(|diff| !diff.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(path: &str, diff: &str) -> FileChange {
        FileChange {
            new_path: path.into(),
            diff: diff.into(),
        }
    }

    fn sample() -> Vec<FileChange> {
        vec![
            change("a.txt", "@@ a @@"),
            change("tracked.txt", "@@ -1 +1 @@\n-old\n+new\n"),
            change("b.txt", "@@ b @@"),
        ]
    }

    #[test]
    fn returns_exactly_the_tracked_entry() {
        let changes = sample();
        assert_eq!(
            extract_tracked_content(&changes, "tracked.txt"),
            Some("@@ -1 +1 @@\n-old\n+new\n")
        );
    }

    #[test]
    fn missing_path_yields_none() {
        assert_eq!(extract_tracked_content(&sample(), "missing.txt"), None);
    }

    #[test]
    fn match_is_exact_not_suffix_or_glob() {
        let changes = vec![change("docs/tracked.txt", "x"), change("tracked.txt.bak", "y")];
        assert_eq!(extract_tracked_content(&changes, "tracked.txt"), None);
        assert_eq!(extract_tracked_content(&changes, "*.txt"), None);
    }

    #[test]
    fn first_match_wins() {
        let changes = vec![change("t.txt", "first"), change("t.txt", "second")];
        assert_eq!(extract_tracked_content(&changes, "t.txt"), Some("first"));
    }

    #[test]
    fn empty_diff_counts_as_no_content() {
        let changes = vec![change("t.txt", "")];
        assert_eq!(extract_tracked_content(&changes, "t.txt"), None);
    }
}
