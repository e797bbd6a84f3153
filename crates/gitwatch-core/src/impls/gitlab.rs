//! GitLabClient - GitLab v4 API による CommitSource 実装
//!
//! # エンドポイント
//! - `GET {base}/api/v4/projects/{repo}/repository/commits?path=&since=&all=true&page=&per_page=`
//! - `GET {base}/api/v4/projects/{repo}/repository/commits/{sha}/diff`
//!
//! `{repo}` は `group/project` 形式でも数値 ID でもよく、1 セグメントとして
//! パーセントエンコードされます（`/` は `%2F`）。
//!
//! # ページング
//! - `X-Next-Page` ヘッダがあればそれに従う（空文字 = 最終ページ）
//! - ヘッダがなければ `per_page` 未満のページで終了
//! - `MAX_PAGES` を超えたら壊れたサーバとみなしてエラー
//! - commits 一覧も diff も同じ規則でページを辿る（diff は既定 20 件で切られる）

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::domain::{
    Commit, CommitId, ConfigError, ErrorKind, FileChange, GitwatchError, Watermark,
};
use crate::ports::CommitSource;

const DEFAULT_PER_PAGE: u32 = 100;
const MAX_PAGES: u32 = 1000;
const NEXT_PAGE_HEADER: &str = "x-next-page";
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Check if an HTTP status code is worth retrying
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}

fn classify_status(status: StatusCode) -> ErrorKind {
    if is_retryable_status(status) {
        ErrorKind::Transient
    } else {
        ErrorKind::Permanent
    }
}

fn classify_transport(err: &reqwest::Error) -> ErrorKind {
    if err.is_decode() || err.is_builder() {
        ErrorKind::Permanent
    } else {
        // timeout / connect / body read
        ErrorKind::Transient
    }
}

/// 次に取得すべきページ番号
///
/// `X-Next-Page` を優先し、なければ件数で判断します。
/// ヘッダが数値として読めないときは続きがあるか判断できないのでエラーです。
fn next_page(
    headers: &HeaderMap,
    page: u32,
    received: usize,
    per_page: u32,
) -> Result<Option<u32>, String> {
    if let Some(value) = headers.get(NEXT_PAGE_HEADER) {
        let raw = value
            .to_str()
            .map_err(|_| format!("{NEXT_PAGE_HEADER} header is not valid text: {value:?}"))?
            .trim();
        if raw.is_empty() {
            return Ok(None);
        }
        return raw
            .parse::<u32>()
            .map(Some)
            .map_err(|e| format!("malformed {NEXT_PAGE_HEADER} header {raw:?}: {e}"));
    }
    if received >= per_page as usize && received > 0 {
        Ok(Some(page + 1))
    } else {
        Ok(None)
    }
}

pub struct GitLabClient {
    http: Client,
    project_url: Url,
    token: String,
    per_page: u32,
    max_pages: u32,
}

impl GitLabClient {
    /// 新しい GitLabClient を作成
    ///
    /// `timeout` はリクエスト 1 回ごとの上限です。超過は Transient エラーになります。
    pub fn new(
        base_url: &str,
        repository: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let project_url = project_url(base_url, repository)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                key: "HTTP_TIMEOUT_SECS".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            project_url,
            token: token.into(),
            per_page: DEFAULT_PER_PAGE,
            max_pages: MAX_PAGES,
        })
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    fn commits_url(&self) -> Url {
        let mut url = self.project_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(["repository", "commits"]);
        }
        url
    }

    fn diff_url(&self, commit: &CommitId) -> Url {
        let mut url = self.commits_url();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend([commit.as_str(), "diff"]);
        }
        url
    }

    /// 1 リクエスト送って JSON とヘッダを返す
    ///
    /// エラーは (分類, メッセージ) で返し、呼び出し側で Fetch / DiffFetch に包みます。
    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(T, HeaderMap), (ErrorKind, String)> {
        let resp = request
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| (classify_transport(&e), e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err((
                classify_status(status),
                format!("HTTP {status}: {}", body.trim()),
            ));
        }

        let headers = resp.headers().clone();
        let data = resp
            .json::<T>()
            .await
            .map_err(|e| (classify_transport(&e), e.to_string()))?;
        Ok((data, headers))
    }

    /// `url` の全ページを取得して API の順序のまま連結する
    ///
    /// commits 一覧と diff の両方がページングされるので共通化しています。
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, (ErrorKind, String)> {
        let per_page = self.per_page.to_string();
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            if page > self.max_pages {
                return Err((
                    ErrorKind::Permanent,
                    format!("pagination did not terminate after {} pages", self.max_pages),
                ));
            }

            let page_param = page.to_string();
            let request = self
                .http
                .get(url.clone())
                .query(query)
                .query(&[("page", page_param.as_str()), ("per_page", per_page.as_str())]);

            let (batch, headers): (Vec<T>, _) = self.get_json(request).await?;
            let received = batch.len();
            debug!(path = url.path(), page, received, "fetched page");
            items.extend(batch);

            match next_page(&headers, page, received, self.per_page)
                .map_err(|message| (ErrorKind::Permanent, message))?
            {
                Some(next) if next > page => page = next,
                Some(next) => {
                    return Err((
                        ErrorKind::Permanent,
                        format!("server returned non-advancing next page {next} after {page}"),
                    ));
                }
                None => break,
            }
        }

        Ok(items)
    }
}

fn project_url(base_url: &str, repository: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: "GITLAB_URL".into(),
        reason,
    };

    let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".into()))?;
        segments
            .pop_if_empty()
            .extend(["api", "v4", "projects", repository]);
    }
    Ok(url)
}

#[async_trait]
impl CommitSource for GitLabClient {
    async fn fetch_commits(
        &self,
        path: &str,
        since: &Watermark,
    ) -> Result<Vec<Commit>, GitwatchError> {
        let since = since.to_iso_string();
        let query = [("path", path), ("since", since.as_str()), ("all", "true")];
        self.get_all_pages(self.commits_url(), &query)
            .await
            .map_err(|(kind, message)| GitwatchError::Fetch { kind, message })
    }

    async fn fetch_diff(&self, commit: &CommitId) -> Result<Vec<FileChange>, GitwatchError> {
        let changes: Vec<FileChange> = self
            .get_all_pages(self.diff_url(commit), &[])
            .await
            .map_err(|(kind, message)| GitwatchError::DiffFetch {
                commit: commit.clone(),
                kind,
                message,
            })?;
        debug!(commit = %commit.short(), files = changes.len(), "fetched diff");
        Ok(changes)
    }
}
