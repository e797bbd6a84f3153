//! WebhookChatNotifier - テキスト webhook への通知（WeCom ロボット互換）
//!
//! # ペイロード
//! `{"msgtype": "text", "text": {"content": "..."}}`
//!
//! # 成功条件
//! HTTP 200 かつ body の `errcode == 0`。それ以外はログに残して終わり。

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::ConfigError;
use crate::ports::ChatNotifier;

pub struct WebhookChatNotifier {
    http: Client,
    url: String,
}

impl WebhookChatNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                key: "CHAT_WEBHOOK_URL".into(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

fn text_payload(message: &str) -> Value {
    json!({
        "msgtype": "text",
        "text": { "content": message },
    })
}

/// webhook の応答を評価（失敗理由を返す）
fn check_response(status: StatusCode, body: &Value) -> Result<(), String> {
    if status != StatusCode::OK {
        return Err(format!("HTTP {status}: {body}"));
    }
    match body.get("errcode").and_then(Value::as_i64) {
        Some(0) => Ok(()),
        Some(code) => Err(format!("errcode {code}: {body}")),
        None => Err(format!("response has no errcode: {body}")),
    }
}

#[async_trait]
impl ChatNotifier for WebhookChatNotifier {
    async fn send_text(&self, message: &str) {
        let resp = match self.http.post(&self.url).json(&text_payload(message)).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "failed to send chat notification");
                return;
            }
        };

        let status = resp.status();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        match check_response(status, &body) {
            Ok(()) => info!("chat notification sent"),
            Err(reason) => warn!(%reason, "chat notification rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    #[test]
    fn payload_shape() {
        let payload = text_payload("hello");
        assert_eq!(payload["msgtype"], "text");
        assert_eq!(payload["text"]["content"], "hello");
    }

    #[test]
    fn ok_requires_200_and_zero_errcode() {
        assert!(check_response(StatusCode::OK, &json!({"errcode": 0, "errmsg": "ok"})).is_ok());
    }

    #[rstest]
    #[case::app_error(StatusCode::OK, json!({"errcode": 1, "errmsg": "invalid webhook url"}))]
    #[case::no_errcode(StatusCode::OK, json!({"ok": true}))]
    #[case::non_json(StatusCode::OK, Value::Null)]
    #[case::http_error(StatusCode::INTERNAL_SERVER_ERROR, json!({"errcode": 0}))]
    fn failures_are_reported(#[case] status: StatusCode, #[case] body: Value) {
        assert!(check_response(status, &body).is_err());
    }

    #[tokio::test]
    async fn unreachable_webhook_does_not_panic_or_raise() {
        // 到達不能なアドレスでも send_text は戻ってくる
        let notifier =
            WebhookChatNotifier::new("http://127.0.0.1:9/hook", Duration::from_millis(200)).unwrap();
        notifier.send_text("hello").await;
    }

    /// 受け取った payload を記録し、決まった body を返す webhook
    #[derive(Clone)]
    struct Hook {
        reply: Value,
        received: Arc<Mutex<Vec<Value>>>,
    }

    async fn receive(State(hook): State<Hook>, Json(payload): Json<Value>) -> Json<Value> {
        hook.received.lock().unwrap().push(payload);
        Json(hook.reply.clone())
    }

    async fn serve(reply: Value) -> (String, Hook) {
        let hook = Hook {
            reply,
            received: Arc::new(Mutex::new(Vec::new())),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/hook", post(receive))
            .with_state(hook.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/hook"), hook)
    }

    #[rstest]
    #[case::accepted(json!({"errcode": 0, "errmsg": "ok"}))]
    #[case::rejected(json!({"errcode": 1, "errmsg": "invalid webhook url"}))]
    #[tokio::test]
    async fn send_text_posts_once_whatever_the_reply(#[case] reply: Value) {
        let (url, hook) = serve(reply).await;
        let notifier = WebhookChatNotifier::new(url, Duration::from_secs(5)).unwrap();

        notifier.send_text("3 new change(s)").await;

        let received = hook.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], text_payload("3 new change(s)"));
    }
}
