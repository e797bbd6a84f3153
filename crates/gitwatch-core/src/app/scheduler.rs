//! Scheduler - cron の周期で Run を起動するループ
//!
//! # 動作
//! - 起動直後に 1 回（eager run）
//! - 以降は cron 式の次の発火時刻まで待って 1 回
//! - Run はこのループの中で逐次 await するので重ならない。
//!   Run が長引いて発火時刻を過ぎた分は、完了後に次の発火時刻を計算し直すことで飛ばす
//!
//! # 停止
//! - `SchedulerHandle::request_shutdown()` で新しい tick を取らなくなる
//! - 実行中の Run は中断しない（完了を待ってから抜ける）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::orchestrator::RunOrchestrator;
use crate::domain::ConfigError;
use crate::ports::Clock;

/// 周期実行される仕事
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    async fn tick(&self);
}

#[async_trait]
impl ScheduledJob for RunOrchestrator {
    async fn tick(&self) {
        // 結果のログとチャット通知は RunOrchestrator::tick が済ませている
        let _ = RunOrchestrator::tick(self).await;
    }
}

/// cron 式（5 フィールドなら秒 0 を補う）
#[derive(Debug, Clone)]
pub struct TickSchedule {
    expression: String,
    schedule: cron::Schedule,
}

impl TickSchedule {
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let expression = expression.trim();
        let normalized = if expression.split_whitespace().count() == 5 {
            format!("0 {expression}")
        } else {
            expression.to_string()
        };

        let schedule = cron::Schedule::from_str(&normalized).map_err(|e| ConfigError::Invalid {
            key: "SCHEDULE".into(),
            reason: format!("{expression:?}: {e}"),
        })?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// `after` より後の最初の発火時刻
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }
}

/// Scheduler handle.
/// - `request_shutdown()` でループが止まる
/// - `shutdown_and_join()` で停止を待てる
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn request_shutdown(&self) {
        // receiver がすでに落ちていても構わない
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

/// ループを spawn する
pub fn spawn(job: Arc<dyn ScheduledJob>, schedule: TickSchedule, clock: Arc<dyn Clock>) -> SchedulerHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let join = tokio::spawn(schedule_loop(job, schedule, clock, shutdown_rx));
    SchedulerHandle { shutdown_tx, join }
}

async fn schedule_loop(
    job: Arc<dyn ScheduledJob>,
    schedule: TickSchedule,
    clock: Arc<dyn Clock>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(schedule = schedule.expression(), "scheduler started");
    job.tick().await;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let now = clock.now();
        let Some(next) = schedule.next_after(now) else {
            warn!(schedule = schedule.expression(), "schedule has no upcoming fire time, stopping");
            break;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        debug!(next = %next, wait_ms = wait.as_millis() as u64, "waiting for next tick");

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    // handle が drop された
                    break;
                }
                continue;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        job.tick().await;
    }

    info!("scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::TimeZone;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingJob {
        ticks: AtomicUsize,
    }

    #[async_trait]
    impl ScheduledJob for CountingJob {
        async fn tick(&self) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn five_field_expression_fires_every_five_minutes() {
        let schedule = TickSchedule::parse("*/5 * * * *").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 3, 10).unwrap();

        let next = schedule.next_after(at).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 1, 12, 5, 0).unwrap());
        let after = schedule.next_after(next).unwrap();
        assert_eq!(after, Utc.with_ymd_and_hms(2024, 1, 1, 12, 10, 0).unwrap());
    }

    #[test]
    fn six_field_expression_is_used_as_is() {
        let schedule = TickSchedule::parse("30 0 * * * *").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            schedule.next_after(at).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 30).unwrap()
        );
    }

    #[rstest]
    #[case::words("every five minutes")]
    #[case::empty("")]
    #[case::out_of_range("0 61 * * * *")]
    fn invalid_expressions_are_config_errors(#[case] expr: &str) {
        assert!(matches!(
            TickSchedule::parse(expr),
            Err(ConfigError::Invalid { key, .. }) if key == "SCHEDULE"
        ));
    }

    #[tokio::test]
    async fn eager_tick_then_shutdown() {
        let job = Arc::new(CountingJob::default());
        // 発火が 1 年後なので eager run だけが走る
        let schedule = TickSchedule::parse("0 0 0 1 1 *").unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap(),
        ));

        let handle = spawn(job.clone(), schedule, clock);
        tokio::time::sleep(Duration::from_millis(100)).await;
        tokio::time::timeout(Duration::from_secs(2), handle.shutdown_and_join())
            .await
            .expect("scheduler should stop promptly");

        assert_eq!(job.ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ticks_repeat_on_schedule() {
        let job = Arc::new(CountingJob::default());
        let schedule = TickSchedule::parse("* * * * * *").unwrap();

        let handle = spawn(job.clone(), schedule, Arc::new(SystemClock));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.shutdown_and_join().await;

        assert!(job.ticks.load(Ordering::SeqCst) >= 2);
    }
}
