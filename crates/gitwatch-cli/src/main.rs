//! gitwatch - GitLab リポジトリの 1 ファイルを監視して変更をメールで知らせる
//!
//! # 起動モード
//! - 既定: 起動直後に 1 回、以降は SCHEDULE の周期で Run（Ctrl-C / SIGTERM で停止）
//! - `--once`: Run を 1 回だけ実行し、失敗なら非ゼロで終了
//! - `--dry-run`: Digest を描画してログに出すだけ（送信も watermark の前進もしない）

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use gitwatch_core::app::{self, AppBuilder, ScheduledJob, TickSchedule};
use gitwatch_core::config::Config;
use gitwatch_core::domain::RunOutcome;
use gitwatch_core::impls::{FileWatermarkStore, GitLabClient, SmtpMailer, WebhookChatNotifier};
use gitwatch_core::ports::{Clock, SystemClock};

#[derive(Debug, Parser)]
#[command(name = "gitwatch", version, about = "Mail a digest whenever a tracked file changes in a GitLab repository")]
struct Cli {
    /// Run a single check and exit
    #[arg(long)]
    once: bool,

    /// Render the digest but do not send it or advance the watermark
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging (includes the rendered HTML)
    #[arg(short, long)]
    verbose: bool,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, value_name = "PATH", conflicts_with = "no_dotenv")]
    env_file: Option<PathBuf>,

    /// Do not load any .env file
    #[arg(long)]
    no_dotenv: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn load_dotenv(cli: &Cli) -> Result<()> {
    if cli.no_dotenv {
        return Ok(());
    }
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path).with_context(|| format!("Failed to load env file {}", path.display()))?;
        }
        None => match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e).context("Failed to load .env"),
        },
    }
    Ok(())
}

/// 停止シグナルの待ち受け（Ctrl-C と、unix では SIGTERM）
///
/// `install()` の時点でハンドラを登録するので、その後に届いた SIGTERM で
/// プロセスが即死することはありません。
struct ShutdownSignal {
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    fn install() -> Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
            Ok(Self { sigterm })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// 受け取ったシグナル名を返す
    async fn recv(mut self) -> Result<&'static str> {
        #[cfg(unix)]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result.context("Failed to listen for Ctrl-C")?;
                    Ok("SIGINT")
                }
                _ = self.sigterm.recv() => Ok("SIGTERM"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            Ok("Ctrl-C")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    load_dotenv(&cli)?;
    setup_logging(cli.verbose);

    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        repository = %config.gitlab.repository,
        path = %config.tracked_path,
        schedule = %config.schedule,
        dry_run = cli.dry_run,
        "gitwatch starting"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = FileWatermarkStore::new(config.watermark_file.clone(), config.initial_since, clock.clone());
    let source = GitLabClient::new(
        &config.gitlab.base_url,
        &config.gitlab.repository,
        config.gitlab.token.clone(),
        config.http_timeout,
    )
    .context("Failed to create GitLab client")?;
    let mailer = SmtpMailer::new(&config.email, config.http_timeout).context("Failed to create SMTP mailer")?;

    let mut builder = AppBuilder::new()
        .watermark_store(Arc::new(store))
        .commit_source(Arc::new(source))
        .mailer(Arc::new(mailer))
        .clock(clock.clone())
        .tracked_path(config.tracked_path.clone())
        .subject(config.email_subject.clone())
        .dry_run(cli.dry_run);
    if let Some(url) = &config.chat_webhook_url {
        let chat = WebhookChatNotifier::new(url.clone(), config.http_timeout)
            .context("Failed to create chat notifier")?;
        builder = builder.chat(Arc::new(chat));
    }
    let orchestrator = Arc::new(builder.build().context("Failed to build application")?);

    if cli.once {
        if let RunOutcome::Completed(report) = orchestrator.tick().await.context("Run failed")? {
            info!(records = report.records, delivered = report.delivered, "single run finished");
        }
        return Ok(());
    }

    let schedule = TickSchedule::parse(&config.schedule)?;
    let shutdown = ShutdownSignal::install()?;
    let job: Arc<dyn ScheduledJob> = orchestrator;
    let handle = app::spawn(job, schedule, clock);

    let signal = shutdown.recv().await?;
    info!(signal, "shutdown requested, waiting for the current run to finish");
    handle.shutdown_and_join().await;

    Ok(())
}
