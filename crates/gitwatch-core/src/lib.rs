//! gitwatch-core
//!
//! Core building blocks for the gitwatch change notifier.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, watermark, commit, change, state, errors）
//! - **ports**: 抽象化レイヤー（WatermarkStore, CommitSource, Mailer, ChatNotifier, Clock, IdGenerator）
//! - **impls**: 実装（GitLab REST client, SMTP mailer, webhook chat, file / in-memory watermark）
//! - **app**: アプリケーションロジック（builder, orchestrator, scheduler, digest, retry）
//! - **config**: 環境変数からの設定読み込み

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
