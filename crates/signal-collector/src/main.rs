//! Signal collector CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use signal_collector::{build_adapters, CollectorConfig, Orchestrator};
use signal_core::{init_logging, LogConfig, LogFormat};
use signal_data::{LogSink, PgSignalStore, SignalSink};

/// 저장소 연결 풀 크기.
const DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Parser)]
#[command(name = "signal-collector")]
#[command(about = "Multi-source financial signal collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact). 생략 시 LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// 수집 1회 실행
    Run {
        /// 추적 종목 교체 (쉼표로 구분, 예: "AAPL,NVDA")
        #[arg(long, value_delimiter = ',')]
        symbols: Option<Vec<String>>,

        /// 저장하지 않고 시그널을 로그로만 출력
        #[arg(long)]
        dry_run: bool,
    },

    /// 데몬 모드: 주기적으로 수집 실행
    Daemon {
        /// 저장하지 않고 시그널을 로그로만 출력
        #[arg(long)]
        dry_run: bool,
    },

    /// Provider 설정 상태와 요청 예산 출력
    Providers,

    /// 저장된 시그널 조회
    Signals {
        /// 종목 또는 섹터 (예: NVDA, Energy)
        #[arg(long)]
        entity: String,

        /// 최대 조회 건수
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// 시그널 테이블 생성
    InitSchema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    let level = &cli.log_level;
    let format = cli
        .log_format
        .unwrap_or_else(|| LogConfig::from_env().format);
    init_logging(
        LogConfig::new(format!(
            "signal_collector={level},signal_data={level},signal_core={level}"
        ))
        .with_format(format),
    )
    .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    tracing::info!("Signal Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    let universe = config
        .load_universe()
        .with_context(|| format!("유니버스 로드 실패: {:?}", config.universe_path()))?;
    tracing::debug!(universe = ?config.universe_path(), "설정 로드 완료");

    match cli.command {
        Commands::Run { symbols, dry_run } => {
            let universe = match symbols {
                Some(symbols) => universe.with_symbols(symbols),
                None => universe,
            };
            let universe = Arc::new(universe);
            let sink = open_sink(&config, dry_run).await?;
            let orchestrator = Orchestrator::from_config(&config, Arc::clone(&universe), sink)?;
            cancel_on_ctrl_c(orchestrator.cancellation_token());

            let summary = orchestrator.run(&universe.tracked_entities()).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Daemon { dry_run } => {
            let universe = Arc::new(universe);
            let sink = open_sink(&config, dry_run).await?;
            let orchestrator = Orchestrator::from_config(&config, Arc::clone(&universe), sink)?;
            let cancel = orchestrator.cancellation_token();
            cancel_on_ctrl_c(cancel.clone());

            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let entities = universe.tracked_entities();
            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        let summary = orchestrator.run(&entities).await;
                        if summary.cancelled {
                            break;
                        }
                        tracing::info!(
                            "=== 수집 완료, 다음 실행: {}분 후 ===",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }
        }
        Commands::Providers => {
            let universe = Arc::new(universe);
            let adapters = build_adapters(&config, &universe)?;

            println!("{:<14} {:<20} {:<14} {:>8}", "PROVIDER", "SOURCE", "STATUS", "BUDGET");
            for adapter in adapters {
                let status = if adapter.is_configured() {
                    "configured"
                } else {
                    "unconfigured"
                };
                let budget = adapter
                    .remaining_budget()
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<14} {:<20} {:<14} {:>8}",
                    adapter.name(),
                    adapter.source().as_str(),
                    status,
                    budget
                );
            }
        }
        Commands::Signals { entity, limit } => {
            let store = PgSignalStore::connect(config.require_database_url()?, DB_MAX_CONNECTIONS)
                .await?;
            let rows = store.recent_signals(&entity, limit).await?;

            if rows.is_empty() {
                println!("{}: 저장된 시그널 없음", entity);
            }
            for row in rows {
                println!(
                    "{}  {:<18} {:<20} {:<9} {:<16} {}",
                    row.occurred_at.format("%Y-%m-%d %H:%M"),
                    row.signal,
                    row.event_type,
                    row.severity,
                    row.source_table,
                    row.description
                );
            }
            store.pool().close().await;
        }
        Commands::InitSchema => {
            let store = PgSignalStore::connect(config.require_database_url()?, DB_MAX_CONNECTIONS)
                .await?;
            store.init_schema().await?;
            store.pool().close().await;
        }
    }

    tracing::info!("Signal Collector 종료");
    Ok(())
}

/// 실행 모드에 맞는 저장소를 엽니다.
async fn open_sink(config: &CollectorConfig, dry_run: bool) -> anyhow::Result<Arc<dyn SignalSink>> {
    if dry_run {
        tracing::info!("dry-run: 시그널을 저장하지 않고 로그로만 출력");
        return Ok(Arc::new(LogSink));
    }

    let store = PgSignalStore::connect(config.require_database_url()?, DB_MAX_CONNECTIONS).await?;
    tracing::info!("데이터베이스 연결 성공");
    Ok(Arc::new(store))
}

/// Ctrl-C를 받으면 토큰을 취소합니다.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("종료 신호 수신, 새 수집 요청 중단");
            token.cancel();
        }
    });
}
