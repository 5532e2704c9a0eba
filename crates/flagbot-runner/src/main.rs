//! Flag pattern trading bot CLI.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use flagbot_backtest::{el_reaction, sweep_reward_ratios};
use flagbot_core::{init_logging, AppConfig, LogConfig, PriceSeries, Timeframe};
use flagbot_detector::FlagDetector;
use flagbot_risk::{model_score, ScoreWeights};
use flagbot_runner::{shutdown_signal, Daemon, FlagRepository, InMemoryRepository, JsonFileSource};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "flagbot")]
#[command(about = "Flag pattern detection and trading bot", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로
    #[arg(long, env = "FLAGBOT_CONFIG", default_value = "config/default.toml")]
    config: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 데몬 모드: 종료 신호까지 주기적으로 사이클 실행
    Run,

    /// 모든 타임프레임 사이클을 한 번 실행
    Once,

    /// 봉 파일에서 플래그를 탐지해 JSON으로 출력
    Detect {
        /// `{time, high, low}` 배열 JSON 파일
        #[arg(long)]
        file: PathBuf,

        /// 출력에 표시할 타임프레임
        #[arg(long, default_value = "M15")]
        timeframe: Timeframe,
    },

    /// 저장된 결과 라벨로 RR별 손익/승률 스윕
    Sweep {
        /// 거래당 고정 위험 금액
        #[arg(long, default_value = "100")]
        risk_amount: Decimal,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    let mut log_config: LogConfig = config.logging.clone().override_from_env();
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(&log_config).map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    match cli.command {
        Commands::Run => {
            let token = CancellationToken::new();
            let signal = shutdown_signal(token.clone());
            let daemon = Daemon::from_config(config).await?;
            let state = daemon.run(token).await;
            signal.abort();
            tracing::info!(cycles = state.cycles, traded = state.traded.len(), "Flagbot stopped");
        }
        Commands::Once => {
            let token = CancellationToken::new();
            let mut daemon = Daemon::from_config(config).await?;
            let results = daemon.run_once(&token).await;
            let failed = results.iter().filter(|(_, r)| r.is_err()).count();
            if failed > 0 {
                anyhow::bail!("{failed} of {} timeframe cycles failed", results.len());
            }
        }
        Commands::Detect { file, timeframe } => {
            let bars = JsonFileSource::read_bars(&file).await?;
            let series = PriceSeries::new(bars, config.detection.edge_policy)?;
            let outcome = FlagDetector::new(config.detection.clone()).detect(&series);
            tracing::info!(
                %timeframe,
                bars = series.len(),
                flags = outcome.flags.len(),
                rejections = outcome.rejections.len(),
                "Detection finished"
            );
            let report: Vec<_> = outcome
                .flags
                .iter()
                .map(|flag| {
                    serde_json::json!({
                        "flag": flag,
                        "el_reaction": el_reaction(flag, &series),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Sweep { risk_amount } => {
            let repository = InMemoryRepository::open(&config.storage.snapshot_path).await?;
            let labels = repository.labels().await?;
            let report = sweep_reward_ratios(
                &labels,
                &config.risk.rr_levels,
                config.account.commission,
                risk_amount,
                config.account.paper_balance,
            );
            // 손익이 % 단위이므로 드로다운 예산도 %로 맞춘다
            let dd_daily_pct = config.risk.dd_daily() * 100.0;
            let scores: Vec<_> = report
                .points
                .iter()
                .map(|point| {
                    serde_json::json!({
                        "rr": point.rr,
                        "score": model_score(
                            point.win_rate,
                            point.profit_pct,
                            report.trades as u32,
                            dd_daily_pct,
                            config.risk.max_trades_daily,
                            ScoreWeights::default(),
                        ),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "sweep": report,
                    "scores": scores,
                }))?
            );
        }
    }

    Ok(())
}
