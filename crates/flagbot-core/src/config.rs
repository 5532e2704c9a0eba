//! 설정 관리.
//!
//! 설정은 기본값 → TOML 파일 → `FLAGBOT__` 접두사 환경 변수 순으로 덮어씁니다.

use crate::domain::EdgePolicy;
use crate::logging::LogConfig;
use crate::types::Timeframe;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 거래 대상 설정
    #[serde(default)]
    pub trading: TradingConfig,
    /// 플래그 탐지 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// 리스크 설정
    #[serde(default)]
    pub risk: RiskConfig,
    /// 런타임 설정
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// 계좌 설정
    #[serde(default)]
    pub account: AccountConfig,
    /// 저장소/데이터 경로 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LogConfig,
    /// 알림 설정
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// 거래 대상 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TradingConfig {
    /// 심볼
    #[serde(default = "default_asset")]
    pub asset: String,
    /// 사이클을 돌릴 타임프레임 목록
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<Timeframe>,
    /// 한 번에 가져올 봉 수
    #[serde(default = "default_bars_per_fetch")]
    pub bars_per_fetch: usize,
}

fn default_asset() -> String {
    "EURUSD".to_string()
}
fn default_timeframes() -> Vec<Timeframe> {
    vec![Timeframe::M1, Timeframe::M5, Timeframe::M15]
}
fn default_bars_per_fetch() -> usize {
    1000
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            timeframes: default_timeframes(),
            bars_per_fetch: default_bars_per_fetch(),
        }
    }
}

/// 플래그 탐지 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    /// 극점과 종료 봉 사이 최소 봉 수 (이 값을 초과해야 함)
    #[serde(default = "default_min_flag_duration")]
    pub min_flag_duration: usize,
    /// 플래그 가중치 = 지속 기간 / weight_divisor
    #[serde(default = "default_weight_divisor")]
    pub weight_divisor: f64,
    /// 플래그 가중치 상한
    #[serde(default = "default_max_weight")]
    pub max_weight: f64,
    /// 시리즈 양 끝의 극값 판정 방식
    #[serde(default)]
    pub edge_policy: EdgePolicy,
    /// 타임프레임별로 유지하는 최대 봉 수
    #[serde(default = "default_max_bars")]
    pub max_bars: usize,
}

fn default_min_flag_duration() -> usize {
    15
}
fn default_weight_divisor() -> f64 {
    15.0
}
fn default_max_weight() -> f64 {
    4.0
}
fn default_max_bars() -> usize {
    10_000
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_flag_duration: default_min_flag_duration(),
            weight_divisor: default_weight_divisor(),
            max_weight: default_max_weight(),
            edge_policy: EdgePolicy::default(),
            max_bars: default_max_bars(),
        }
    }
}

/// 리스크 및 거래 결정 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RiskConfig {
    /// 이 확률 이하이면 거래하지 않음
    #[serde(default = "default_min_prob")]
    pub min_prob: f64,
    /// 월간 허용 드로다운 (0.1 = 10%)
    #[serde(default = "default_dd_monthly")]
    pub dd_monthly: f64,
    /// 일일 최대 거래 수 (연속 손실 계산의 N)
    #[serde(default = "default_max_trades_daily")]
    pub max_trades_daily: u32,
    /// 연속 손실 신뢰 수준
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// 켈리 비율 축소 계수
    #[serde(default = "default_kelly_scale")]
    pub kelly_scale: f64,
    /// 평가할 보상 비율 목록 (오름차순)
    #[serde(default = "default_rr_levels")]
    pub rr_levels: Vec<f64>,
    /// 확률 곡선 단조 감소 허용 오차
    #[serde(default = "default_monotonic_tolerance")]
    pub monotonic_tolerance: f64,
    /// 경험적 오라클의 최소 표본 수
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

fn default_min_prob() -> f64 {
    0.35
}
fn default_dd_monthly() -> f64 {
    0.1
}
fn default_max_trades_daily() -> u32 {
    5
}
fn default_confidence() -> f64 {
    0.98
}
fn default_kelly_scale() -> f64 {
    0.1
}
fn default_rr_levels() -> Vec<f64> {
    vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0]
}
fn default_monotonic_tolerance() -> f64 {
    0.02
}
fn default_min_samples() -> usize {
    30
}

impl RiskConfig {
    /// 일일 드로다운 예산 (월간 / 30).
    pub fn dd_daily(&self) -> f64 {
        self.dd_monthly / 30.0
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_prob: default_min_prob(),
            dd_monthly: default_dd_monthly(),
            max_trades_daily: default_max_trades_daily(),
            confidence: default_confidence(),
            kelly_scale: default_kelly_scale(),
            rr_levels: default_rr_levels(),
            monotonic_tolerance: default_monotonic_tolerance(),
            min_samples: default_min_samples(),
        }
    }
}

/// 런타임 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// 사이클 간격 (초)
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,
    /// 외부 I/O 재시도 횟수
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// 재시도 간격 (초)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    /// 거래 시간대
    #[serde(default)]
    pub trading_hours: TradingHoursConfig,
}

fn default_cycle_interval() -> u64 {
    60
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    5
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay(),
            trading_hours: TradingHoursConfig::default(),
        }
    }
}

/// 거래 시간대 (UTC).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TradingHoursConfig {
    /// 시작 시 (포함)
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    /// 종료 시 (제외)
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
    /// 주말 제외 여부
    #[serde(default = "default_weekdays_only")]
    pub weekdays_only: bool,
}

fn default_start_hour() -> u32 {
    5
}
fn default_end_hour() -> u32 {
    18
}
fn default_weekdays_only() -> bool {
    true
}

impl Default for TradingHoursConfig {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            weekdays_only: default_weekdays_only(),
        }
    }
}

/// 계좌 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    /// 거래당 수수료 (계좌 통화)
    #[serde(default)]
    pub commission: Decimal,
    /// 모의 브로커 초기 잔고
    #[serde(default = "default_paper_balance")]
    pub paper_balance: Decimal,
}

fn default_paper_balance() -> Decimal {
    Decimal::new(10_000, 0)
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            commission: Decimal::ZERO,
            paper_balance: default_paper_balance(),
        }
    }
}

/// 저장소 및 시장 데이터 경로 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// 봉 JSON 파일 디렉토리
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// 저장소 스냅샷 경로
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_snapshot_path() -> PathBuf {
    PathBuf::from("state/flagbot.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

/// 알림 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotificationConfig {
    /// 알림 활성화 여부
    #[serde(default)]
    pub enabled: bool,
    /// 텔레그램 설정
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// 텔레그램 알림 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// 활성화 여부
    #[serde(default)]
    pub enabled: bool,
    /// 봇 토큰
    #[serde(default)]
    pub bot_token: String,
    /// 채팅 ID
    #[serde(default)]
    pub chat_id: String,
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("FLAGBOT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("trading.timeframes")
                    .with_list_parse_key("risk.rr_levels")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}
