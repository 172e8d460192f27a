//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 설정은 YAML 파일에서 로드하고 `ROTOR__` 접두사 환경 변수로
//! 오버라이드할 수 있습니다 (예: `ROTOR__LOGGING__LEVEL=debug`).

use crate::error::{RotorError, RotorResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 포트폴리오 공통 설정
    #[serde(default)]
    pub project: ProjectConfig,
    /// ETF 유니버스 설정
    #[serde(default)]
    pub universe: UniverseConfig,
    /// 신호(모멘텀/변동성) 설정
    #[serde(default)]
    pub signal: SignalConfig,
    /// 리스크 게이트 설정
    #[serde(default)]
    pub risk_gate: RiskGateConfig,
    /// 상태별 자산 배분 설정
    #[serde(default)]
    pub allocation: AllocationConfig,
    /// 거래 비용 모델 설정
    #[serde(default)]
    pub costs: CostConfig,
    /// 시장 데이터 설정
    #[serde(default)]
    pub data: DataConfig,
    /// 페이퍼 트레이딩 설정
    #[serde(default)]
    pub paper: PaperConfig,
    /// 리포트 산출물 경로 설정
    #[serde(default)]
    pub report: ReportConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 포트폴리오 공통 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// 초기 자본
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,
    /// 노트레이드 밴드: 목표 비중과의 차이가 이 값 미만이면 거래 생략
    #[serde(default = "default_no_trade_band")]
    pub no_trade_band: Decimal,
}

fn default_initial_capital() -> Decimal {
    dec!(10_000_000)
}
fn default_no_trade_band() -> Decimal {
    dec!(0.02)
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            no_trade_band: default_no_trade_band(),
        }
    }
}

/// ETF 유니버스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniverseConfig {
    /// 로테이션 후보 주식형 ETF (첫 번째 심볼이 점수 부재 시 폴백)
    #[serde(default = "default_equity_etfs")]
    pub equity_etfs: Vec<String>,
    /// 방어 자산 ETF (단기채 등)
    #[serde(default = "default_defensive_etf")]
    pub defensive_etf: String,
}

fn default_equity_etfs() -> Vec<String> {
    vec!["069500.KS".to_string(), "229200.KS".to_string()]
}
fn default_defensive_etf() -> String {
    "153130.KS".to_string()
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            equity_etfs: default_equity_etfs(),
            defensive_etf: default_defensive_etf(),
        }
    }
}

impl UniverseConfig {
    /// 주식형 + 방어 자산을 순서를 유지하며 중복 제거한 전체 심볼 목록.
    pub fn symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.equity_etfs.len() + 1);
        for s in self
            .equity_etfs
            .iter()
            .chain(std::iter::once(&self.defensive_etf))
        {
            if !out.contains(s) {
                out.push(s.clone());
            }
        }
        out
    }
}

/// 신호(모멘텀/변동성) 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignalConfig {
    /// 모멘텀 룩백 (거래일 수)
    #[serde(default = "default_momentum_lookback_days")]
    pub momentum_lookback_days: usize,
    /// 변동성 룩백 (주간 수익률 개수)
    #[serde(default = "default_vol_lookback_weeks")]
    pub vol_lookback_weeks: usize,
    /// 변동성 하한 (0 나눗셈과 점수 폭주 방지)
    #[serde(default = "default_vol_floor")]
    pub vol_floor: Decimal,
}

fn default_momentum_lookback_days() -> usize {
    60
}
fn default_vol_lookback_weeks() -> usize {
    12
}
fn default_vol_floor() -> Decimal {
    dec!(0.005)
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            momentum_lookback_days: default_momentum_lookback_days(),
            vol_lookback_weeks: default_vol_lookback_weeks(),
            vol_floor: default_vol_floor(),
        }
    }
}

/// 리스크 게이트 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RiskGateConfig {
    /// 디리스크 진입 낙폭 임계값
    #[serde(default = "default_derisk_drawdown")]
    pub derisk_drawdown: Decimal,
    /// 서킷 쿨다운 진입 낙폭 임계값
    #[serde(default = "default_circuit_drawdown")]
    pub circuit_drawdown: Decimal,
    /// 서킷 쿨다운 유지 주 수
    #[serde(default = "default_cooldown_weeks")]
    pub cooldown_weeks: u32,
}

fn default_derisk_drawdown() -> Decimal {
    dec!(0.15)
}
fn default_circuit_drawdown() -> Decimal {
    dec!(0.30)
}
fn default_cooldown_weeks() -> u32 {
    4
}

impl Default for RiskGateConfig {
    fn default() -> Self {
        Self {
            derisk_drawdown: default_derisk_drawdown(),
            circuit_drawdown: default_circuit_drawdown(),
            cooldown_weeks: default_cooldown_weeks(),
        }
    }
}

/// 상태별 자산 배분 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllocationConfig {
    /// NORMAL 상태의 주식형 비중
    #[serde(default = "default_normal_equity_weight")]
    pub normal_equity_weight: Decimal,
    /// DE_RISK 상태의 주식형 비중 (잔여분은 방어 자산)
    #[serde(default = "default_derisk_equity_weight")]
    pub derisk_equity_weight: Decimal,
}

fn default_normal_equity_weight() -> Decimal {
    dec!(1.0)
}
fn default_derisk_equity_weight() -> Decimal {
    dec!(0.5)
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            normal_equity_weight: default_normal_equity_weight(),
            derisk_equity_weight: default_derisk_equity_weight(),
        }
    }
}

/// 거래 비용 모델 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CostConfig {
    /// 약정 금액 대비 수수료율
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,
    /// 건당 최소 수수료
    #[serde(default)]
    pub min_commission: Decimal,
    /// 매도 금액에만 붙는 거래세율 (국내 ETF는 0)
    #[serde(default)]
    pub sell_tax_rate: Decimal,
    /// 슬리피지 (bps, 1bp = 0.01%)
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: Decimal,
}

fn default_commission_rate() -> Decimal {
    dec!(0.00015)
}
fn default_slippage_bps() -> Decimal {
    dec!(5)
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            commission_rate: default_commission_rate(),
            min_commission: Decimal::ZERO,
            sell_tax_rate: Decimal::ZERO,
            slippage_bps: default_slippage_bps(),
        }
    }
}

/// 시장 데이터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// 일봉 CSV 캐시 디렉토리
    #[serde(default = "default_market_dir")]
    pub market_dir: PathBuf,
    /// 최초 수집 시작일
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    /// 수집 종료일 (없으면 오늘까지)
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// 네트워크 재시도 설정
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_market_dir() -> PathBuf {
    PathBuf::from("data/market")
}
fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            market_dir: default_market_dir(),
            start_date: default_start_date(),
            end_date: None,
            retry: RetryConfig::default(),
        }
    }
}

/// 네트워크 재시도 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// 최대 시도 횟수
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,
    /// 재시도 간 대기 시간 (초)
    #[serde(default = "default_retry_wait")]
    pub wait_seconds: u64,
}

fn default_retry_attempts() -> u32 {
    5
}
fn default_retry_wait() -> u64 {
    2
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            wait_seconds: default_retry_wait(),
        }
    }
}

/// 페이퍼 트레이딩 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaperConfig {
    /// 계좌 상태 JSON 경로
    #[serde(default = "default_account_path")]
    pub account_path: PathBuf,
    /// 체결 내역/계획 CSV 출력 디렉토리
    #[serde(default = "default_blotter_dir")]
    pub blotter_dir: PathBuf,
}

fn default_account_path() -> PathBuf {
    PathBuf::from("data/paper/account.json")
}
fn default_blotter_dir() -> PathBuf {
    PathBuf::from("data/paper")
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            account_path: default_account_path(),
            blotter_dir: default_blotter_dir(),
        }
    }
}

/// 리포트 산출물 경로 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// 백테스트 리밸런스 기록 CSV
    #[serde(default = "default_backtest_rebalances_csv")]
    pub backtest_rebalances_csv: PathBuf,
    /// 백테스트 순자산 곡선 CSV
    #[serde(default = "default_backtest_equity_csv")]
    pub backtest_equity_csv: PathBuf,
    /// 백테스트 HTML 리포트
    #[serde(default = "default_backtest_html")]
    pub backtest_html: PathBuf,
    /// 페이퍼 순자산 곡선 CSV
    #[serde(default = "default_paper_equity_csv")]
    pub paper_equity_csv: PathBuf,
    /// 페이퍼 HTML 리포트
    #[serde(default = "default_paper_html")]
    pub paper_html: PathBuf,
}

fn default_backtest_rebalances_csv() -> PathBuf {
    PathBuf::from("reports/backtest_rebalances.csv")
}
fn default_backtest_equity_csv() -> PathBuf {
    PathBuf::from("reports/backtest_equity.csv")
}
fn default_backtest_html() -> PathBuf {
    PathBuf::from("reports/backtest_report.html")
}
fn default_paper_equity_csv() -> PathBuf {
    PathBuf::from("reports/paper_equity.csv")
}
fn default_paper_html() -> PathBuf {
    PathBuf::from("reports/paper_report.html")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            backtest_rebalances_csv: default_backtest_rebalances_csv(),
            backtest_equity_csv: default_backtest_equity_csv(),
            backtest_html: default_backtest_html(),
            paper_equity_csv: default_paper_equity_csv(),
            paper_html: default_paper_html(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 로드 직후 `validate`를 호출하여 잘못된 설정은 즉시 실패시킵니다.
    pub fn load<P: AsRef<Path>>(path: P) -> RotorResult<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("ROTOR")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> RotorResult<Self> {
        Self::load("config/config.yaml")
    }

    /// 설정 값의 일관성을 검사합니다.
    pub fn validate(&self) -> RotorResult<()> {
        if self.project.initial_capital <= Decimal::ZERO {
            return Err(RotorError::Config(
                "초기 자본은 0보다 커야 합니다".to_string(),
            ));
        }
        if self.project.no_trade_band < Decimal::ZERO || self.project.no_trade_band >= Decimal::ONE
        {
            return Err(RotorError::Config(
                "노트레이드 밴드는 [0, 1) 범위여야 합니다".to_string(),
            ));
        }
        if self.universe.equity_etfs.is_empty() {
            return Err(RotorError::Config(
                "유니버스에 주식형 ETF가 최소 하나 필요합니다".to_string(),
            ));
        }
        if self.universe.defensive_etf.trim().is_empty() {
            return Err(RotorError::Config(
                "방어 자산 심볼이 비어 있습니다".to_string(),
            ));
        }
        if self.signal.momentum_lookback_days < 1 {
            return Err(RotorError::Config(
                "모멘텀 룩백은 1일 이상이어야 합니다".to_string(),
            ));
        }
        if self.signal.vol_lookback_weeks < 2 {
            return Err(RotorError::Config(
                "변동성 룩백은 2주 이상이어야 합니다 (표본 표준편차)".to_string(),
            ));
        }
        if self.signal.vol_floor <= Decimal::ZERO {
            return Err(RotorError::Config(
                "변동성 하한은 0보다 커야 합니다".to_string(),
            ));
        }
        if self.risk_gate.derisk_drawdown <= Decimal::ZERO
            || self.risk_gate.derisk_drawdown >= self.risk_gate.circuit_drawdown
        {
            return Err(RotorError::Config(
                "리스크 게이트 임계값은 0 < 디리스크 < 서킷 을 만족해야 합니다".to_string(),
            ));
        }
        if self.risk_gate.cooldown_weeks < 1 {
            return Err(RotorError::Config(
                "쿨다운 주 수는 1 이상이어야 합니다".to_string(),
            ));
        }
        let alloc = &self.allocation;
        if alloc.derisk_equity_weight < Decimal::ZERO
            || alloc.derisk_equity_weight > alloc.normal_equity_weight
            || alloc.normal_equity_weight > Decimal::ONE
        {
            return Err(RotorError::Config(
                "배분 비중은 0 ≤ 디리스크 ≤ 일반 ≤ 1 을 만족해야 합니다".to_string(),
            ));
        }
        let costs = &self.costs;
        if costs.commission_rate < Decimal::ZERO
            || costs.min_commission < Decimal::ZERO
            || costs.sell_tax_rate < Decimal::ZERO
            || costs.slippage_bps < Decimal::ZERO
        {
            return Err(RotorError::Config(
                "비용 파라미터는 음수일 수 없습니다".to_string(),
            ));
        }
        if self.data.retry.attempts < 1 {
            return Err(RotorError::Config(
                "재시도 횟수는 1 이상이어야 합니다".to_string(),
            ));
        }
        if let Some(end) = self.data.end_date {
            if end < self.data.start_date {
                return Err(RotorError::Config(
                    "수집 종료일이 시작일보다 빠릅니다".to_string(),
                ));
            }
        }
        Ok(())
    }
}
