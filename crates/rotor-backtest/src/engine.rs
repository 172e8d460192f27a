//! 주간 로테이션 백테스트 엔진.
//!
//! 일봉 종가로 포트폴리오를 시뮬레이션합니다:
//! - 보유 자산 평가액은 매일 가격 변화율만큼 드리프트
//! - 매주 첫 거래일에 직전 거래일(신호 기준일) 데이터로 리밸런스
//! - 거래 비용은 리밸런스 시점 일괄 추정 후 현금에서 차감
//!
//! 신호 기준일과 체결일을 분리하므로 미래 데이터 참조가 없습니다.

use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use chrono::NaiveDate;
use rotor_core::config::{
    AllocationConfig, AppConfig, CostConfig, ProjectConfig, RiskGateConfig, SignalConfig,
    UniverseConfig,
};
use rotor_core::{
    aligned_dates, closes_asof, drawdown_from_peak, starts_new_week, EquityPoint, PriceSeries,
    RiskState, WeeklySignal,
};
use rotor_signal::{apply_no_trade_band, CostModel, RiskGate, RotationSignalEngine, TradeLeg};

use crate::metrics::BacktestStats;

/// 결과 신뢰도 경고 기준 (정렬된 거래일 수).
const MIN_ALIGNED_ROWS: usize = 200;

/// 백테스트 오류
#[derive(Debug, Error)]
pub enum BacktestError {
    /// 설정 오류
    #[error("백테스트 설정 오류: {0}")]
    ConfigError(String),

    /// 데이터 오류
    #[error("데이터 오류: {0}")]
    DataError(String),

    /// 리포트 입출력 오류
    #[error("리포트 입출력 오류: {0}")]
    Io(#[from] std::io::Error),

    /// 리포트 CSV 오류
    #[error("리포트 CSV 오류: {0}")]
    Csv(#[from] csv::Error),
}

/// 백테스트 결과 타입
pub type BacktestResult<T> = Result<T, BacktestError>;

/// 백테스트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// 초기 자본금
    pub initial_capital: Decimal,
    /// 노트레이드 밴드
    pub no_trade_band: Decimal,
    /// 로테이션 후보 주식형 ETF
    pub equity_etfs: Vec<String>,
    /// 방어 자산 ETF
    pub defensive_etf: String,
    /// 신호 설정
    pub signal: SignalConfig,
    /// 리스크 게이트 설정
    pub gate: RiskGateConfig,
    /// 자산 배분 설정
    pub allocation: AllocationConfig,
    /// 거래 비용 설정
    pub costs: CostConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        let project = ProjectConfig::default();
        let universe = UniverseConfig::default();
        Self {
            initial_capital: project.initial_capital,
            no_trade_band: project.no_trade_band,
            equity_etfs: universe.equity_etfs,
            defensive_etf: universe.defensive_etf,
            signal: SignalConfig::default(),
            gate: RiskGateConfig::default(),
            allocation: AllocationConfig::default(),
            costs: CostConfig::default(),
        }
    }
}

impl BacktestConfig {
    /// 새로운 백테스트 설정을 생성합니다.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            ..Default::default()
        }
    }

    /// 앱 전체 설정에서 백테스트 설정을 구성합니다.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            initial_capital: config.project.initial_capital,
            no_trade_band: config.project.no_trade_band,
            equity_etfs: config.universe.equity_etfs.clone(),
            defensive_etf: config.universe.defensive_etf.clone(),
            signal: config.signal.clone(),
            gate: config.risk_gate.clone(),
            allocation: config.allocation.clone(),
            costs: config.costs.clone(),
        }
    }

    /// 노트레이드 밴드 설정
    pub fn with_no_trade_band(mut self, band: Decimal) -> Self {
        self.no_trade_band = band;
        self
    }

    /// 유니버스 설정
    pub fn with_universe(
        mut self,
        equity_etfs: Vec<String>,
        defensive_etf: impl Into<String>,
    ) -> Self {
        self.equity_etfs = equity_etfs;
        self.defensive_etf = defensive_etf.into();
        self
    }

    /// 신호 설정
    pub fn with_signal(mut self, signal: SignalConfig) -> Self {
        self.signal = signal;
        self
    }

    /// 리스크 게이트 설정
    pub fn with_gate(mut self, gate: RiskGateConfig) -> Self {
        self.gate = gate;
        self
    }

    /// 비용 설정
    pub fn with_costs(mut self, costs: CostConfig) -> Self {
        self.costs = costs;
        self
    }

    /// 설정 검증
    pub fn validate(&self) -> BacktestResult<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(BacktestError::ConfigError(
                "초기 자본은 0보다 커야 합니다".to_string(),
            ));
        }
        if self.no_trade_band < Decimal::ZERO || self.no_trade_band >= Decimal::ONE {
            return Err(BacktestError::ConfigError(
                "노트레이드 밴드는 [0, 1) 범위여야 합니다".to_string(),
            ));
        }
        if self.equity_etfs.is_empty() {
            return Err(BacktestError::ConfigError(
                "주식형 ETF가 최소 1개 필요합니다".to_string(),
            ));
        }
        if self.defensive_etf.trim().is_empty() {
            return Err(BacktestError::ConfigError(
                "방어 자산 ETF가 비어 있습니다".to_string(),
            ));
        }
        Ok(())
    }

    /// 유니버스 전체 심볼 (주식형 + 방어, 중복 제거).
    pub fn all_symbols(&self) -> Vec<String> {
        let mut symbols = self.equity_etfs.clone();
        if !symbols.contains(&self.defensive_etf) {
            symbols.push(self.defensive_etf.clone());
        }
        symbols
    }
}

/// 리밸런스 한 번의 체결 기록.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceRecord {
    /// 체결일 (주 첫 거래일)
    pub trade_date: NaiveDate,
    /// 신호 기준일 (직전 거래일)
    pub signal_date: NaiveDate,
    /// 게이트 상태
    pub state: RiskState,
    /// 선택된 위험 자산
    pub winner: String,
    /// 신호 기준일 드로다운
    pub drawdown: Decimal,
    /// 리밸런스 직전 포트폴리오 가치
    pub portfolio_value_pre: Decimal,
    /// 비용 차감 후 포트폴리오 가치
    pub portfolio_value_post: Decimal,
    /// 비중 변화 절대값 합
    pub turnover_abs_weight: Decimal,
    /// 편도 회전율 (절대값 합 / 2)
    pub turnover_oneway: Decimal,
    /// 총 약정 금액
    pub gross_trade_value: Decimal,
    /// 매도 금액
    pub gross_sell_value: Decimal,
    /// 추정 비용
    pub estimated_cost: Decimal,
}

/// 백테스트 실행 결과.
#[derive(Debug, Clone)]
pub struct BacktestOutcome {
    /// 실행에 사용된 설정
    pub config: BacktestConfig,
    /// 시뮬레이션 시작일
    pub start_date: NaiveDate,
    /// 시뮬레이션 종료일
    pub end_date: NaiveDate,
    /// 일별 순자산 곡선 (리밸런스일은 비용 차감 후 값)
    pub equity_curve: Vec<EquityPoint>,
    /// 리밸런스 기록
    pub rebalances: Vec<RebalanceRecord>,
    /// 리밸런스별 신호 레코드
    pub signals: Vec<WeeklySignal>,
    /// 성과 지표
    pub stats: BacktestStats,
}

impl BacktestOutcome {
    /// 콘솔 출력용 요약 문자열.
    pub fn summary(&self) -> String {
        let fmt_pct = |v: Decimal| format!("{:.2}%", v * Decimal::from(100));
        let fmt_opt_pct = |v: Option<Decimal>| v.map_or("-".to_string(), fmt_pct);
        let fmt_opt = |v: Option<Decimal>| v.map_or("-".to_string(), |d| format!("{:.2}", d));

        format!(
            "백테스트 결과 요약\n\
             ═══════════════════════════════════════\n\
             기간: {} → {} ({} 거래일)\n\
             리밸런스 횟수: {}\n\
             ───────────────────────────────────────\n\
             초기 자본: {:.0}\n\
             최종 자산: {:.0}\n\
             총 수익률: {}\n\
             CAGR: {}\n\
             ───────────────────────────────────────\n\
             최대 낙폭: {}\n\
             샤프 비율: {}\n\
             주간 평균 편도 회전율: {}\n\
             ───────────────────────────────────────\n\
             총 추정 비용: {:.0}\n\
             초기 자본 대비 비용: {}\n\
             약정 금액 대비 비용: {}\n\
             ═══════════════════════════════════════",
            self.start_date,
            self.end_date,
            self.stats.trading_days,
            self.stats.rebalance_count,
            self.config.initial_capital,
            self.stats.final_equity,
            fmt_pct(self.stats.total_return),
            fmt_opt_pct(self.stats.cagr),
            fmt_pct(self.stats.max_drawdown),
            fmt_opt(self.stats.sharpe),
            fmt_opt_pct(self.stats.avg_weekly_turnover_oneway),
            self.stats.estimated_total_cost,
            fmt_pct(self.stats.estimated_cost_pct_initial),
            fmt_opt_pct(self.stats.estimated_cost_over_gross_trade),
        )
    }
}

/// 백테스트 엔진.
///
/// 상태를 갖지 않으므로 같은 엔진으로 여러 데이터셋을 실행할 수 있습니다.
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// 새로운 백테스트 엔진을 생성합니다.
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// 심볼별 가격 시리즈로 백테스트를 실행합니다.
    ///
    /// 서로 다른 상장일을 가진 심볼은 모두 데이터가 존재하는 구간부터
    /// 시뮬레이션하며, 중간 결측일은 직전 종가로 보간합니다.
    pub fn run(&self, series: &HashMap<String, PriceSeries>) -> BacktestResult<BacktestOutcome> {
        self.config.validate()?;

        let symbols = self.config.all_symbols();
        for symbol in &symbols {
            if series.get(symbol).map_or(true, |s| s.is_empty()) {
                return Err(BacktestError::DataError(format!(
                    "{} 가격 데이터가 없습니다",
                    symbol
                )));
            }
        }

        let dates = aligned_dates(series, &symbols);
        if dates.is_empty() {
            return Err(BacktestError::DataError(
                "모든 심볼이 공존하는 거래일이 없습니다".to_string(),
            ));
        }
        if dates.len() < MIN_ALIGNED_ROWS {
            warn!(
                rows = dates.len(),
                "정렬된 거래일이 {}일 미만입니다. 결과 신뢰도가 낮습니다", MIN_ALIGNED_ROWS
            );
        }

        let signal_engine =
            RotationSignalEngine::new(self.config.signal.clone(), self.config.allocation.clone());
        let cost_model = CostModel::new(self.config.costs.clone());
        let mut gate = RiskGate::new(self.config.gate.clone());

        let mut cash = self.config.initial_capital;
        // 심볼별 평가액 (주식 수 대신 가치 기반으로 드리프트)
        let mut holdings: HashMap<String, Decimal> = HashMap::new();
        let mut prev_closes: Option<HashMap<String, Decimal>> = None;

        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(dates.len());
        let mut peak_curve: Vec<Decimal> = Vec::with_capacity(dates.len());
        let mut peak = Decimal::ZERO;

        let mut rebalances: Vec<RebalanceRecord> = Vec::new();
        let mut signals: Vec<WeeklySignal> = Vec::new();

        for (i, &date) in dates.iter().enumerate() {
            let closes = closes_asof(series, &symbols, date).ok_or_else(|| {
                BacktestError::DataError(format!("{} 종가를 조회할 수 없습니다", date))
            })?;

            // 보유 평가액을 가격 변화율만큼 드리프트
            if let Some(prev) = &prev_closes {
                for (symbol, value) in holdings.iter_mut() {
                    if let (Some(p0), Some(p1)) = (prev.get(symbol), closes.get(symbol)) {
                        if *p0 > Decimal::ZERO {
                            *value *= *p1 / *p0;
                        }
                    }
                }
            }

            let equity = cash + holdings.values().copied().sum::<Decimal>();
            peak = peak.max(equity);
            equity_curve.push(EquityPoint::new(date, equity));
            peak_curve.push(peak);

            // 첫 거래일은 제외, 주가 바뀐 첫 거래일에만 리밸런스
            if i > 0 && starts_new_week(dates[i - 1], date) {
                let signal_date = dates[i - 1];
                let span = rotor_core::rebalance_span!("rebalance", date, signal_date);
                let _guard = span.enter();

                let drawdown =
                    drawdown_from_peak(equity_curve[i - 1].equity, peak_curve[i - 1]);
                let transition = gate.on_rebalance(drawdown);
                let decision = signal_engine.evaluate(
                    series,
                    &self.config.equity_etfs,
                    &self.config.defensive_etf,
                    signal_date,
                    transition.state,
                    drawdown,
                );

                let current_weights: HashMap<String, Decimal> = if equity > Decimal::ZERO {
                    holdings
                        .iter()
                        .map(|(s, v)| (s.clone(), *v / equity))
                        .collect()
                } else {
                    HashMap::new()
                };
                let effective = apply_no_trade_band(
                    &decision.target_weights,
                    &current_weights,
                    self.config.no_trade_band,
                );

                let pre_value = equity;
                let mut turnover_abs = Decimal::ZERO;
                let mut sell_weight = Decimal::ZERO;
                let union: BTreeSet<&String> =
                    current_weights.keys().chain(effective.keys()).collect();
                for symbol in union {
                    let w0 = current_weights.get(symbol).copied().unwrap_or(Decimal::ZERO);
                    let w1 = effective.get(symbol).copied().unwrap_or(Decimal::ZERO);
                    turnover_abs += (w1 - w0).abs();
                    sell_weight += (w0 - w1).max(Decimal::ZERO);
                }
                let gross_trade_value = turnover_abs * pre_value;
                let gross_sell_value = sell_weight * pre_value;
                let estimated_cost = cost_model.leg_cost(&TradeLeg {
                    trade_value: gross_trade_value,
                    sell_value: gross_sell_value,
                });

                // 유효 비중대로 재배치, 비용은 현금에서 차감
                holdings = effective
                    .iter()
                    .map(|(s, w)| (s.clone(), *w * pre_value))
                    .collect();
                let invested: Decimal = effective.values().copied().sum();
                cash = pre_value * (Decimal::ONE - invested) - estimated_cost;

                let post_value = cash + holdings.values().copied().sum::<Decimal>();
                // 체결일 곡선은 비용 차감 후 값으로 덮어씀
                equity_curve[i] = EquityPoint::new(date, post_value);
                peak = peak.max(post_value);
                peak_curve[i] = peak;

                info!(
                    state = %transition.state,
                    winner = %decision.signal.selected,
                    %drawdown,
                    turnover = %turnover_abs,
                    cost = %estimated_cost,
                    "리밸런스 체결"
                );

                rebalances.push(RebalanceRecord {
                    trade_date: date,
                    signal_date,
                    state: transition.state,
                    winner: decision.signal.selected.clone(),
                    drawdown,
                    portfolio_value_pre: pre_value,
                    portfolio_value_post: post_value,
                    turnover_abs_weight: turnover_abs,
                    turnover_oneway: turnover_abs / Decimal::TWO,
                    gross_trade_value,
                    gross_sell_value,
                    estimated_cost,
                });
                signals.push(decision.signal);
            }

            prev_closes = Some(closes);
        }

        let stats =
            BacktestStats::from_curve(&equity_curve, &rebalances, self.config.initial_capital);

        Ok(BacktestOutcome {
            config: self.config.clone(),
            start_date: dates[0],
            end_date: dates[dates.len() - 1],
            equity_curve,
            rebalances,
            signals,
            stats,
        })
    }
}
