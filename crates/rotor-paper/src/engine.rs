//! 주간 페이퍼 트레이딩 실행 엔진
//!
//! 백테스트와 같은 신호 엔진을 쓰되, 비중 대신 정수 주수로 체결을
//! 시뮬레이션합니다. 한 번 호출에 보류 중인 리밸런스 하나만 처리하므로
//! 주 1회 크론으로 돌리면 됩니다. 데이터 공백으로 여러 주가 밀렸다면
//! 반복 호출로 한 주씩 따라잡습니다.
//!
//! 체결 규칙:
//! - 신호는 직전 거래일(신호일) 종가로 계산하고, 체결은 당일 종가로 합니다
//! - 매도를 먼저 실행해 현금을 확보한 뒤 매수합니다
//! - 매수는 방어 자산을 마지막에 배치해 주식형부터 채웁니다
//! - 현금이 모자라면 살 수 있을 때까지 주수를 1주씩 줄입니다

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use rotor_core::config::{
    AllocationConfig, AppConfig, CostConfig, ProjectConfig, RiskGateConfig, SignalConfig,
    UniverseConfig,
};
use rotor_core::{
    aligned_dates, closes_asof, drawdown_from_peak, rebalance_indices, PriceSeries, RiskState,
    WeeklySignal,
};
use rotor_signal::{apply_no_trade_band, CostModel, RiskGate, RotationSignalEngine, TradeLeg};

use crate::account::{PaperAccount, TradeRecord, TradeSide};
use crate::blotter::{BlotterRow, PlanRow, TradeAction};
use crate::error::{PaperError, PaperResult};

// ============================================================
// 설정
// ============================================================

/// 페이퍼 트레이딩 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperEngineConfig {
    /// 신규 계좌의 초기 자본금
    pub initial_capital: Decimal,
    /// 노트레이드 밴드 폭
    pub no_trade_band: Decimal,
    /// 주식형 ETF 유니버스
    pub equity_etfs: Vec<String>,
    /// 방어 자산 ETF
    pub defensive_etf: String,
    /// 신호 설정
    pub signal: SignalConfig,
    /// 리스크 게이트 설정
    pub gate: RiskGateConfig,
    /// 비중 배분 설정
    pub allocation: AllocationConfig,
    /// 거래 비용 설정
    pub costs: CostConfig,
}

impl Default for PaperEngineConfig {
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

impl PaperEngineConfig {
    /// 앱 설정에서 페이퍼 엔진 설정을 만듭니다.
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

    /// 설정 유효성을 검증합니다.
    pub fn validate(&self) -> PaperResult<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(PaperError::ConfigError(
                "초기 자본은 0보다 커야 합니다".to_string(),
            ));
        }
        if self.no_trade_band < Decimal::ZERO || self.no_trade_band >= Decimal::ONE {
            return Err(PaperError::ConfigError(
                "노트레이드 밴드는 [0, 1) 범위여야 합니다".to_string(),
            ));
        }
        if self.equity_etfs.is_empty() {
            return Err(PaperError::ConfigError(
                "주식형 ETF가 최소 1개 필요합니다".to_string(),
            ));
        }
        if self.defensive_etf.trim().is_empty() {
            return Err(PaperError::ConfigError(
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

// ============================================================
// 실행 결과
// ============================================================

/// `run_once` 한 번의 실행 결과
#[derive(Debug, Clone)]
pub struct PaperRunOutcome {
    /// 체결일
    pub trade_date: NaiveDate,
    /// 신호 산출 기준일
    pub signal_date: NaiveDate,
    /// 이번 리밸런스의 리스크 상태
    pub state: RiskState,
    /// 승자 주식 ETF
    pub winner: String,
    /// 신호일 기준 낙폭
    pub drawdown: Decimal,
    /// 체결 직전 계좌 평가액 (체결일 종가 기준)
    pub pre_value: Decimal,
    /// 체결 후 계좌 평가액
    pub post_value: Decimal,
    /// 심볼별 블로터 행
    pub blotter: Vec<BlotterRow>,
    /// 실제 체결된 주문들
    pub executed: Vec<TradeRecord>,
    /// 신호 레코드
    pub signal: WeeklySignal,
}

/// `plan_weekly`가 만드는 주간 플랜
#[derive(Debug, Clone)]
pub struct WeeklyPlan {
    /// 신호 산출 기준일 (가격 데이터의 마지막 거래일)
    pub signal_date: NaiveDate,
    /// 플랜 시점의 리스크 상태
    pub state: RiskState,
    /// 승자 주식 ETF
    pub winner_equity: String,
    /// 신호일 기준 낙폭
    pub drawdown: Decimal,
    /// 신호일 기준 계좌 평가액
    pub equity_estimated: Decimal,
    /// 목표 비중이 있는 심볼별 플랜 행
    pub rows: Vec<PlanRow>,
}

// ============================================================
// 엔진
// ============================================================

/// 페이퍼 트레이딩 실행 엔진
pub struct PaperEngine {
    config: PaperEngineConfig,
    signals: RotationSignalEngine,
    costs: CostModel,
}

impl PaperEngine {
    pub fn new(config: PaperEngineConfig) -> Self {
        let signals = RotationSignalEngine::new(config.signal.clone(), config.allocation.clone());
        let costs = CostModel::new(config.costs.clone());
        Self {
            config,
            signals,
            costs,
        }
    }

    /// 보류 중인 리밸런스 하나를 실행합니다.
    ///
    /// 신규 계좌(`as_of == None`)는 가격 데이터의 첫 리밸런스 날짜부터,
    /// 기존 계좌는 `as_of` 이후 첫 리밸런스 날짜를 처리합니다.
    /// 처리할 리밸런스가 없으면 [`PaperError::UpToDate`]를 반환합니다.
    pub fn run_once(
        &self,
        account: &mut PaperAccount,
        series: &HashMap<String, PriceSeries>,
    ) -> PaperResult<PaperRunOutcome> {
        self.config.validate()?;
        let symbols = self.config.all_symbols();
        for symbol in &symbols {
            if series.get(symbol).map_or(true, |s| s.is_empty()) {
                return Err(PaperError::DataError(format!(
                    "가격 데이터가 없습니다: {symbol}"
                )));
            }
        }

        let dates = aligned_dates(series, &symbols);
        if dates.is_empty() {
            return Err(PaperError::DataError(
                "유니버스 공통 거래일이 없습니다".to_string(),
            ));
        }

        // 다음 리밸런스: as_of 이후 첫 번째 주 시작 거래일
        let indices = rebalance_indices(&dates);
        let idx = indices
            .iter()
            .copied()
            .find(|&i| account.as_of.map_or(true, |as_of| dates[i] > as_of))
            .ok_or_else(|| match account.as_of {
                Some(as_of) => PaperError::UpToDate(as_of),
                None => PaperError::DataError(
                    "리밸런스 가능한 거래일이 없습니다 (최소 2주 데이터 필요)".to_string(),
                ),
            })?;
        let trade_date = dates[idx];
        let signal_date = dates[idx - 1];

        let span = rotor_core::rebalance_span!("paper_rebalance", trade_date, signal_date);
        let _guard = span.enter();

        // (as_of, 신호일] 구간 순자산 백필. 낙폭 판정에 쓰는 고점도 함께 갱신
        for &date in dates[..idx].iter() {
            if account.as_of.map_or(false, |as_of| date <= as_of) {
                continue;
            }
            let value = account.total_equity(series, date);
            account.record_equity(date, value);
            account.equity_peak = account.equity_peak.max(value);
        }

        let signal_value = account.total_equity(series, signal_date);
        let drawdown = drawdown_from_peak(signal_value, account.equity_peak);

        // 게이트 전이 후 스냅샷을 계좌에 되돌려 저장
        let mut gate = RiskGate::from_snapshot(self.config.gate.clone(), &account.gate);
        let transition = gate.on_rebalance(drawdown);
        account.gate = gate.snapshot();

        let decision = self.signals.evaluate(
            series,
            &self.config.equity_etfs,
            &self.config.defensive_etf,
            signal_date,
            transition.state,
            drawdown,
        );
        let winner = decision.signal.selected.clone();

        // 체결일 종가. 유니버스 밖 보유 종목도 가격이 있으면 포함
        let mut prices = closes_asof(series, &symbols, trade_date).ok_or_else(|| {
            PaperError::DataError(format!("체결일 종가를 만들 수 없습니다: {trade_date}"))
        })?;
        for symbol in account.positions.keys() {
            if !prices.contains_key(symbol) {
                if let Some(px) = series.get(symbol).and_then(|s| s.close_asof(trade_date)) {
                    prices.insert(symbol.clone(), px);
                }
            }
        }

        // 체결 직전 평가액과 현재 비중 (가격 없는 종목은 제외)
        let pre_positions: HashMap<String, i64> = account.positions.clone();
        let mut pre_value = account.cash;
        let mut position_values: HashMap<String, Decimal> = HashMap::new();
        for (symbol, shares) in &pre_positions {
            if let Some(px) = prices.get(symbol) {
                let value = Decimal::from(*shares) * *px;
                position_values.insert(symbol.clone(), value);
                pre_value += value;
            }
        }
        let current_weights: HashMap<String, Decimal> = if pre_value > Decimal::ZERO {
            position_values
                .iter()
                .map(|(s, v)| (s.clone(), *v / pre_value))
                .collect()
        } else {
            HashMap::new()
        };

        let effective = apply_no_trade_band(
            &decision.target_weights,
            &current_weights,
            self.config.no_trade_band,
        );

        // 목표 주수: floor(평가액 × 비중 / 종가). 목표에 없는 보유 종목은 0주
        let mut target_shares: BTreeMap<String, i64> = BTreeMap::new();
        for (symbol, weight) in &effective {
            if let Some(px) = prices.get(symbol) {
                if *px > Decimal::ZERO {
                    let shares = (pre_value * *weight / *px).floor().to_i64().unwrap_or(0);
                    target_shares.insert(symbol.clone(), shares.max(0));
                }
            }
        }
        for symbol in pre_positions.keys() {
            if !target_shares.contains_key(symbol) && prices.contains_key(symbol) {
                target_shares.insert(symbol.clone(), 0);
            }
        }

        let mut executed: Vec<TradeRecord> = Vec::new();
        let mut symbol_costs: HashMap<String, Decimal> = HashMap::new();

        // 1단계: 매도 먼저 실행해 현금 확보
        for (symbol, target) in &target_shares {
            let held = account.position(symbol);
            let delta = *target - held;
            if delta >= 0 {
                continue;
            }
            let px = match prices.get(symbol) {
                Some(px) => *px,
                None => continue,
            };
            let sell_shares = -delta;
            let sell_value = Decimal::from(sell_shares) * px;
            let cost = self.costs.leg_cost(&TradeLeg::sell(sell_value));
            account.cash += sell_value - cost;
            account.positions.insert(symbol.clone(), *target);
            symbol_costs.insert(symbol.clone(), cost);
            executed.push(TradeRecord {
                id: Uuid::new_v4(),
                trade_date,
                symbol: symbol.clone(),
                side: TradeSide::Sell,
                shares: sell_shares,
                price: px,
                cost,
            });
        }

        // 2단계: 매수. 방어 자산을 마지막에 두어 주식형부터 채운다
        let mut buys: Vec<(String, i64)> = target_shares
            .iter()
            .filter_map(|(symbol, target)| {
                let delta = *target - pre_positions.get(symbol).copied().unwrap_or(0);
                (delta > 0).then(|| (symbol.clone(), delta))
            })
            .collect();
        buys.sort_by_key(|(symbol, _)| (*symbol == self.config.defensive_etf, symbol.clone()));

        for (symbol, planned) in buys {
            let px = match prices.get(&symbol) {
                Some(px) => *px,
                None => continue,
            };
            let mut buy_shares = planned;
            // 현금이 모자라면 살 수 있을 때까지 1주씩 줄인다
            while buy_shares > 0 {
                let buy_value = Decimal::from(buy_shares) * px;
                let cost = self.costs.leg_cost(&TradeLeg::buy(buy_value));
                if account.cash >= buy_value + cost {
                    account.cash -= buy_value + cost;
                    *account.positions.entry(symbol.clone()).or_insert(0) += buy_shares;
                    symbol_costs.insert(symbol.clone(), cost);
                    executed.push(TradeRecord {
                        id: Uuid::new_v4(),
                        trade_date,
                        symbol: symbol.clone(),
                        side: TradeSide::Buy,
                        shares: buy_shares,
                        price: px,
                        cost,
                    });
                    break;
                }
                buy_shares -= 1;
            }
            if buy_shares == 0 {
                debug!(symbol = %symbol, planned, "현금 부족으로 매수 보류");
            }
        }

        account.positions.retain(|_, shares| *shares != 0);

        // 체결 후 평가액 기록
        let mut post_value = account.cash;
        for (symbol, shares) in &account.positions {
            if let Some(px) = prices.get(symbol) {
                post_value += Decimal::from(*shares) * *px;
            }
        }
        account.record_equity(trade_date, post_value);
        account.equity_peak = account.equity_peak.max(post_value);
        account.as_of = Some(trade_date);
        account.trades.extend(executed.iter().cloned());

        // 블로터: 리밸런스 전 보유 종목과 목표 종목의 합집합
        let mut row_symbols: BTreeSet<String> = pre_positions.keys().cloned().collect();
        row_symbols.extend(effective.keys().cloned());

        let mut blotter = Vec::with_capacity(row_symbols.len());
        for symbol in row_symbols {
            let pre = pre_positions.get(&symbol).copied().unwrap_or(0);
            let post = account.position(&symbol);
            let delta = post - pre;
            let action = if delta > 0 {
                TradeAction::Buy
            } else if delta < 0 {
                TradeAction::Sell
            } else {
                TradeAction::Hold
            };
            blotter.push(BlotterRow {
                trade_date,
                signal_date,
                symbol: symbol.clone(),
                action,
                current_weight: *current_weights.get(&symbol).unwrap_or(&Decimal::ZERO),
                target_weight: *effective.get(&symbol).unwrap_or(&Decimal::ZERO),
                target_shares: post,
                delta_shares: delta,
                reference_price: *prices.get(&symbol).unwrap_or(&Decimal::ZERO),
                estimated_cost: *symbol_costs.get(&symbol).unwrap_or(&Decimal::ZERO),
                state: transition.state,
            });
        }

        info!(
            %trade_date,
            %signal_date,
            state = %transition.state,
            winner = %winner,
            %drawdown,
            orders = executed.len(),
            %post_value,
            "페이퍼 리밸런스 실행 완료"
        );

        Ok(PaperRunOutcome {
            trade_date,
            signal_date,
            state: transition.state,
            winner,
            drawdown,
            pre_value,
            post_value,
            blotter,
            executed,
            signal: decision.signal,
        })
    }

    /// 다음 리밸런스를 위한 주간 플랜을 만듭니다. 계좌는 변경하지 않습니다.
    ///
    /// 가격 데이터의 마지막 거래일을 신호일로 쓰므로, 금요일 장 마감 후
    /// 데이터를 업데이트하고 부르면 다음 주 월요일의 주문 계획이 나옵니다.
    pub fn plan_weekly(
        &self,
        account: &PaperAccount,
        series: &HashMap<String, PriceSeries>,
    ) -> PaperResult<WeeklyPlan> {
        self.config.validate()?;
        let symbols = self.config.all_symbols();
        for symbol in &symbols {
            if series.get(symbol).map_or(true, |s| s.is_empty()) {
                return Err(PaperError::DataError(format!(
                    "가격 데이터가 없습니다: {symbol}"
                )));
            }
        }

        let dates = aligned_dates(series, &symbols);
        let signal_date = *dates.last().ok_or_else(|| {
            PaperError::DataError("유니버스 공통 거래일이 없습니다".to_string())
        })?;
        let closes = closes_asof(series, &symbols, signal_date).ok_or_else(|| {
            PaperError::DataError(format!("신호일 종가를 만들 수 없습니다: {signal_date}"))
        })?;

        let equity_estimated = account.total_equity(series, signal_date);
        let peak = account.equity_peak.max(equity_estimated);
        let drawdown = drawdown_from_peak(equity_estimated, peak);

        // 게이트 복사본으로만 전이를 미리 본다
        let mut gate = RiskGate::from_snapshot(self.config.gate.clone(), &account.gate);
        let transition = gate.on_rebalance(drawdown);

        let decision = self.signals.evaluate(
            series,
            &self.config.equity_etfs,
            &self.config.defensive_etf,
            signal_date,
            transition.state,
            drawdown,
        );
        let winner_equity = decision.signal.selected.clone();

        let mut targets: Vec<(&String, &Decimal)> = decision.target_weights.iter().collect();
        targets.sort_by_key(|(symbol, _)| symbol.clone());

        let mut rows = Vec::with_capacity(targets.len());
        for (symbol, weight) in targets {
            let reference_price = closes
                .get(symbol)
                .copied()
                .or_else(|| series.get(symbol).and_then(|s| s.close_asof(signal_date)))
                .unwrap_or(Decimal::ZERO);
            rows.push(PlanRow {
                signal_date,
                planned_trade_date: None,
                symbol: symbol.clone(),
                target_weight: *weight,
                reference_price,
                state: transition.state,
                winner_equity: winner_equity.clone(),
                drawdown,
                equity_estimated,
            });
        }

        info!(
            %signal_date,
            state = %transition.state,
            winner = %winner_equity,
            %drawdown,
            rows = rows.len(),
            "주간 플랜 생성 완료"
        );

        Ok(WeeklyPlan {
            signal_date,
            state: transition.state,
            winner_equity,
            drawdown,
            equity_estimated,
            rows,
        })
    }
}

// ============================================================
// 테스트
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use rotor_signal::GateSnapshot;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 주말을 건너뛰며 평일 `count`개의 일봉을 만든다.
    fn weekday_series(
        symbol: &str,
        start: NaiveDate,
        count: usize,
        price_at: impl Fn(usize) -> Decimal,
    ) -> PriceSeries {
        let mut bars = Vec::with_capacity(count);
        let mut current = start;
        let mut i = 0;
        while i < count {
            if current.weekday().number_from_monday() <= 5 {
                let close = price_at(i);
                bars.push(rotor_core::DailyBar::new(
                    current,
                    close,
                    close,
                    close,
                    close,
                    dec!(1000),
                ));
                i += 1;
            }
            current = current.succ_opt().unwrap();
        }
        PriceSeries::from_bars(symbol, bars)
    }

    fn base_config(initial_capital: Decimal) -> PaperEngineConfig {
        PaperEngineConfig {
            initial_capital,
            no_trade_band: dec!(0.02),
            equity_etfs: vec!["EQ1".to_string(), "EQ2".to_string()],
            defensive_etf: "DEF".to_string(),
            signal: SignalConfig {
                momentum_lookback_days: 20,
                vol_lookback_weeks: 4,
                vol_floor: dec!(0.005),
            },
            gate: RiskGateConfig {
                derisk_drawdown: dec!(0.15),
                circuit_drawdown: dec!(0.30),
                cooldown_weeks: 4,
            },
            allocation: AllocationConfig {
                normal_equity_weight: dec!(1.0),
                derisk_equity_weight: dec!(0.5),
            },
            costs: CostConfig {
                commission_rate: Decimal::ZERO,
                min_commission: Decimal::ZERO,
                sell_tax_rate: Decimal::ZERO,
                slippage_bps: Decimal::ZERO,
            },
        }
    }

    /// 2024-01-01(월)부터 평일 15일: 1/8(월)과 1/15(월)이 리밸런스 날짜다.
    fn three_week_series() -> HashMap<String, PriceSeries> {
        let start = date(2024, 1, 1);
        let mut series = HashMap::new();
        series.insert(
            "EQ1".to_string(),
            weekday_series("EQ1", start, 15, |i| dec!(100) + Decimal::from(i as i64) * dec!(2)),
        );
        series.insert(
            "EQ2".to_string(),
            weekday_series("EQ2", start, 15, |_| dec!(50)),
        );
        series.insert(
            "DEF".to_string(),
            weekday_series("DEF", start, 15, |_| dec!(10)),
        );
        series
    }

    #[test]
    fn test_missing_symbol_fails() {
        let engine = PaperEngine::new(base_config(dec!(1000000)));
        let mut account = PaperAccount::new(dec!(1000000));
        let mut series = three_week_series();
        series.remove("DEF");

        let err = engine.run_once(&mut account, &series).unwrap_err();
        assert!(matches!(err, PaperError::DataError(_)));
    }

    #[test]
    fn test_fresh_account_first_rebalance() {
        let engine = PaperEngine::new(base_config(dec!(1000000)));
        let mut account = PaperAccount::new(dec!(1000000));
        let series = three_week_series();

        let outcome = engine.run_once(&mut account, &series).unwrap();

        assert_eq!(outcome.trade_date, date(2024, 1, 8));
        assert_eq!(outcome.signal_date, date(2024, 1, 5));
        assert_eq!(outcome.state, RiskState::Normal);
        // 전 종목 점수 불가 구간이므로 폴백 승자는 첫 번째 주식형 ETF
        assert_eq!(outcome.winner, "EQ1");

        // 1/8 종가 110: floor(1,000,000 / 110) = 9090주
        assert_eq!(account.position("EQ1"), 9090);
        assert_eq!(account.cash, dec!(1000000) - Decimal::from(9090) * dec!(110));
        assert_eq!(outcome.post_value, dec!(1000000));

        // 백필 5일 + 체결일 1일
        assert_eq!(account.history.len(), 6);
        assert_eq!(account.as_of, Some(date(2024, 1, 8)));

        assert_eq!(outcome.executed.len(), 1);
        assert_eq!(outcome.executed[0].side, TradeSide::Buy);
        assert_eq!(outcome.executed[0].shares, 9090);

        assert_eq!(outcome.blotter.len(), 1);
        assert_eq!(outcome.blotter[0].action, TradeAction::Buy);
        assert_eq!(outcome.blotter[0].target_shares, 9090);
        assert_eq!(outcome.blotter[0].delta_shares, 9090);
    }

    #[test]
    fn test_second_run_holds_inside_band() {
        // 999,900 = 9090주 × 110: 첫 매수가 현금을 정확히 소진하도록 맞춘다
        let engine = PaperEngine::new(base_config(dec!(999900)));
        let mut account = PaperAccount::new(dec!(999900));
        let series = three_week_series();

        engine.run_once(&mut account, &series).unwrap();
        assert_eq!(account.position("EQ1"), 9090);
        assert_eq!(account.cash, Decimal::ZERO);

        let outcome = engine.run_once(&mut account, &series).unwrap();

        assert_eq!(outcome.trade_date, date(2024, 1, 15));
        assert_eq!(outcome.signal_date, date(2024, 1, 12));

        // 승자 유지 중이고 보유 비중이 목표와 같으므로 체결 없음
        assert!(outcome.executed.is_empty());
        assert!(outcome
            .blotter
            .iter()
            .all(|row| row.action == TradeAction::Hold));
        assert_eq!(account.cash, Decimal::ZERO);
        assert_eq!(account.position("EQ1"), 9090);
    }

    #[test]
    fn test_up_to_date_error_when_no_pending_rebalance() {
        let engine = PaperEngine::new(base_config(dec!(1000000)));
        let mut account = PaperAccount::new(dec!(1000000));
        let series = three_week_series();

        engine.run_once(&mut account, &series).unwrap();
        engine.run_once(&mut account, &series).unwrap();

        let err = engine.run_once(&mut account, &series).unwrap_err();
        match err {
            PaperError::UpToDate(as_of) => assert_eq!(as_of, date(2024, 1, 15)),
            other => panic!("UpToDate가 아닌 에러: {other}"),
        }
    }

    #[test]
    fn test_sells_execute_before_buys() {
        let engine = PaperEngine::new(base_config(dec!(100000)));
        let mut account = PaperAccount::new(dec!(100000));
        account.positions.insert("EQ2".to_string(), 1000);
        account.as_of = Some(date(2024, 1, 8));
        let series = three_week_series();

        let outcome = engine.run_once(&mut account, &series).unwrap();

        assert_eq!(outcome.trade_date, date(2024, 1, 15));

        // EQ2 전량 매도 후 EQ1 매수
        assert_eq!(outcome.executed.len(), 2);
        assert_eq!(outcome.executed[0].side, TradeSide::Sell);
        assert_eq!(outcome.executed[0].symbol, "EQ2");
        assert_eq!(outcome.executed[0].shares, 1000);
        assert_eq!(outcome.executed[1].side, TradeSide::Buy);
        assert_eq!(outcome.executed[1].symbol, "EQ1");

        // 1/15 종가: EQ2 50 → 현금 100,000 + 50,000 = 150,000, EQ1 120 → 1250주
        assert_eq!(account.position("EQ1"), 1250);
        assert_eq!(account.position("EQ2"), 0);
        assert!(!account.positions.contains_key("EQ2"));
        assert_eq!(account.cash, Decimal::ZERO);

        // 블로터에는 매도/매수 두 행이 심볼 순으로 남는다
        assert_eq!(outcome.blotter.len(), 2);
        assert_eq!(outcome.blotter[0].symbol, "EQ1");
        assert_eq!(outcome.blotter[0].action, TradeAction::Buy);
        assert_eq!(outcome.blotter[1].symbol, "EQ2");
        assert_eq!(outcome.blotter[1].action, TradeAction::Sell);
        assert_eq!(outcome.blotter[1].delta_shares, -1000);
        assert_eq!(outcome.blotter[1].target_shares, 0);
    }

    #[test]
    fn test_buy_skipped_when_cash_cannot_afford_one_share() {
        // 현금 50으로는 체결일 종가 110짜리 1주도 못 산다
        let engine = PaperEngine::new(base_config(dec!(50)));
        let mut account = PaperAccount::new(dec!(50));
        let series = three_week_series();

        let outcome = engine.run_once(&mut account, &series).unwrap();

        assert!(outcome.executed.is_empty());
        assert!(account.positions.is_empty());
        assert_eq!(account.cash, dec!(50));
        assert_eq!(outcome.blotter.len(), 1);
        assert_eq!(outcome.blotter[0].action, TradeAction::Hold);
        assert_eq!(outcome.blotter[0].estimated_cost, Decimal::ZERO);
    }

    #[test]
    fn test_buy_shares_reduced_until_affordable() {
        let mut config = base_config(dec!(1000000));
        config.costs.commission_rate = dec!(0.001);
        let engine = PaperEngine::new(config);
        let mut account = PaperAccount::new(dec!(1000000));
        let series = three_week_series();

        engine.run_once(&mut account, &series).unwrap();

        // 1/8 종가 110: floor(1,000,000/110) = 9090주는 수수료 포함 1,000,899.90원이라
        // 불가능하고, 9081주(998,910원 + 수수료 998.91원)가 가능한 최대치다
        assert_eq!(account.position("EQ1"), 9081);
        let buy_value = Decimal::from(9081) * dec!(110);
        let cost = buy_value * dec!(0.001);
        assert_eq!(account.cash, dec!(1000000) - buy_value - cost);
        assert_eq!(account.trades.len(), 1);
        assert_eq!(account.trades[0].cost, cost);
    }

    #[test]
    fn test_circuit_cooldown_moves_account_to_defensive() {
        let engine = PaperEngine::new(base_config(dec!(1000000)));
        let mut account = PaperAccount::new(dec!(1000000));
        account.gate = GateSnapshot {
            state: RiskState::CircuitCooldown,
            cooldown_left: 2,
        };
        let series = three_week_series();

        let outcome = engine.run_once(&mut account, &series).unwrap();

        // 쿨다운이 남아 있으므로 낙폭과 무관하게 서킷 유지, 카운터는 감소
        assert_eq!(outcome.state, RiskState::CircuitCooldown);
        assert_eq!(account.gate.cooldown_left, 1);

        // 방어 자산 100%: 1/8 종가 10 → 100,000주
        assert_eq!(account.position("DEF"), 100000);
        assert_eq!(account.position("EQ1"), 0);
        assert_eq!(account.cash, Decimal::ZERO);
        assert!(outcome
            .blotter
            .iter()
            .all(|row| row.state == RiskState::CircuitCooldown));
    }

    #[test]
    fn test_plan_weekly_does_not_mutate_account() {
        let engine = PaperEngine::new(base_config(dec!(1000000)));
        let mut account = PaperAccount::new(dec!(1000000));
        let series = three_week_series();
        engine.run_once(&mut account, &series).unwrap();

        let as_of_before = account.as_of;
        let cash_before = account.cash;
        let gate_before = account.gate;
        let history_len_before = account.history.len();

        let plan = engine.plan_weekly(&account, &series).unwrap();

        // 신호일은 데이터 마지막 거래일
        assert_eq!(plan.signal_date, date(2024, 1, 19));
        assert_eq!(plan.state, RiskState::Normal);
        assert_eq!(plan.winner_equity, "EQ1");
        assert_eq!(plan.rows.len(), 1);
        assert_eq!(plan.rows[0].symbol, "EQ1");
        assert_eq!(plan.rows[0].target_weight, dec!(1.0));
        assert!(plan.rows[0].planned_trade_date.is_none());
        // 1/19 종가 128로 평가한 계좌 가치
        let expected_equity = account.cash + Decimal::from(9090) * dec!(128);
        assert_eq!(plan.equity_estimated, expected_equity);

        assert_eq!(account.as_of, as_of_before);
        assert_eq!(account.cash, cash_before);
        assert_eq!(account.gate, gate_before);
        assert_eq!(account.history.len(), history_len_before);
    }
}
