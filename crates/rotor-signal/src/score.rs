//! 모멘텀/변동성 점수 계산.
//!
//! `score = momentum / volatility`
//! - momentum: 과거 N 거래일 종가 수익률
//! - volatility: 최근 M개 주간(W-FRI) 수익률의 표본 표준편차 (하한 적용)
//!
//! 이력이 부족한 자산은 점수 없이 랭킹 맨 뒤로 밀리고, 1위가 점수 없는
//! 자산이면 선택은 설정된 폴백 심볼로 넘어갑니다.

use chrono::NaiveDate;
use rotor_core::config::SignalConfig;
use rotor_core::domain::{AssetScore, PriceSeries, ScoreBoard};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::debug;

/// 유니버스 전체의 점수를 계산해 랭킹을 만듭니다.
pub fn score_universe(
    series: &HashMap<String, PriceSeries>,
    symbols: &[String],
    signal_date: NaiveDate,
    config: &SignalConfig,
) -> ScoreBoard {
    let scores = symbols
        .iter()
        .map(|symbol| compute_asset_score(series.get(symbol), symbol, signal_date, config))
        .collect();
    ScoreBoard::from_scores(scores)
}

/// 자산 하나의 점수를 계산합니다.
///
/// 모멘텀에는 N+1개의 종가, 변동성에는 M개의 주간 수익률이 필요하며
/// 부족하면 점수 없는 `AssetScore`를 반환합니다.
pub fn compute_asset_score(
    series: Option<&PriceSeries>,
    symbol: &str,
    signal_date: NaiveDate,
    config: &SignalConfig,
) -> AssetScore {
    let series = match series {
        Some(s) => s,
        None => {
            debug!(symbol, "시계열 없음, 점수 제외");
            return AssetScore::unscorable(symbol);
        }
    };

    // 모멘텀: close(D) / close(D - N거래일) - 1
    let bars = series.bars_through(signal_date);
    let needed = config.momentum_lookback_days + 1;
    if bars.len() < needed {
        debug!(symbol, have = bars.len(), needed, "종가 부족, 점수 제외");
        return AssetScore::unscorable(symbol);
    }
    let last = bars[bars.len() - 1].close;
    let past = bars[bars.len() - needed].close;
    if past <= Decimal::ZERO {
        return AssetScore::unscorable(symbol);
    }
    let momentum = last / past - Decimal::ONE;

    // 변동성: 주간 수익률 표본 표준편차, 하한 적용
    let volatility = match weekly_return_std(series, signal_date, config.vol_lookback_weeks) {
        Some(vol) => vol.max(config.vol_floor),
        None => {
            debug!(symbol, "주간 수익률 부족, 점수 제외");
            return AssetScore::unscorable(symbol);
        }
    };

    let score = momentum / volatility;
    debug!(symbol, %momentum, %volatility, %score, "점수 계산");
    AssetScore {
        symbol: symbol.to_string(),
        momentum: Some(momentum),
        volatility: Some(volatility),
        score: Some(score),
    }
}

/// 최근 `weeks`개 주간 수익률의 표본 표준편차를 계산합니다.
///
/// 주간 수익률이 `weeks`개 미만이면 `None`. `weeks`는 2 이상이어야
/// 합니다 (설정 검증에서 보장).
pub fn weekly_return_std(
    series: &PriceSeries,
    through: NaiveDate,
    weeks: usize,
) -> Option<Decimal> {
    if weeks < 2 {
        return None;
    }

    let weekly = series.weekly_closes(through);
    let mut returns: Vec<Decimal> = Vec::with_capacity(weekly.len().saturating_sub(1));
    for pair in weekly.windows(2) {
        let (prev, cur) = (pair[0].1, pair[1].1);
        if prev <= Decimal::ZERO {
            return None;
        }
        returns.push(cur / prev - Decimal::ONE);
    }
    if returns.len() < weeks {
        return None;
    }

    let tail = &returns[returns.len() - weeks..];
    let n = Decimal::from(weeks);
    let mean: Decimal = tail.iter().copied().sum::<Decimal>() / n;
    let variance: Decimal = tail
        .iter()
        .map(|r| {
            let diff = *r - mean;
            diff * diff
        })
        .sum::<Decimal>()
        / (n - Decimal::ONE);

    Some(sqrt_approx(variance))
}

/// 제곱근 근사 (Newton-Raphson).
fn sqrt_approx(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut guess = x / dec!(2) + dec!(0.5);
    let epsilon = dec!(0.0000000001);
    for _ in 0..32 {
        let next = (guess + x / guess) / dec!(2);
        if (next - guess).abs() < epsilon {
            return next;
        }
        guess = next;
    }
    guess
}
