//! 게이트 상태별 목표 비중과 노트레이드 밴드.

use std::collections::{BTreeSet, HashMap};

use rotor_core::config::AllocationConfig;
use rotor_core::domain::{RiskState, ScoreBoard};
use rotor_core::types::Weight;
use rust_decimal::Decimal;
use tracing::debug;

/// 랭킹 1위 심볼을 선택합니다.
///
/// 1위 자산이 점수 계산 불가이거나 랭킹이 비어 있으면 폴백 심볼
/// (설정의 첫 번째 주식형 ETF)을 반환합니다.
pub fn pick_winner(board: &ScoreBoard, fallback: &str) -> String {
    match board.best() {
        Some(best) => best.symbol.clone(),
        None => {
            debug!(fallback, "점수 계산 가능한 자산이 없어 폴백 선택");
            fallback.to_string()
        }
    }
}

/// 게이트 상태에 따른 목표 비중을 계산합니다.
///
/// - `NORMAL`: 승자 ETF에 `normal_equity_weight`
/// - `DE_RISK`: 승자에 `derisk_equity_weight`, 잔여분은 방어 자산
/// - `CIRCUIT_COOLDOWN`: 방어 자산 100%
///
/// 반환 맵에는 양수 비중만 들어갑니다.
pub fn target_weights(
    state: RiskState,
    winner: &str,
    defensive: &str,
    allocation: &AllocationConfig,
) -> HashMap<String, Weight> {
    let mut weights = HashMap::new();

    match state {
        RiskState::CircuitCooldown => {
            weights.insert(defensive.to_string(), Decimal::ONE);
        }
        RiskState::DeRisk => {
            let equity = allocation.derisk_equity_weight;
            if equity > Decimal::ZERO {
                weights.insert(winner.to_string(), equity);
            }
            let rest = Decimal::ONE - equity;
            if rest > Decimal::ZERO {
                *weights.entry(defensive.to_string()).or_insert(Decimal::ZERO) += rest;
            }
        }
        RiskState::Normal => {
            let equity = allocation.normal_equity_weight;
            if equity > Decimal::ZERO {
                weights.insert(winner.to_string(), equity);
            }
        }
    }

    weights
}

/// 노트레이드 밴드를 적용한 유효 비중을 계산합니다.
///
/// 목표와 현재 비중 키의 합집합을 순회하며, 비중 차이가 `band` 미만인
/// 심볼은 현재 비중을 그대로 유지합니다. 보유 중이지만 목표에 없는
/// 심볼도 같은 규칙을 따르므로 밴드 이내의 잔여 포지션은 매도하지
/// 않습니다. 유효 비중이 0인 심볼은 결과에서 제외됩니다.
pub fn apply_no_trade_band(
    targets: &HashMap<String, Weight>,
    current: &HashMap<String, Weight>,
    band: Decimal,
) -> HashMap<String, Weight> {
    let symbols: BTreeSet<&String> = targets.keys().chain(current.keys()).collect();

    let mut effective = HashMap::new();
    for symbol in symbols {
        let target = targets.get(symbol).copied().unwrap_or(Decimal::ZERO);
        let held = current.get(symbol).copied().unwrap_or(Decimal::ZERO);
        let chosen = if (target - held).abs() < band {
            held
        } else {
            target
        };
        if chosen > Decimal::ZERO {
            effective.insert(symbol.clone(), chosen);
        }
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotor_core::domain::AssetScore;
    use rust_decimal_macros::dec;

    fn score(symbol: &str, s: Decimal) -> AssetScore {
        AssetScore {
            symbol: symbol.to_string(),
            momentum: Some(dec!(0.1)),
            volatility: Some(dec!(0.02)),
            score: Some(s),
        }
    }

    fn allocation() -> AllocationConfig {
        AllocationConfig {
            normal_equity_weight: dec!(1.0),
            derisk_equity_weight: dec!(0.5),
        }
    }

    #[test]
    fn test_pick_winner_top_scorer() {
        let board = ScoreBoard::from_scores(vec![score("A", dec!(1)), score("B", dec!(2))]);
        assert_eq!(pick_winner(&board, "FALLBACK"), "B");
    }

    #[test]
    fn test_pick_winner_fallback_when_unscorable() {
        let board = ScoreBoard::from_scores(vec![
            AssetScore::unscorable("A"),
            AssetScore::unscorable("B"),
        ]);
        assert_eq!(pick_winner(&board, "FALLBACK"), "FALLBACK");
    }

    #[test]
    fn test_pick_winner_fallback_when_empty() {
        let board = ScoreBoard::from_scores(vec![]);
        assert_eq!(pick_winner(&board, "FALLBACK"), "FALLBACK");
    }

    #[test]
    fn test_target_weights_normal() {
        let w = target_weights(RiskState::Normal, "EQ", "DEF", &allocation());
        assert_eq!(w.len(), 1);
        assert_eq!(w["EQ"], dec!(1.0));
    }

    #[test]
    fn test_target_weights_derisk_splits() {
        let w = target_weights(RiskState::DeRisk, "EQ", "DEF", &allocation());
        assert_eq!(w.len(), 2);
        assert_eq!(w["EQ"], dec!(0.5));
        assert_eq!(w["DEF"], dec!(0.5));
    }

    #[test]
    fn test_target_weights_cooldown_defensive_only() {
        let w = target_weights(RiskState::CircuitCooldown, "EQ", "DEF", &allocation());
        assert_eq!(w.len(), 1);
        assert_eq!(w["DEF"], dec!(1.0));
    }

    #[test]
    fn test_target_weights_derisk_full_equity() {
        let alloc = AllocationConfig {
            normal_equity_weight: dec!(1.0),
            derisk_equity_weight: dec!(1.0),
        };
        // 잔여분이 0이면 방어 자산 항목은 생기지 않음
        let w = target_weights(RiskState::DeRisk, "EQ", "DEF", &alloc);
        assert_eq!(w.len(), 1);
        assert_eq!(w["EQ"], dec!(1.0));
    }

    #[test]
    fn test_band_keeps_current_below_threshold() {
        let targets = HashMap::from([("A".to_string(), dec!(0.51))]);
        let current = HashMap::from([("A".to_string(), dec!(0.50))]);

        let effective = apply_no_trade_band(&targets, &current, dec!(0.02));
        assert_eq!(effective["A"], dec!(0.50));
    }

    #[test]
    fn test_band_takes_target_at_threshold() {
        let targets = HashMap::from([("A".to_string(), dec!(0.52))]);
        let current = HashMap::from([("A".to_string(), dec!(0.50))]);

        // 차이가 정확히 밴드와 같으면 거래
        let effective = apply_no_trade_band(&targets, &current, dec!(0.02));
        assert_eq!(effective["A"], dec!(0.52));
    }

    #[test]
    fn test_band_keeps_small_residual_position() {
        // 목표에 없는 보유 자산도 밴드 이내면 유지
        let targets = HashMap::from([("B".to_string(), dec!(1.0))]);
        let current = HashMap::from([
            ("A".to_string(), dec!(0.01)),
            ("B".to_string(), dec!(0.99)),
        ]);

        let effective = apply_no_trade_band(&targets, &current, dec!(0.02));
        assert_eq!(effective["A"], dec!(0.01));
        assert_eq!(effective["B"], dec!(0.99));
    }

    #[test]
    fn test_band_sells_out_above_threshold() {
        let targets = HashMap::from([("B".to_string(), dec!(1.0))]);
        let current = HashMap::from([("A".to_string(), dec!(1.0))]);

        let effective = apply_no_trade_band(&targets, &current, dec!(0.02));
        // A는 전량 매도되어 결과에서 빠짐
        assert!(!effective.contains_key("A"));
        assert_eq!(effective["B"], dec!(1.0));
    }

    #[test]
    fn test_band_zero_always_trades() {
        let targets = HashMap::from([("A".to_string(), dec!(0.5001))]);
        let current = HashMap::from([("A".to_string(), dec!(0.5))]);

        let effective = apply_no_trade_band(&targets, &current, Decimal::ZERO);
        assert_eq!(effective["A"], dec!(0.5001));
    }
}
