//! 리스크 게이트와 비중 계산의 속성 기반 테스트.
//!
//! 임의 입력에서도 깨지면 안 되는 불변식만 검증합니다:
//! - 서킷 임계값 이상 낙폭은 반드시 쿨다운 진입
//! - 쿨다운 잔여 기간에는 낙폭과 무관하게 위험 자산 노출 금지
//! - 밴드 미만 비중 차이는 거래를 만들지 않음
//! - 목표 비중은 위험 자산 1개 + 방어 자산 1개 이하, 합은 1 이하

use std::collections::HashMap;

use proptest::prelude::*;
use rotor_core::config::{AllocationConfig, RiskGateConfig};
use rotor_core::domain::RiskState;
use rotor_signal::{apply_no_trade_band, target_weights, RiskGate};
use rust_decimal::Decimal;

// ============================================================================
// 생성기
// ============================================================================

/// [0, 1) 범위의 소수점 4자리 낙폭.
fn arb_drawdown() -> impl Strategy<Value = Decimal> {
    (0i64..10_000).prop_map(|n| Decimal::new(n, 4))
}

/// [0, 1] 범위의 소수점 4자리 비중.
fn arb_weight() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|n| Decimal::new(n, 4))
}

/// 유효한 게이트 설정 (0 < derisk < circuit).
fn arb_gate_config() -> impl Strategy<Value = RiskGateConfig> {
    (1i64..4_000, 1i64..4_000, 1u32..=8).prop_map(|(derisk, gap, weeks)| RiskGateConfig {
        derisk_drawdown: Decimal::new(derisk, 4),
        circuit_drawdown: Decimal::new(derisk + gap, 4),
        cooldown_weeks: weeks,
    })
}

/// 고정 심볼 4개 위의 임의 비중 맵.
fn arb_weight_map() -> impl Strategy<Value = HashMap<String, Decimal>> {
    proptest::collection::vec((0usize..4, arb_weight()), 0..4).prop_map(|entries| {
        let symbols = ["A", "B", "C", "D"];
        let mut map = HashMap::new();
        for (idx, weight) in entries {
            if weight > Decimal::ZERO {
                map.insert(symbols[idx].to_string(), weight);
            }
        }
        map
    })
}

// ============================================================================
// 게이트 속성
// ============================================================================

mod gate_properties {
    use super::*;

    proptest! {
        /// 신규 게이트에서 서킷 임계값 이상 낙폭은 반드시 쿨다운 진입.
        #[test]
        fn circuit_drawdown_always_enters_cooldown(
            config in arb_gate_config(),
            extra in 0i64..5_000,
        ) {
            let drawdown = config.circuit_drawdown + Decimal::new(extra, 4);
            let mut gate = RiskGate::new(config);

            let t = gate.on_rebalance(drawdown);
            prop_assert_eq!(t.state, RiskState::CircuitCooldown);
            prop_assert!(t.changed);
        }

        /// 쿨다운 잔여 기간에는 낙폭과 무관하게 위험 노출 금지.
        #[test]
        fn cooldown_blocks_risk_until_expiry(
            config in arb_gate_config(),
            drawdowns in proptest::collection::vec(arb_drawdown(), 1..8),
        ) {
            let weeks = config.cooldown_weeks;
            let circuit = config.circuit_drawdown;
            let mut gate = RiskGate::new(config);
            gate.on_rebalance(circuit);
            prop_assert_eq!(gate.state(), RiskState::CircuitCooldown);

            // 진입 주가 1회차이므로 잔여는 weeks - 1회
            for step in 1..weeks {
                let dd = drawdowns[(step as usize) % drawdowns.len()];
                let t = gate.on_rebalance(dd);
                prop_assert_eq!(t.state, RiskState::CircuitCooldown);
                prop_assert!(!t.state.allows_risk_exposure());
                prop_assert!(!t.changed);
            }
            prop_assert_eq!(gate.cooldown_left(), 0);
        }

        /// 잔여 카운터는 cooldown_weeks - 1을 넘지 않는다.
        #[test]
        fn cooldown_counter_bounded(
            config in arb_gate_config(),
            drawdowns in proptest::collection::vec(arb_drawdown(), 1..30),
        ) {
            let bound = config.cooldown_weeks.saturating_sub(1);
            let mut gate = RiskGate::new(config);
            for dd in drawdowns {
                gate.on_rebalance(dd);
                prop_assert!(gate.cooldown_left() <= bound);
            }
        }

        /// 낙폭이 회복되면 쿨다운 만료 후 반드시 NORMAL 복귀.
        #[test]
        fn gate_recovers_after_cooldown(config in arb_gate_config()) {
            let weeks = config.cooldown_weeks;
            let circuit = config.circuit_drawdown;
            let mut gate = RiskGate::new(config);
            gate.on_rebalance(circuit);
            for _ in 1..weeks {
                gate.on_rebalance(Decimal::ZERO);
            }

            let t = gate.on_rebalance(Decimal::ZERO);
            prop_assert_eq!(t.state, RiskState::Normal);
        }
    }
}

// ============================================================================
// 목표 비중 속성
// ============================================================================

mod weight_properties {
    use super::*;

    fn arb_allocation() -> impl Strategy<Value = AllocationConfig> {
        (arb_weight(), arb_weight()).prop_map(|(a, b)| {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            AllocationConfig {
                normal_equity_weight: hi,
                derisk_equity_weight: lo,
            }
        })
    }

    fn arb_state() -> impl Strategy<Value = RiskState> {
        prop_oneof![
            Just(RiskState::Normal),
            Just(RiskState::DeRisk),
            Just(RiskState::CircuitCooldown),
        ]
    }

    proptest! {
        /// 목표 비중: 항목 2개 이하, 전부 양수, 합은 1 이하.
        #[test]
        fn weights_bounded_and_positive(state in arb_state(), alloc in arb_allocation()) {
            let weights = target_weights(state, "EQ", "DEF", &alloc);

            prop_assert!(weights.len() <= 2);
            let total: Decimal = weights.values().copied().sum();
            prop_assert!(total <= Decimal::ONE);
            for w in weights.values() {
                prop_assert!(*w > Decimal::ZERO);
            }
        }

        /// 쿨다운에서는 위험 자산 항목이 없다.
        #[test]
        fn cooldown_weights_are_defensive_only(alloc in arb_allocation()) {
            let weights = target_weights(RiskState::CircuitCooldown, "EQ", "DEF", &alloc);

            prop_assert!(!weights.contains_key("EQ"));
            prop_assert_eq!(weights.get("DEF").copied(), Some(Decimal::ONE));
        }
    }
}

// ============================================================================
// 노트레이드 밴드 속성
// ============================================================================

mod band_properties {
    use super::*;

    proptest! {
        /// 밴드 미만 차이는 현재 비중 유지, 이상이면 목표 비중 채택.
        #[test]
        fn band_decision_per_symbol(
            targets in arb_weight_map(),
            current in arb_weight_map(),
            band_raw in 0i64..2_000,
        ) {
            let band = Decimal::new(band_raw, 4);
            let effective = apply_no_trade_band(&targets, &current, band);

            for symbol in targets.keys().chain(current.keys()) {
                let t = targets.get(symbol).copied().unwrap_or(Decimal::ZERO);
                let c = current.get(symbol).copied().unwrap_or(Decimal::ZERO);
                let e = effective.get(symbol).copied().unwrap_or(Decimal::ZERO);
                if (t - c).abs() < band {
                    prop_assert_eq!(e, c);
                } else {
                    prop_assert_eq!(e, t);
                }
            }

            // 유효 비중 맵에는 양수 항목만 남는다
            for w in effective.values() {
                prop_assert!(*w > Decimal::ZERO);
            }
        }
    }
}
