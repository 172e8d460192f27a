//! 드로다운 기반 리스크 게이트.
//!
//! 신호 기준일의 낙폭으로 상태를 결정합니다:
//! - 낙폭 >= 서킷 임계값: `CIRCUIT_COOLDOWN` (쿨다운 시작)
//! - 낙폭 >= 디리스크 임계값: `DE_RISK`
//! - 그 외: `NORMAL`
//!
//! 쿨다운은 주간 리밸런스 횟수 단위로 감소합니다. 진입한 주를 포함해
//! 총 `cooldown_weeks`번의 리밸런스 동안 방어 상태를 유지하고, 카운터가
//! 소진된 다음 리밸런스부터 낙폭을 다시 평가합니다.

use rotor_core::config::RiskGateConfig;
use rotor_core::domain::RiskState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// 게이트의 영속 가능한 상태 스냅샷.
///
/// 페이퍼 계좌 JSON에 저장되어 실행 간 쿨다운을 이어갑니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GateSnapshot {
    /// 현재 상태
    pub state: RiskState,
    /// 남은 쿨다운 리밸런스 횟수
    pub cooldown_left: u32,
}

/// `on_rebalance` 한 번의 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTransition {
    /// 이전 상태
    pub previous: RiskState,
    /// 새 상태
    pub state: RiskState,
    /// 상태가 바뀌었는지
    pub changed: bool,
    /// 남은 쿨다운 리밸런스 횟수
    pub cooldown_left: u32,
}

/// 드로다운 리스크 게이트.
#[derive(Debug, Clone)]
pub struct RiskGate {
    config: RiskGateConfig,
    state: RiskState,
    cooldown_left: u32,
}

impl RiskGate {
    /// NORMAL 상태로 게이트를 생성합니다.
    pub fn new(config: RiskGateConfig) -> Self {
        Self {
            config,
            state: RiskState::Normal,
            cooldown_left: 0,
        }
    }

    /// 저장된 스냅샷에서 게이트를 복원합니다.
    pub fn from_snapshot(config: RiskGateConfig, snapshot: &GateSnapshot) -> Self {
        Self {
            config,
            state: snapshot.state,
            cooldown_left: snapshot.cooldown_left,
        }
    }

    /// 현재 상태의 스냅샷을 반환합니다.
    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            state: self.state,
            cooldown_left: self.cooldown_left,
        }
    }

    /// 현재 상태.
    pub fn state(&self) -> RiskState {
        self.state
    }

    /// 남은 쿨다운 리밸런스 횟수.
    pub fn cooldown_left(&self) -> u32 {
        self.cooldown_left
    }

    /// 현재 낙폭이 만들 다음 상태를 계산합니다 (게이트는 변경하지 않음).
    pub fn next_state(&self, drawdown: Decimal) -> RiskState {
        if self.state == RiskState::CircuitCooldown && self.cooldown_left > 0 {
            return RiskState::CircuitCooldown;
        }
        // 쿨다운 소진 후에는 현재 낙폭으로 재평가
        if drawdown >= self.config.circuit_drawdown {
            RiskState::CircuitCooldown
        } else if drawdown >= self.config.derisk_drawdown {
            RiskState::DeRisk
        } else {
            RiskState::Normal
        }
    }

    /// 리밸런스 신호 시점마다 호출해 상태를 갱신합니다.
    ///
    /// 서킷에 새로 진입한 주를 1회차로 세므로 카운터는
    /// `cooldown_weeks - 1`로 시작합니다.
    pub fn on_rebalance(&mut self, drawdown: Decimal) -> GateTransition {
        let previous = self.state;
        let next = self.next_state(drawdown);

        if next == RiskState::CircuitCooldown && previous != RiskState::CircuitCooldown {
            self.cooldown_left = self.config.cooldown_weeks.saturating_sub(1);
            self.state = RiskState::CircuitCooldown;
            info!(
                %drawdown,
                cooldown_left = self.cooldown_left,
                "서킷 쿨다운 진입"
            );
            return GateTransition {
                previous,
                state: self.state,
                changed: true,
                cooldown_left: self.cooldown_left,
            };
        }

        if previous == RiskState::CircuitCooldown && self.cooldown_left > 0 {
            self.cooldown_left -= 1;
            self.state = RiskState::CircuitCooldown;
            return GateTransition {
                previous,
                state: self.state,
                changed: false,
                cooldown_left: self.cooldown_left,
            };
        }

        self.state = next;
        GateTransition {
            previous,
            state: self.state,
            changed: next != previous,
            cooldown_left: self.cooldown_left,
        }
    }
}
