//! 거래 비용 추정 모델.
//!
//! 한 번의 체결(leg)에 대해 수수료 + 매도세 + 슬리피지를 추정합니다.
//! 실제 체결가를 모르는 시뮬레이션 환경이므로 모든 값은 추정치입니다.

use rotor_core::config::CostConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 체결 한 건의 약정 금액.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeLeg {
    /// 총 약정 금액 (매수+매도 모두 포함)
    pub trade_value: Decimal,
    /// 그중 매도 금액 (매도세 과세 대상)
    pub sell_value: Decimal,
}

impl TradeLeg {
    /// 매수 체결.
    pub fn buy(value: Decimal) -> Self {
        Self {
            trade_value: value,
            sell_value: Decimal::ZERO,
        }
    }

    /// 매도 체결.
    pub fn sell(value: Decimal) -> Self {
        Self {
            trade_value: value,
            sell_value: value,
        }
    }
}

/// 수수료/세금/슬리피지 비용 모델.
#[derive(Debug, Clone)]
pub struct CostModel {
    config: CostConfig,
}

impl CostModel {
    pub fn new(config: CostConfig) -> Self {
        Self { config }
    }

    /// 체결 한 건의 추정 비용.
    ///
    /// 약정 금액이 0 이하면 최소 수수료도 부과하지 않습니다.
    pub fn leg_cost(&self, leg: &TradeLeg) -> Decimal {
        if leg.trade_value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let commission =
            (leg.trade_value * self.config.commission_rate).max(self.config.min_commission);
        let tax = leg.sell_value * self.config.sell_tax_rate;
        let slippage = leg.trade_value * self.config.slippage_bps / dec!(10000);
        commission + tax + slippage
    }

    /// 여러 체결의 추정 비용 합계.
    pub fn estimate(&self, legs: &[TradeLeg]) -> Decimal {
        legs.iter().map(|leg| self.leg_cost(leg)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> CostModel {
        CostModel::new(CostConfig {
            commission_rate: dec!(0.00015),
            min_commission: dec!(100),
            sell_tax_rate: dec!(0.0023),
            slippage_bps: dec!(5),
        })
    }

    #[test]
    fn test_buy_leg_cost() {
        let m = model();
        // 약정 1,000,000: 수수료 150, 세금 0, 슬리피지 500
        let cost = m.leg_cost(&TradeLeg::buy(dec!(1_000_000)));
        assert_eq!(cost, dec!(650));
    }

    #[test]
    fn test_sell_leg_includes_tax() {
        let m = model();
        // 매도 1,000,000: 수수료 150 + 세금 2300 + 슬리피지 500
        let cost = m.leg_cost(&TradeLeg::sell(dec!(1_000_000)));
        assert_eq!(cost, dec!(2950));
    }

    #[test]
    fn test_min_commission_floor() {
        let m = model();
        // 약정 10,000의 수수료 1.5는 최소 수수료 100으로 대체
        let cost = m.leg_cost(&TradeLeg::buy(dec!(10_000)));
        assert_eq!(cost, dec!(100) + dec!(5));
    }

    #[test]
    fn test_zero_value_costs_nothing() {
        let m = model();
        assert_eq!(m.leg_cost(&TradeLeg::buy(Decimal::ZERO)), Decimal::ZERO);
        assert_eq!(m.leg_cost(&TradeLeg::sell(dec!(-100))), Decimal::ZERO);
    }

    #[test]
    fn test_estimate_sums_legs() {
        let m = model();
        let legs = [
            TradeLeg::sell(dec!(1_000_000)),
            TradeLeg::buy(dec!(1_000_000)),
        ];
        assert_eq!(m.estimate(&legs), dec!(3600));
    }

    #[test]
    fn test_zero_cost_config() {
        let m = CostModel::new(CostConfig {
            commission_rate: Decimal::ZERO,
            min_commission: Decimal::ZERO,
            sell_tax_rate: Decimal::ZERO,
            slippage_bps: Decimal::ZERO,
        });
        assert_eq!(m.leg_cost(&TradeLeg::sell(dec!(1_000_000))), Decimal::ZERO);
    }
}
