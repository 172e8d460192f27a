//! 정밀한 금융 계산을 위한 Decimal 유틸리티.

use rust_decimal::Decimal;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 포트폴리오 비중 타입 (0.5 = 50%).
pub type Weight = Decimal;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 퍼센트 문자열로 변환합니다 (예: "5.25%").
    fn to_percentage_string(&self) -> String;

    /// 지정된 소수점 자릿수로 반올림합니다.
    fn round_dp(&self, dp: u32) -> Decimal;
}

impl DecimalExt for Decimal {
    fn to_percentage_string(&self) -> String {
        let pct = *self * Decimal::from(100);
        format!("{:.2}%", pct)
    }

    fn round_dp(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percentage_string() {
        assert_eq!(dec!(0.0525).to_percentage_string(), "5.25%");
        assert_eq!(dec!(-0.30).to_percentage_string(), "-30.00%");
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(DecimalExt::round_dp(&dec!(1.23456), 2), dec!(1.23));
        assert_eq!(DecimalExt::round_dp(&dec!(1.235), 2), dec!(1.24));
    }
}
