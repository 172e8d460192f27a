//! 포트폴리오 순자산 곡선 도메인 모델.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 일자별 순자산 한 점.
///
/// 백테스트 순자산 곡선과 페이퍼 계좌 히스토리가 공유하는 레코드입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// 평가 일자
    pub date: NaiveDate,
    /// 순자산 (현금 + 보유 평가액)
    pub equity: Decimal,
}

impl EquityPoint {
    pub fn new(date: NaiveDate, equity: Decimal) -> Self {
        Self { date, equity }
    }
}

/// 고점 대비 낙폭을 계산합니다.
///
/// 낙폭은 `1 - value / peak`로 정의되며 항상 0 이상입니다.
/// 고점이 0 이하이면 0을 반환합니다.
pub fn drawdown_from_peak(value: Decimal, peak: Decimal) -> Decimal {
    if peak > Decimal::ZERO {
        Decimal::ONE - value / peak
    } else {
        Decimal::ZERO
    }
}
