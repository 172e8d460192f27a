//! 주간 리밸런스 달력 유틸리티.
//!
//! 거래일 시퀀스를 금요일 마감 기준의 주(W-FRI)로 묶습니다.
//! 같은 앵커(해당 주의 금요일)를 가진 날짜는 같은 주에 속하며,
//! 리밸런스는 앵커가 바뀐 첫 거래일에 실행됩니다.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// 날짜가 속한 주의 앵커(그 주 금요일)를 반환합니다.
///
/// 토/일요일은 다음 금요일로 앵커됩니다.
pub fn week_anchor(date: NaiveDate) -> NaiveDate {
    let days_ahead = (Weekday::Fri.num_days_from_monday() + 7
        - date.weekday().num_days_from_monday())
        % 7;
    date + Duration::days(days_ahead as i64)
}

/// 두 날짜가 서로 다른 주에 속하는지 확인합니다.
pub fn starts_new_week(prev: NaiveDate, cur: NaiveDate) -> bool {
    week_anchor(prev) != week_anchor(cur)
}

/// 정렬된 거래일 시퀀스에서 리밸런스 날짜의 인덱스를 반환합니다.
///
/// 직전 거래일과 다른 주에 속하는 첫 거래일이 리밸런스 날짜입니다.
/// 첫 번째 날짜는 직전 주가 없으므로 절대 포함되지 않습니다.
pub fn rebalance_indices(dates: &[NaiveDate]) -> Vec<usize> {
    dates
        .windows(2)
        .enumerate()
        .filter(|(_, w)| starts_new_week(w[0], w[1]))
        .map(|(i, _)| i + 1)
        .collect()
}
