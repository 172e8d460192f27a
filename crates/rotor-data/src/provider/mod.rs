//! 일봉 데이터 제공자 추상화.

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rotor_core::domain::DailyBar;

mod yahoo;

pub use yahoo::YahooProvider;

/// 외부 소스에서 일봉을 가져오는 제공자.
///
/// 구현체는 `[start, end]` 범위(양끝 포함)의 일봉을 날짜 오름차순으로
/// 반환해야 합니다. 범위에 데이터가 없으면 빈 Vec을 반환합니다.
#[async_trait]
pub trait BarProvider: Send + Sync {
    /// 심볼의 일봉을 가져옵니다.
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>>;
}
