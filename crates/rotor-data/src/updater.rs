//! 증분 일봉 업데이트.
//!
//! 심볼별로 캐시된 마지막 거래일 다음 날부터만 가져와 병합합니다.
//! 네트워크 오류는 설정된 횟수만큼 재시도하고, 유니버스 업데이트는
//! 일부 심볼이 실패해도 나머지를 계속 진행합니다.

use crate::error::{DataError, Result};
use crate::provider::BarProvider;
use crate::store::CsvBarStore;
use chrono::{Duration, NaiveDate, Utc};
use rotor_core::config::RetryConfig;
use rotor_core::domain::PriceSeries;
use tracing::{error, info, warn};

/// 심볼 하나의 업데이트 결과.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// 심볼
    pub symbol: String,
    /// 이번에 새로 받은 일봉 수
    pub fetched_rows: usize,
    /// 병합 후 전체 일봉 수
    pub total_rows: usize,
    /// 병합 후 마지막 거래일
    pub last_date: Option<NaiveDate>,
}

/// 유니버스 업데이트 결과.
#[derive(Debug, Default)]
pub struct UniverseUpdateReport {
    /// 성공한 심볼별 결과
    pub updated: Vec<UpdateOutcome>,
    /// 실패한 (심볼, 사유) 목록
    pub failed: Vec<(String, String)>,
}

impl UniverseUpdateReport {
    /// 전부 성공했는지 확인합니다.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 저장소와 제공자를 묶어 증분 업데이트를 수행합니다.
pub struct MarketDataUpdater {
    store: CsvBarStore,
    retry: RetryConfig,
}

impl MarketDataUpdater {
    pub fn new(store: CsvBarStore, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    /// 내부 저장소 참조.
    pub fn store(&self) -> &CsvBarStore {
        &self.store
    }

    /// 심볼 하나를 증분 업데이트합니다.
    ///
    /// - 캐시가 있으면 마지막 거래일 + 1일부터 가져옵니다.
    /// - 증분 결과가 비어 있으면 캐시를 그대로 유지합니다.
    /// - 최초 수집 결과가 비어 있으면 오류입니다.
    pub async fn update_symbol(
        &self,
        provider: &dyn BarProvider,
        symbol: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<UpdateOutcome> {
        let end = end_date.unwrap_or_else(|| Utc::now().date_naive());

        let cached = if self.store.has(symbol) {
            Some(self.store.load(symbol)?)
        } else {
            None
        };
        let fetch_start = cached
            .as_ref()
            .and_then(|s| s.last_date())
            .map(|d| d + Duration::days(1))
            .unwrap_or(start_date);

        if fetch_start > end {
            let series = match &cached {
                Some(series) => series,
                None => {
                    return Err(DataError::InvalidData(format!(
                        "{} 수집 범위가 비어 있습니다 ({} > {})",
                        symbol, fetch_start, end
                    )))
                }
            };
            info!(symbol, last_date = ?series.last_date(), "이미 최신, 건너뜀");
            return Ok(UpdateOutcome {
                symbol: symbol.to_string(),
                fetched_rows: 0,
                total_rows: series.len(),
                last_date: series.last_date(),
            });
        }

        let new_bars = self
            .fetch_with_retry(provider, symbol, fetch_start, end)
            .await?;

        if new_bars.is_empty() {
            return match cached {
                Some(series) => {
                    info!(symbol, total = series.len(), "신규 일봉 없음, 캐시 유지");
                    Ok(UpdateOutcome {
                        symbol: symbol.to_string(),
                        fetched_rows: 0,
                        total_rows: series.len(),
                        last_date: series.last_date(),
                    })
                }
                None => Err(DataError::EmptyResponse(format!(
                    "{} 최초 수집 결과가 비어 있습니다",
                    symbol
                ))),
            };
        }

        let mut series = cached.unwrap_or_else(|| PriceSeries::empty(symbol));
        let fetched_rows = new_bars.len();
        series.merge(new_bars);
        self.store.save(&series)?;

        info!(
            symbol,
            fetched = fetched_rows,
            total = series.len(),
            last_date = ?series.last_date(),
            "일봉 업데이트 완료"
        );
        Ok(UpdateOutcome {
            symbol: symbol.to_string(),
            fetched_rows,
            total_rows: series.len(),
            last_date: series.last_date(),
        })
    }

    /// 유니버스 전체를 업데이트합니다. 실패한 심볼은 건너뛰고 계속합니다.
    pub async fn update_universe(
        &self,
        provider: &dyn BarProvider,
        symbols: &[String],
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> UniverseUpdateReport {
        let mut report = UniverseUpdateReport::default();
        for symbol in symbols {
            match self
                .update_symbol(provider, symbol, start_date, end_date)
                .await
            {
                Ok(outcome) => report.updated.push(outcome),
                Err(e) => {
                    error!(symbol, error = %e, "심볼 업데이트 실패, 계속 진행");
                    report.failed.push((symbol.clone(), e.to_string()));
                }
            }
        }
        info!(
            updated = report.updated.len(),
            failed = report.failed.len(),
            "유니버스 업데이트 종료"
        );
        report
    }

    async fn fetch_with_retry(
        &self,
        provider: &dyn BarProvider,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<rotor_core::domain::DailyBar>> {
        let attempts = self.retry.attempts.max(1);
        let mut last_err: Option<DataError> = None;

        for attempt in 1..=attempts {
            match provider.fetch_daily(symbol, start, end).await {
                Ok(bars) => return Ok(bars),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        symbol,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "일봉 수집 실패, 재시도 대기"
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(self.retry.wait_seconds))
                        .await;
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err
            .unwrap_or_else(|| DataError::FetchError(format!("{} 수집 재시도 소진", symbol))))
    }
}
