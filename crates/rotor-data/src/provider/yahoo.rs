//! Yahoo Finance v8 차트 API 일봉 제공자.

use crate::error::{DataError, Result};
use crate::provider::BarProvider;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use rotor_core::domain::DailyBar;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance 일봉 제공자.
///
/// 조정 종가(adjclose)가 있으면 종가로 사용하고, 없으면 원 종가를
/// 사용합니다. 필드가 null인 행은 건너뜁니다.
#[derive(Debug, Clone)]
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    /// 기본 엔드포인트로 제공자를 만듭니다.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// 커스텀 엔드포인트로 제공자를 만듭니다 (테스트용).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BarProvider for YahooProvider {
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>> {
        // 날짜를 UNIX 타임스탬프로 변환 (종료일 포함)
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = (end + Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url, symbol, period1, period2
        );
        debug!(symbol, %start, %end, "야후 일봉 요청");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::FetchError(format!(
                "{} 요청 실패: HTTP {}",
                symbol, status
            )));
        }

        let chart_response: YahooChartResponse = response.json().await?;

        if let Some(error) = chart_response.chart.error {
            return Err(DataError::FetchError(format!(
                "{}: {} - {}",
                symbol, error.code, error.description
            )));
        }

        let result = chart_response
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| DataError::ParseError(format!("{} 응답에 결과가 없습니다", symbol)))?;

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ParseError(format!("{} 응답에 시세가 없습니다", symbol)))?;

        let opens = quote.open.unwrap_or_default();
        let highs = quote.high.unwrap_or_default();
        let lows = quote.low.unwrap_or_default();
        let closes = quote.close.unwrap_or_default();
        let volumes = quote.volume.unwrap_or_default();

        // 조정 종가 우선 사용
        let adj_closes = result
            .indicators
            .adj_close
            .and_then(|ac| ac.into_iter().next())
            .and_then(|ac| ac.adj_close)
            .unwrap_or_default();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let open = opens.get(i).and_then(|v| *v);
            let high = highs.get(i).and_then(|v| *v);
            let low = lows.get(i).and_then(|v| *v);
            let close = adj_closes
                .get(i)
                .and_then(|v| *v)
                .or_else(|| closes.get(i).and_then(|v| *v));
            let volume = volumes.get(i).and_then(|v| *v);

            // 하나라도 null이면 그 행은 버린다
            if let (Some(o), Some(h), Some(l), Some(c), Some(v)) = (open, high, low, close, volume)
            {
                let date = match chrono::DateTime::from_timestamp(ts, 0) {
                    Some(dt) => dt.date_naive(),
                    None => continue,
                };
                bars.push(DailyBar::new(
                    date,
                    to_decimal(o),
                    to_decimal(h),
                    to_decimal(l),
                    to_decimal(c),
                    Decimal::from(v),
                ));
            }
        }

        bars.sort_by_key(|b| b.date);
        debug!(symbol, rows = bars.len(), "야후 일봉 수신");
        Ok(bars)
    }
}

/// f64 가격을 소수 4자리 Decimal로 변환합니다.
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_str(&format!("{:.4}", value)).unwrap_or_default()
}

/// Yahoo Finance API v8 응답 구조
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    #[serde(rename = "adjclose")]
    adj_close: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<i64>>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    #[serde(rename = "adjclose")]
    adj_close: Option<Vec<Option<f64>>>,
}
