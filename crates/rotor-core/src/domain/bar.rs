//! 일봉 데이터 타입 및 가격 시계열.
//!
//! 이 모듈은 시장 데이터 관련 타입을 정의합니다:
//! - `DailyBar` - OHLCV 일봉 데이터
//! - `PriceSeries` - 심볼별 정렬된 일봉 시계열

use crate::types::{week_anchor, Price};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// OHLCV 일봉 데이터.
///
/// CSV 저장 레코드와 1:1로 대응합니다 (date,open,high,low,close,volume).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Decimal,
}

impl DailyBar {
    /// 새 일봉을 생성합니다.
    pub fn new(
        date: NaiveDate,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Decimal,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 양봉(종가 > 시가)인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }
}

/// 심볼 하나의 정렬된 일봉 시계열.
///
/// 생성 시 날짜 오름차순 정렬과 중복 제거가 보장됩니다.
/// 중복 날짜는 나중에 들어온 일봉이 우선합니다 (증분 업데이트 시
/// 당일 봉이 갱신되는 경우).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    /// 심볼 (예: "069500.KS")
    pub symbol: String,
    bars: Vec<DailyBar>,
}

impl PriceSeries {
    /// 일봉 목록에서 시계열을 생성합니다. 정렬/중복 제거를 수행합니다.
    pub fn from_bars(symbol: impl Into<String>, bars: Vec<DailyBar>) -> Self {
        let mut series = Self {
            symbol: symbol.into(),
            bars,
        };
        series.normalize();
        series
    }

    /// 빈 시계열을 생성합니다.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    fn normalize(&mut self) {
        // 안정 정렬: 같은 날짜는 입력 순서를 유지하고, 마지막 것만 남긴다
        self.bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<DailyBar> = Vec::with_capacity(self.bars.len());
        for bar in self.bars.drain(..) {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        self.bars = deduped;
    }

    /// 새 일봉을 병합합니다. 겹치는 날짜는 새 일봉이 우선합니다.
    pub fn merge(&mut self, new_bars: Vec<DailyBar>) {
        self.bars.extend(new_bars);
        self.normalize();
    }

    /// 일봉 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// 시계열이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 전체 일봉 슬라이스를 반환합니다.
    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    /// 첫 거래일을 반환합니다.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    /// 마지막 거래일을 반환합니다.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// 특정 날짜의 종가를 반환합니다 (해당 거래일이 있는 경우만).
    pub fn close_on(&self, date: NaiveDate) -> Option<Price> {
        let idx = self.bars.partition_point(|b| b.date < date);
        self.bars
            .get(idx)
            .filter(|b| b.date == date)
            .map(|b| b.close)
    }

    /// 지정 날짜 기준 평가 종가를 반환합니다 (직전 종가 이월).
    ///
    /// 해당 날짜에 거래가 없으면 그 이전 마지막 종가를 사용합니다.
    /// 첫 거래일 이전이면 `None`.
    pub fn close_asof(&self, date: NaiveDate) -> Option<Price> {
        let idx = self.bars.partition_point(|b| b.date <= date);
        idx.checked_sub(1).map(|i| self.bars[i].close)
    }

    /// 지정 날짜까지(포함)의 일봉 슬라이스를 반환합니다.
    pub fn bars_through(&self, date: NaiveDate) -> &[DailyBar] {
        let idx = self.bars.partition_point(|b| b.date <= date);
        &self.bars[..idx]
    }

    /// 지정 날짜까지의 주간 종가를 반환합니다.
    ///
    /// 금요일 마감 기준 주(W-FRI)별로 마지막 종가 하나씩,
    /// (주 앵커, 종가) 쌍을 날짜순으로 반환합니다.
    pub fn weekly_closes(&self, through: NaiveDate) -> Vec<(NaiveDate, Price)> {
        let mut weekly: Vec<(NaiveDate, Price)> = Vec::new();
        for bar in self.bars_through(through) {
            let anchor = week_anchor(bar.date);
            match weekly.last_mut() {
                Some((last_anchor, close)) if *last_anchor == anchor => *close = bar.close,
                _ => weekly.push((anchor, bar.close)),
            }
        }
        weekly
    }
}

// ===== 시계열 정렬 헬퍼 =====

/// 여러 시계열을 합쳐 정렬된 공통 날짜 축을 만듭니다.
///
/// 날짜 축은 전체 심볼의 거래일 합집합에서, 모든 심볼이 거래를 시작한
/// 이후(첫 거래일의 최댓값부터)만 남긴 것입니다. 개별 심볼이 쉬어간
/// 날짜는 `close_asof`로 직전 종가를 이월해 평가합니다.
///
/// 심볼 중 하나라도 시계열이 없거나 비어 있으면 빈 축을 반환합니다.
pub fn aligned_dates(series: &HashMap<String, PriceSeries>, symbols: &[String]) -> Vec<NaiveDate> {
    let mut start: Option<NaiveDate> = None;
    let mut all_dates: BTreeSet<NaiveDate> = BTreeSet::new();

    for symbol in symbols {
        let first = match series.get(symbol).and_then(|s| s.first_date()) {
            Some(first) => first,
            None => return Vec::new(),
        };
        start = Some(start.map_or(first, |cur| cur.max(first)));
        if let Some(s) = series.get(symbol) {
            for bar in s.bars() {
                all_dates.insert(bar.date);
            }
        }
    }

    match start {
        Some(start) => all_dates.into_iter().filter(|d| *d >= start).collect(),
        None => Vec::new(),
    }
}

/// 지정 날짜의 심볼별 평가 종가 행을 만듭니다 (직전 종가 이월).
///
/// 어느 한 심볼이라도 해당 날짜 이전 종가가 없으면 `None`.
pub fn closes_asof(
    series: &HashMap<String, PriceSeries>,
    symbols: &[String],
    date: NaiveDate,
) -> Option<HashMap<String, Price>> {
    let mut row = HashMap::with_capacity(symbols.len());
    for symbol in symbols {
        let px = series.get(symbol)?.close_asof(date)?;
        row.insert(symbol.clone(), px);
    }
    Some(row)
}
