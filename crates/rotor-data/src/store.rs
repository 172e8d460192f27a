//! 심볼별 일봉 CSV 저장소.
//!
//! 일봉은 심볼당 하나의 CSV 파일로 저장합니다
//! (`{market_dir}/{symbol}.csv`, 헤더: date,open,high,low,close,volume).
//! 로드 시 날짜나 종가가 없는 행은 버리고, 날짜 오름차순 정렬과
//! 중복 제거는 `PriceSeries`가 보장합니다.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use rotor_core::domain::{DailyBar, PriceSeries};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 로컬 CSV 일봉 저장소.
#[derive(Debug, Clone)]
pub struct CsvBarStore {
    root: PathBuf,
}

/// 캐시된 심볼 하나의 현황.
#[derive(Debug, Clone)]
pub struct SymbolStatus {
    /// 심볼
    pub symbol: String,
    /// 일봉 수
    pub rows: usize,
    /// 첫 거래일
    pub first_date: Option<NaiveDate>,
    /// 마지막 거래일
    pub last_date: Option<NaiveDate>,
}

/// CSV 한 행의 원시 레코드. 필드 누락을 허용하고 로드 시 걸러냅니다.
#[derive(Debug, Deserialize)]
struct RawBarRecord {
    date: Option<NaiveDate>,
    #[serde(default)]
    open: Option<Decimal>,
    #[serde(default)]
    high: Option<Decimal>,
    #[serde(default)]
    low: Option<Decimal>,
    #[serde(default)]
    close: Option<Decimal>,
    #[serde(default)]
    volume: Option<Decimal>,
}

impl CsvBarStore {
    /// 지정한 루트 디렉토리의 저장소를 만듭니다.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 저장소 루트 디렉토리.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 심볼의 CSV 파일 경로.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.root.join(format!("{}.csv", sanitize_symbol(symbol)))
    }

    /// 심볼이 캐시되어 있는지 확인합니다.
    pub fn has(&self, symbol: &str) -> bool {
        self.path_for(symbol).exists()
    }

    /// 심볼의 일봉 시계열을 로드합니다.
    ///
    /// 파일이 없으면 `NotFound`. 날짜/종가가 없는 행은 경고 후 버립니다.
    pub fn load(&self, symbol: &str) -> Result<PriceSeries> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::NotFound(format!(
                "{} ({})",
                symbol,
                path.display()
            )));
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for record in reader.deserialize::<RawBarRecord>() {
            let raw = match record {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(symbol, error = %e, "일봉 행 파싱 실패, 건너뜀");
                    dropped += 1;
                    continue;
                }
            };
            match (raw.date, raw.close) {
                (Some(date), Some(close)) => {
                    bars.push(DailyBar::new(
                        date,
                        raw.open.unwrap_or(close),
                        raw.high.unwrap_or(close),
                        raw.low.unwrap_or(close),
                        close,
                        raw.volume.unwrap_or(Decimal::ZERO),
                    ));
                }
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(symbol, dropped, "날짜/종가 누락 행 제거");
        }
        debug!(symbol, rows = bars.len(), "일봉 로드 완료");
        Ok(PriceSeries::from_bars(symbol, bars))
    }

    /// 시계열을 CSV로 저장합니다. 루트 디렉토리는 필요 시 생성합니다.
    pub fn save(&self, series: &PriceSeries) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(&series.symbol);
        let mut writer = csv::Writer::from_path(&path)?;
        for bar in series.bars() {
            writer.serialize(bar)?;
        }
        writer.flush()?;
        debug!(symbol = %series.symbol, rows = series.len(), path = %path.display(), "일봉 저장 완료");
        Ok(())
    }

    /// 캐시된 마지막 거래일을 반환합니다. 캐시가 없으면 `None`.
    pub fn last_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        if !self.has(symbol) {
            return Ok(None);
        }
        Ok(self.load(symbol)?.last_date())
    }

    /// 저장소 전체 현황을 심볼 순으로 반환합니다.
    pub fn status(&self) -> Result<Vec<SymbolStatus>> {
        let mut statuses = Vec::new();
        if !self.root.exists() {
            return Ok(statuses);
        }

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let symbol = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            match self.load(&symbol) {
                Ok(series) => statuses.push(SymbolStatus {
                    rows: series.len(),
                    first_date: series.first_date(),
                    last_date: series.last_date(),
                    symbol,
                }),
                Err(e) => warn!(symbol, error = %e, "캐시 현황 조회 실패, 건너뜀"),
            }
        }

        statuses.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(statuses)
    }
}

// ===== 헬퍼 함수 =====

/// 심볼에서 경로 구분 문자를 제거합니다.
fn sanitize_symbol(symbol: &str) -> String {
    symbol.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn temp_store(name: &str) -> CsvBarStore {
        let dir =
            std::env::temp_dir().join(format!("rotor_store_{}_{}", name, uuid::Uuid::new_v4()));
        CsvBarStore::new(dir)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(date: NaiveDate, close: Decimal) -> DailyBar {
        DailyBar::new(date, close, close, close, close, dec!(1000))
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = temp_store("round_trip");
        let series = PriceSeries::from_bars(
            "069500.KS",
            vec![bar(d(2024, 1, 2), dec!(100.5)), bar(d(2024, 1, 3), dec!(101.25))],
        );

        store.save(&series).unwrap();
        let loaded = store.load("069500.KS").unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.close_on(d(2024, 1, 3)), Some(dec!(101.25)));
        assert_eq!(loaded.last_date(), Some(d(2024, 1, 3)));

        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn test_load_missing_symbol() {
        let store = temp_store("missing");
        let err = store.load("NOPE.KS").unwrap_err();
        assert!(matches!(err, DataError::NotFound(_)));
    }

    #[test]
    fn test_last_date_without_cache() {
        let store = temp_store("last_date");
        assert_eq!(store.last_date("069500.KS").unwrap(), None);
    }

    #[test]
    fn test_load_drops_rows_missing_close() {
        let store = temp_store("drops");
        fs::create_dir_all(store.root()).unwrap();
        fs::write(
            store.path_for("229200.KS"),
            "date,open,high,low,close,volume\n\
             2024-01-02,100,101,99,100.5,1000\n\
             2024-01-03,100,101,99,,1000\n\
             2024-01-04,,,,101.5,\n",
        )
        .unwrap();

        let loaded = store.load("229200.KS").unwrap();

        // 종가 없는 1/3 행만 제거, 1/4는 종가로 보간
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.close_on(d(2024, 1, 4)), Some(dec!(101.5)));
        let bars = loaded.bars();
        assert_eq!(bars[1].open, dec!(101.5));
        assert_eq!(bars[1].volume, Decimal::ZERO);

        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn test_status_lists_symbols_sorted() {
        let store = temp_store("status");
        store
            .save(&PriceSeries::from_bars("B.KS", vec![bar(d(2024, 1, 2), dec!(50))]))
            .unwrap();
        store
            .save(&PriceSeries::from_bars(
                "A.KS",
                vec![bar(d(2024, 1, 2), dec!(100)), bar(d(2024, 1, 3), dec!(101))],
            ))
            .unwrap();

        let statuses = store.status().unwrap();

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].symbol, "A.KS");
        assert_eq!(statuses[0].rows, 2);
        assert_eq!(statuses[0].last_date, Some(d(2024, 1, 3)));
        assert_eq!(statuses[1].symbol, "B.KS");

        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn test_status_empty_root() {
        let store = temp_store("empty_root");
        assert!(store.status().unwrap().is_empty());
    }
}
