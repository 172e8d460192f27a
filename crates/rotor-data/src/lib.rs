//! # Rotor Data
//!
//! 시장 데이터 계층: 심볼별 CSV 일봉 저장소, Yahoo Finance 제공자,
//! 증분 업데이터.
//!
//! 데이터 흐름:
//! 1. `BarProvider`가 외부 소스에서 일봉을 가져온다
//! 2. `MarketDataUpdater`가 캐시 마지막 날 이후만 받아 병합한다
//! 3. `CsvBarStore`가 심볼당 CSV 파일로 저장한다

pub mod error;
pub mod provider;
pub mod store;
pub mod updater;

pub use error::{DataError, Result};
pub use provider::{BarProvider, YahooProvider};
pub use store::{CsvBarStore, SymbolStatus};
pub use updater::{MarketDataUpdater, UniverseUpdateReport, UpdateOutcome};
