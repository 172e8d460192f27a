//! 주간 로테이션 전략 백테스트.
//!
//! - `engine` - 일봉 기반 시뮬레이션 루프
//! - `metrics` - 수익률/위험/비용 지표
//! - `report` - CSV/HTML 산출물

pub mod engine;
pub mod metrics;
pub mod report;

pub use engine::{
    BacktestConfig, BacktestEngine, BacktestError, BacktestOutcome, BacktestResult,
    RebalanceRecord,
};
pub use metrics::{BacktestStats, TRADING_DAYS_PER_YEAR};
pub use report::{
    read_equity_csv, read_rebalances_csv, write_equity_csv, write_html_report,
    write_rebalances_csv,
};
