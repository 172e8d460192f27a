//! CLI 하위 명령 구현.

pub mod backtest;
pub mod paper;
pub mod plan;
pub mod report;
pub mod status;
pub mod update_data;
