//! # Rotor Core
//!
//! 주간 ETF 로테이션 시스템의 핵심 타입과 공통 인프라.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 도메인 모델 (일봉, 가격 시계열, 신호, 리스크 상태, 순자산)
//! - 에러 타입 (`RotorError`)
//! - 설정 관리 (`AppConfig`)
//! - 로깅 인프라 (tracing 기반)
//! - 공통 타입과 유틸리티 (거래 캘린더, Decimal 확장)

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

// 자주 쓰는 타입 재수출
pub use config::AppConfig;
pub use domain::{
    aligned_dates, closes_asof, drawdown_from_peak, AssetScore, DailyBar, EquityPoint, PriceSeries,
    RiskState, ScoreBoard, WeeklySignal,
};
pub use error::{RotorError, RotorResult};
pub use types::{rebalance_indices, starts_new_week, week_anchor, DecimalExt, Price, Weight};
