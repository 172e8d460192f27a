//! # Rotor Paper
//!
//! 주간 ETF 로테이션 전략의 페이퍼 트레이딩 계층.
//!
//! 백테스트와 동일한 신호 엔진으로 실제 계좌 없이 전략을 운용합니다:
//! - JSON 파일 하나로 영속되는 계좌 (현금, 정수 주수, 게이트 상태)
//! - 주 1회 `run_once`로 보류 중인 리밸런스 하나를 체결
//! - 심볼별 주문 블로터와 주간 플랜 CSV 출력

pub mod account;
pub mod blotter;
pub mod engine;
pub mod error;
pub mod repository;

pub use account::{PaperAccount, TradeRecord, TradeSide};
pub use blotter::{
    blotter_file_name, plan_file_name, write_blotter_csv, write_plan_csv, BlotterRow, PlanRow,
    TradeAction,
};
pub use engine::{PaperEngine, PaperEngineConfig, PaperRunOutcome, WeeklyPlan};
pub use error::{PaperError, PaperResult};
pub use repository::{AccountRepository, JsonFileRepository};
