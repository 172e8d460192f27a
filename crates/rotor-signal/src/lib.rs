//! 주간 ETF 로테이션 신호 계산.
//!
//! 이 크레이트는 전략의 "머리"에 해당합니다:
//! - `score` - 모멘텀/변동성 점수와 랭킹
//! - `gate` - 드로다운 기반 리스크 게이트 상태 기계
//! - `weights` - 상태별 목표 비중과 노트레이드 밴드
//! - `costs` - 수수료/세금/슬리피지 추정
//! - `engine` - 위를 묶은 주간 평가 엔진
//!
//! 백테스트와 페이퍼 트레이딩이 같은 엔진을 공유하므로
//! 두 경로의 신호가 어긋날 수 없습니다.

pub mod costs;
pub mod engine;
pub mod gate;
pub mod score;
pub mod weights;

pub use costs::{CostModel, TradeLeg};
pub use engine::{RotationDecision, RotationSignalEngine};
pub use gate::{GateSnapshot, GateTransition, RiskGate};
pub use score::{compute_asset_score, score_universe, weekly_return_std};
pub use weights::{apply_no_trade_band, pick_winner, target_weights};
