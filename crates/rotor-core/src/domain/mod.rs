//! 로테이션 엔진의 도메인 모델.

mod bar;
mod equity;
mod signal;

pub use bar::*;
pub use equity::*;
pub use signal::*;
