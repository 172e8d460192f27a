//! 로테이션 엔진 전반에서 사용되는 공통 타입.

mod calendar;
mod decimal;

pub use calendar::*;
pub use decimal::*;
