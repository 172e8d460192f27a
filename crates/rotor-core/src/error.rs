//! 로테이션 엔진의 에러 타입.
//!
//! 이 모듈은 시스템 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 로테이션 엔진 에러.
#[derive(Debug, Error)]
pub enum RotorError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 시장 데이터 에러
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 신호 계산 에러
    #[error("신호 에러: {0}")]
    Signal(String),

    /// 백테스트 에러
    #[error("백테스트 에러: {0}")]
    Backtest(String),

    /// 페이퍼 계좌 에러
    #[error("계좌 에러: {0}")]
    Account(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 저장소 에러
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 잔고 부족
    #[error("잔고 부족: {0}")]
    InsufficientFunds(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 로테이션 엔진 작업을 위한 Result 타입.
pub type RotorResult<T> = Result<T, RotorError>;

impl RotorError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RotorError::Network(_))
    }

    /// 치명적인 에러인지 확인합니다.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            RotorError::InsufficientFunds(_) | RotorError::Storage(_)
        )
    }
}

impl From<serde_json::Error> for RotorError {
    fn from(err: serde_json::Error) -> Self {
        RotorError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for RotorError {
    fn from(err: config::ConfigError) -> Self {
        RotorError::Config(err.to_string())
    }
}

impl From<std::io::Error> for RotorError {
    fn from(err: std::io::Error) -> Self {
        RotorError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let network_err = RotorError::Network("timeout".to_string());
        assert!(network_err.is_retryable());

        let config_err = RotorError::Config("missing key".to_string());
        assert!(!config_err.is_retryable());
    }

    #[test]
    fn test_error_critical() {
        let funds_err = RotorError::InsufficientFunds("현금 부족".to_string());
        assert!(funds_err.is_critical());

        let signal_err = RotorError::Signal("score unavailable".to_string());
        assert!(!signal_err.is_critical());
    }
}
