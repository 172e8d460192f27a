//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 로컬 캐시 입출력 오류
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 로컬 데이터 없음 (먼저 update-data 실행 필요)
    #[error("Local data not found: {0}")]
    NotFound(String),

    /// 외부 소스에서 데이터 가져오기 오류
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 빈 응답
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl DataError {
    /// 재시도할 가치가 있는 오류인지 확인합니다.
    ///
    /// 네트워크 오류와 일시적 응답 파싱 오류(점검 페이지 등)가 해당합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DataError::FetchError(_) | DataError::ParseError(_))
    }
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::StorageError(err.to_string())
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::StorageError(err.to_string())
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        DataError::FetchError(err.to_string())
    }
}

impl From<DataError> for rotor_core::RotorError {
    fn from(err: DataError) -> Self {
        use rotor_core::RotorError;
        match err {
            DataError::StorageError(msg) => RotorError::Storage(msg),
            DataError::NotFound(msg) => RotorError::NotFound(msg),
            DataError::FetchError(msg) => RotorError::Network(msg),
            DataError::ParseError(msg)
            | DataError::EmptyResponse(msg)
            | DataError::InvalidData(msg) => RotorError::Data(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
