//! 페이퍼 트레이딩 에러 타입

use chrono::NaiveDate;
use thiserror::Error;

/// 페이퍼 트레이딩 관련 에러
#[derive(Error, Debug)]
pub enum PaperError {
    #[error("페이퍼 설정 오류: {0}")]
    ConfigError(String),

    #[error("가격 데이터 오류: {0}")]
    DataError(String),

    #[error("계좌가 이미 최신 상태입니다 (기준일: {0})")]
    UpToDate(NaiveDate),

    #[error("계좌 파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),

    #[error("계좌 직렬화 오류: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("블로터 CSV 오류: {0}")]
    Csv(#[from] csv::Error),
}

/// 페이퍼 트레이딩 Result 타입
pub type PaperResult<T> = Result<T, PaperError>;
