//! 계좌 영속화
//!
//! 계좌는 사람이 읽을 수 있는 pretty JSON 파일 하나로 저장됩니다.
//! 저장소 trait 뒤에 두어 테스트에서 인메모리 구현으로 바꿀 수 있습니다.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::account::PaperAccount;
use crate::error::PaperResult;

/// 페이퍼 계좌 저장소 trait.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// 저장된 계좌를 불러옵니다. 아직 저장된 적이 없으면 `None`.
    async fn load(&self) -> PaperResult<Option<PaperAccount>>;

    /// 계좌 상태를 저장합니다.
    async fn save(&self, account: &PaperAccount) -> PaperResult<()>;
}

/// JSON 파일 기반 계좌 저장소.
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 계좌 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AccountRepository for JsonFileRepository {
    async fn load(&self) -> PaperResult<Option<PaperAccount>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "계좌 파일 없음, 신규 계좌로 시작");
            return Ok(None);
        }

        let text = tokio::fs::read_to_string(&self.path).await?;
        let account: PaperAccount = serde_json::from_str(&text)?;

        debug!(
            path = %self.path.display(),
            as_of = ?account.as_of,
            "계좌 로드 완료"
        );
        Ok(Some(account))
    }

    async fn save(&self, account: &PaperAccount) -> PaperResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(account)?;
        tokio::fs::write(&self.path, json).await?;

        info!(
            path = %self.path.display(),
            as_of = ?account.as_of,
            positions = account.positions.len(),
            "계좌 저장 완료"
        );
        Ok(())
    }
}

// ============================================================
// 테스트
// ============================================================
