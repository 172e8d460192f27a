//! 주간 로테이션 신호 타입.
//!
//! 이 모듈은 신호 계산 결과 관련 타입을 정의합니다:
//! - `RiskState` - 리스크 게이트 상태
//! - `AssetScore` - 자산별 모멘텀/변동성 점수
//! - `ScoreBoard` - 점수 내림차순 랭킹
//! - `WeeklySignal` - 리밸런스 한 번에 대한 신호 레코드

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 드로다운 기반 리스크 게이트 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskState {
    /// 정상: 주식 ETF 비중 전액 허용
    Normal,
    /// 디리스크: 주식 비중 축소, 방어 자산 병행
    DeRisk,
    /// 서킷 쿨다운: 위험 자산 보유 금지
    CircuitCooldown,
}

impl RiskState {
    /// 위험 자산(주식 ETF) 보유가 허용되는 상태인지 확인합니다.
    pub fn allows_risk_exposure(&self) -> bool {
        !matches!(self, RiskState::CircuitCooldown)
    }
}

impl Default for RiskState {
    fn default() -> Self {
        Self::Normal
    }
}

impl std::fmt::Display for RiskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskState::Normal => write!(f, "NORMAL"),
            RiskState::DeRisk => write!(f, "DE_RISK"),
            RiskState::CircuitCooldown => write!(f, "CIRCUIT_COOLDOWN"),
        }
    }
}

/// 자산 하나의 신호 점수.
///
/// 데이터가 부족해 계산할 수 없는 값은 `None`이며,
/// 해당 자산은 랭킹에서 항상 맨 뒤로 밀립니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetScore {
    /// 심볼
    pub symbol: String,
    /// 룩백 구간 수익률 (모멘텀)
    pub momentum: Option<Decimal>,
    /// 주간 수익률 표준편차 (플로어 적용 후)
    pub volatility: Option<Decimal>,
    /// momentum / volatility
    pub score: Option<Decimal>,
}

impl AssetScore {
    /// 데이터 부족으로 점수를 매길 수 없는 자산을 생성합니다.
    pub fn unscorable(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            momentum: None,
            volatility: None,
            score: None,
        }
    }

    /// 점수 계산이 가능했는지 확인합니다.
    pub fn is_scorable(&self) -> bool {
        self.score.is_some()
    }
}

/// 점수 내림차순으로 정렬된 자산 랭킹.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBoard {
    scores: Vec<AssetScore>,
}

impl ScoreBoard {
    /// 점수 목록에서 랭킹을 생성합니다.
    ///
    /// 점수 있는 자산은 내림차순, 점수 없는 자산은 그 뒤에
    /// 심볼 순으로 배치됩니다.
    pub fn from_scores(mut scores: Vec<AssetScore>) -> Self {
        scores.sort_by(|a, b| match (a.score, b.score) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.symbol.cmp(&b.symbol),
        });
        Self { scores }
    }

    /// 랭킹 슬라이스를 반환합니다.
    pub fn scores(&self) -> &[AssetScore] {
        &self.scores
    }

    /// 1위 자산을 반환합니다 (점수 계산이 가능했던 경우만).
    pub fn best(&self) -> Option<&AssetScore> {
        self.scores.first().filter(|s| s.is_scorable())
    }

    /// 랭킹이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// 리밸런스 한 번에 대한 신호 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySignal {
    /// 신호 기준일 (리밸런스 직전 거래일)
    pub signal_date: NaiveDate,
    /// 자산별 점수 랭킹
    pub scores: ScoreBoard,
    /// 선택된 위험 자산 (점수 1위 또는 폴백)
    pub selected: String,
    /// 게이트 상태
    pub state: RiskState,
    /// 신호 기준일의 드로다운
    pub drawdown: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn score(symbol: &str, s: Decimal) -> AssetScore {
        AssetScore {
            symbol: symbol.to_string(),
            momentum: Some(dec!(0.1)),
            volatility: Some(dec!(0.02)),
            score: Some(s),
        }
    }

    #[test]
    fn test_risk_state_display() {
        assert_eq!(RiskState::Normal.to_string(), "NORMAL");
        assert_eq!(RiskState::DeRisk.to_string(), "DE_RISK");
        assert_eq!(RiskState::CircuitCooldown.to_string(), "CIRCUIT_COOLDOWN");
    }

    #[test]
    fn test_risk_state_serde_values() {
        let json = serde_json::to_string(&RiskState::CircuitCooldown).unwrap();
        assert_eq!(json, r#""CIRCUIT_COOLDOWN""#);

        let state: RiskState = serde_json::from_str(r#""DE_RISK""#).unwrap();
        assert_eq!(state, RiskState::DeRisk);
    }

    #[test]
    fn test_risk_state_exposure() {
        assert!(RiskState::Normal.allows_risk_exposure());
        assert!(RiskState::DeRisk.allows_risk_exposure());
        assert!(!RiskState::CircuitCooldown.allows_risk_exposure());
    }

    #[test]
    fn test_score_board_ranking() {
        let board = ScoreBoard::from_scores(vec![
            score("A", dec!(1.5)),
            AssetScore::unscorable("B"),
            score("C", dec!(3.0)),
        ]);

        let symbols: Vec<&str> = board.scores().iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["C", "A", "B"]);
        assert_eq!(board.best().unwrap().symbol, "C");
    }

    #[test]
    fn test_score_board_all_unscorable() {
        let board = ScoreBoard::from_scores(vec![
            AssetScore::unscorable("B"),
            AssetScore::unscorable("A"),
        ]);

        // 1위가 점수 없는 자산이면 best는 None
        assert!(board.best().is_none());
        assert_eq!(board.scores()[0].symbol, "A");
    }

    #[test]
    fn test_score_board_negative_scores() {
        let board = ScoreBoard::from_scores(vec![score("A", dec!(-2)), score("B", dec!(-1))]);
        // 음수 점수라도 1위는 유효한 선택
        assert_eq!(board.best().unwrap().symbol, "B");
    }
}
