//! 주간 ETF 로테이션 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 유니버스 일봉 데이터 증분 업데이트
//! rotor update-data
//!
//! # 저장된 데이터로 백테스트 실행 + 리포트 생성
//! rotor backtest
//!
//! # 보류 중인 주간 리밸런스 하나를 페이퍼 계좌에 체결
//! rotor paper
//!
//! # 데이터 공백으로 밀린 리밸런스를 전부 따라잡기
//! rotor paper --catch-up
//!
//! # 최신 데이터 기준 다음 주 주문 계획 미리보기
//! rotor plan
//!
//! # 캐시된 순자산 곡선으로 리포트 재생성
//! rotor report --source paper
//!
//! # 데이터 저장소와 계좌 현황 확인
//! rotor status
//! ```

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

#[derive(Parser)]
#[command(name = "rotor")]
#[command(about = "주간 ETF 로테이션 - 모멘텀 신호, 백테스트, 페이퍼 트레이딩", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로 (YAML)
    #[arg(short, long, default_value = "config/config.yaml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 유니버스 일봉 데이터 증분 업데이트 (Yahoo Finance)
    UpdateData {
        /// 특정 심볼만 업데이트 (생략 시 유니버스 전체)
        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// 저장된 데이터 전체 기간 백테스트 실행
    Backtest {
        /// CSV/HTML 리포트를 만들지 않고 요약만 출력
        #[arg(long, default_value = "false")]
        no_report: bool,
    },

    /// 보류 중인 주간 리밸런스 하나를 페이퍼 계좌에 체결
    Paper {
        /// 밀린 리밸런스를 전부 순서대로 처리
        #[arg(long, default_value = "false")]
        catch_up: bool,
    },

    /// 최신 데이터 기준 다음 주 주문 계획 생성 (계좌 변경 없음)
    Plan,

    /// 캐시된 순자산 곡선으로 HTML 리포트 재생성
    Report {
        /// 순자산 캐시 출처 (backtest | paper)
        #[arg(long)]
        source: String,
    },

    /// 데이터 저장소와 페이퍼 계좌 현황 출력
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env가 있으면 ROTOR__ 오버라이드용 환경 변수로 로드
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = rotor_core::AppConfig::load(&cli.config)?;

    let log_format: rotor_core::logging::LogFormat =
        config.logging.format.parse().unwrap_or_default();
    let log_config =
        rotor_core::logging::LogConfig::new(&config.logging.level).with_format(log_format);
    if let Err(e) = rotor_core::logging::init_logging(log_config) {
        eprintln!("로깅 초기화 실패: {e}");
    }

    let result = match cli.command {
        Commands::UpdateData { symbol } => {
            commands::update_data::run(&config, symbol.as_deref()).await
        }
        Commands::Backtest { no_report } => commands::backtest::run(&config, no_report),
        Commands::Paper { catch_up } => commands::paper::run(&config, catch_up).await,
        Commands::Plan => commands::plan::run(&config).await,
        Commands::Report { source } => commands::report::run(&config, &source),
        Commands::Status => commands::status::run(&config).await,
    };

    if let Err(e) = &result {
        error!("명령 실행 실패: {e:#}");
    }
    result
}
