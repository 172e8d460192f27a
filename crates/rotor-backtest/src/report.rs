//! 백테스트/페이퍼 리포트 산출물.
//!
//! - 리밸런스 기록 CSV, 순자산 곡선 CSV (재생성 가능하도록 읽기도 지원)
//! - 외부 의존성 없는 단일 HTML 리포트 (인라인 SVG 순자산 곡선)

use std::fs;
use std::path::Path;

use rotor_core::EquityPoint;
use rust_decimal::prelude::ToPrimitive;
use tracing::info;

use crate::engine::{BacktestResult, RebalanceRecord};

const SVG_WIDTH: f64 = 960.0;
const SVG_HEIGHT: f64 = 420.0;
const SVG_MARGIN: f64 = 48.0;

/// 리밸런스 기록을 CSV로 저장합니다.
pub fn write_rebalances_csv(path: &Path, records: &[RebalanceRecord]) -> BacktestResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = records.len(), "리밸런스 기록 저장");
    Ok(())
}

/// 리밸런스 기록 CSV를 읽습니다.
pub fn read_rebalances_csv(path: &Path) -> BacktestResult<Vec<RebalanceRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// 순자산 곡선을 CSV로 저장합니다.
pub fn write_equity_csv(path: &Path, curve: &[EquityPoint]) -> BacktestResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for point in curve {
        writer.serialize(point)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = curve.len(), "순자산 곡선 저장");
    Ok(())
}

/// 순자산 곡선 CSV를 읽습니다 (리포트 재생성용).
pub fn read_equity_csv(path: &Path) -> BacktestResult<Vec<EquityPoint>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut points = Vec::new();
    for row in reader.deserialize() {
        points.push(row?);
    }
    Ok(points)
}

/// 순자산 곡선과 지표 테이블로 단일 HTML 리포트를 생성합니다.
///
/// 외부 스크립트나 CDN 없이 열리는 정적 파일입니다.
pub fn write_html_report(
    path: &Path,
    title: &str,
    curve: &[EquityPoint],
    stats_rows: &[(String, String)],
) -> BacktestResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut rows = String::new();
    for (label, value) in stats_rows {
        rows.push_str(&format!(
            "      <tr><th>{}</th><td>{}</td></tr>\n",
            label, value
        ));
    }

    let html = format!(
        "<!DOCTYPE html>\n\
         <html lang=\"ko\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 2rem; color: #222; }}\n\
         h1 {{ font-size: 1.4rem; }}\n\
         table {{ border-collapse: collapse; margin-top: 1rem; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 0.4rem 0.8rem; text-align: left; }}\n\
         th {{ background: #f5f5f5; }}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         {svg}\n\
         <table>\n\
         {rows}\
         </table>\n\
         </body>\n\
         </html>\n",
        title = title,
        svg = equity_curve_svg(curve),
        rows = rows,
    );

    fs::write(path, html)?;
    info!(path = %path.display(), "HTML 리포트 저장");
    Ok(())
}

/// 순자산 곡선을 SVG polyline으로 렌더링합니다.
fn equity_curve_svg(curve: &[EquityPoint]) -> String {
    if curve.len() < 2 {
        return "<p>순자산 곡선을 그릴 데이터가 부족합니다.</p>".to_string();
    }

    let values: Vec<f64> = curve
        .iter()
        .map(|p| p.equity.to_f64().unwrap_or(0.0))
        .collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if (max - min).abs() < f64::EPSILON {
        1.0
    } else {
        max - min
    };

    let plot_w = SVG_WIDTH - 2.0 * SVG_MARGIN;
    let plot_h = SVG_HEIGHT - 2.0 * SVG_MARGIN;
    let step = plot_w / (values.len() - 1) as f64;

    let mut points = String::new();
    for (i, value) in values.iter().enumerate() {
        let x = SVG_MARGIN + step * i as f64;
        let y = SVG_MARGIN + plot_h * (1.0 - (value - min) / span);
        if i > 0 {
            points.push(' ');
        }
        points.push_str(&format!("{:.1},{:.1}", x, y));
    }

    format!(
        "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" xmlns=\"http://www.w3.org/2000/svg\">\n\
         <rect x=\"{m}\" y=\"{m}\" width=\"{pw}\" height=\"{ph}\" fill=\"none\" stroke=\"#ddd\"/>\n\
         <polyline fill=\"none\" stroke=\"#1565c0\" stroke-width=\"1.5\" points=\"{points}\"/>\n\
         <text x=\"{m}\" y=\"{top_label_y}\" font-size=\"12\" fill=\"#666\">{max:.0}</text>\n\
         <text x=\"{m}\" y=\"{bottom_label_y}\" font-size=\"12\" fill=\"#666\">{min:.0}</text>\n\
         <text x=\"{m}\" y=\"{date_y}\" font-size=\"12\" fill=\"#666\">{start}</text>\n\
         <text x=\"{end_x}\" y=\"{date_y}\" font-size=\"12\" fill=\"#666\" text-anchor=\"end\">{end}</text>\n\
         </svg>",
        w = SVG_WIDTH,
        h = SVG_HEIGHT,
        m = SVG_MARGIN,
        pw = plot_w,
        ph = plot_h,
        points = points,
        max = max,
        min = min,
        top_label_y = SVG_MARGIN - 6.0,
        bottom_label_y = SVG_HEIGHT - SVG_MARGIN + 16.0,
        date_y = SVG_HEIGHT - 12.0,
        end_x = SVG_WIDTH - SVG_MARGIN,
        start = curve[0].date,
        end = curve[curve.len() - 1].date,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use rotor_core::RiskState;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rotor_report_{}_{}", name, uuid::Uuid::new_v4()))
    }

    fn sample_curve() -> Vec<EquityPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..10)
            .map(|i| {
                EquityPoint::new(
                    start + Duration::days(i),
                    dec!(10_000_000) + dec!(10_000) * rust_decimal::Decimal::from(i),
                )
            })
            .collect()
    }

    fn sample_record() -> RebalanceRecord {
        RebalanceRecord {
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            signal_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            state: RiskState::DeRisk,
            winner: "069500.KS".to_string(),
            drawdown: dec!(0.18),
            portfolio_value_pre: dec!(10_000_000),
            portfolio_value_post: dec!(9_995_000),
            turnover_abs_weight: dec!(1.0),
            turnover_oneway: dec!(0.5),
            gross_trade_value: dec!(10_000_000),
            gross_sell_value: dec!(5_000_000),
            estimated_cost: dec!(5_000),
        }
    }

    #[test]
    fn test_equity_csv_round_trip() {
        let dir = temp_dir("equity");
        let path = dir.join("equity.csv");
        let curve = sample_curve();

        write_equity_csv(&path, &curve).unwrap();
        let loaded = read_equity_csv(&path).unwrap();

        assert_eq!(loaded.len(), curve.len());
        assert_eq!(loaded[0].date, curve[0].date);
        assert_eq!(loaded[9].equity, curve[9].equity);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rebalances_csv_round_trip() {
        let dir = temp_dir("rebalances");
        let path = dir.join("rebalances.csv");
        let records = vec![sample_record()];

        write_rebalances_csv(&path, &records).unwrap();
        let loaded = read_rebalances_csv(&path).unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].state, RiskState::DeRisk);
        assert_eq!(loaded[0].winner, "069500.KS");
        assert_eq!(loaded[0].estimated_cost, dec!(5_000));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_html_report_contains_svg_and_stats() {
        let dir = temp_dir("html");
        let path = dir.join("report.html");
        let rows = vec![
            ("총 수익률".to_string(), "12.34%".to_string()),
            ("샤프 비율".to_string(), "1.52".to_string()),
        ];

        write_html_report(&path, "백테스트 리포트", &sample_curve(), &rows).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();

        assert!(html.contains("<svg"));
        assert!(html.contains("백테스트 리포트"));
        assert!(html.contains("총 수익률"));
        assert!(html.contains("12.34%"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_html_report_with_short_curve() {
        let dir = temp_dir("short");
        let path = dir.join("report.html");
        let curve = vec![sample_curve()[0]];

        write_html_report(&path, "리포트", &curve, &[]).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();

        // 점이 하나뿐이면 곡선 대신 안내 문구
        assert!(!html.contains("<polyline"));
        assert!(html.contains("데이터가 부족"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
