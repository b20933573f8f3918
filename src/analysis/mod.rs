pub mod sector_performance;
pub mod chart;

use crate::models::sector::PerformanceSeries;
use chrono::NaiveDate;

pub use sector_performance::{SamplingWindow, SectorAnalyzer};
pub use chart::{ChartRenderer, SvgChartRenderer};

/// 分析结果：各板块序列和对应的采样日期（升序）
#[derive(Debug, Clone, PartialEq)]
pub struct SectorAnalysis {
    pub series: PerformanceSeries,
    pub dates: Vec<NaiveDate>,
}

impl SectorAnalysis {
    /// 表现最好的板块的说明文字
    pub fn describe_best(&self, days: usize) -> Option<String> {
        let (sector, value) = self.series.best()?;
        let message = if value >= 0.0 {
            format!(
                "The best performing sector was {}, improving by {:.2} percent over the past {} days.",
                sector, value, days
            )
        } else {
            format!(
                "The best performing sector was {}, only decreasing by {:.2} percent over the past {} days.",
                sector, value, days
            )
        };
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_gain_and_loss() {
        let mut series = PerformanceSeries::new();
        series.push("Energy", vec![0.0, 12.345]);
        let analysis = SectorAnalysis { series, dates: Vec::new() };
        assert_eq!(
            analysis.describe_best(100).unwrap(),
            "The best performing sector was Energy, improving by 12.35 percent over the past 100 days."
        );

        let mut series = PerformanceSeries::new();
        series.push("Utilities", vec![0.0, -3.5]);
        let analysis = SectorAnalysis { series, dates: Vec::new() };
        assert!(analysis.describe_best(100).unwrap().contains("only decreasing by -3.50"));

        let empty = SectorAnalysis { series: PerformanceSeries::new(), dates: Vec::new() };
        assert!(empty.describe_best(100).is_none());
    }
}
