use crate::analysis::SectorAnalysis;
use crate::errors::{Result, SectorHubError};
use crate::models::price::{DailyPriceRecord, PriceTable};
use crate::models::sector::{PerformanceSeries, SectorIndex};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::HashMap;

/// 采样窗口：从第 span 个最近交易日起每 step 天取一次，最后总是包含最近一天
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingWindow {
    pub span: usize,
    pub step: usize,
}

impl Default for SamplingWindow {
    fn default() -> Self {
        Self { span: 100, step: 5 }
    }
}

impl SamplingWindow {
    pub fn new(span: usize, step: usize) -> Self {
        Self { span, step: step.max(1) }
    }

    /// 相对降序日期表的偏移量，由旧到新
    pub fn offsets(&self) -> Vec<usize> {
        if self.span == 0 {
            return Vec::new();
        }
        let mut offsets: Vec<usize> = (0..self.span).rev().step_by(self.step.max(1)).collect();
        if offsets.last() != Some(&0) {
            offsets.push(0);
        }
        offsets
    }
}

/// 板块表现计算：固定金额买入一篮子股票，之后按采样日估值
pub struct SectorAnalyzer {
    window: SamplingWindow,
    notional: f64,
}

impl SectorAnalyzer {
    pub fn new(window: SamplingWindow, notional: f64) -> Self {
        Self { window, notional }
    }

    pub fn window(&self) -> SamplingWindow {
        self.window
    }

    /// 采样日期，由旧到新
    pub fn sampled_dates(&self, prices: &PriceTable) -> Result<Vec<NaiveDate>> {
        let dates = prices.trading_dates_desc();
        if dates.len() < self.window.span {
            return Err(SectorHubError::InsufficientHistory {
                needed: self.window.span,
                available: dates.len(),
            });
        }
        Ok(self.window.offsets().into_iter().map(|offset| dates[offset]).collect())
    }

    pub fn analyze(&self, index: &SectorIndex, prices: &PriceTable) -> Result<SectorAnalysis> {
        if index.is_empty() {
            return Err(SectorHubError::EmptyInput("Sector index is empty, nothing to analyze.".to_string()));
        }

        let dates = self.sampled_dates(prices)?;
        let days: Vec<HashMap<&str, &DailyPriceRecord>> = dates.iter().map(|d| prices.on_date(*d)).collect();
        let mut series = PerformanceSeries::new();

        for (sector, symbols) in index.iter() {
            let basket = canonical_symbols(symbols, &days);
            if basket.is_empty() {
                warn!("Sector {} has no priced symbols in the sampling window, skipped", sector);
                continue;
            }
            debug!("Sector {}: {} of {} symbols in basket", sector, basket.len(), symbols.len());

            let values = self.basket_values(sector, &basket, &days);
            series.push(sector, normalize(sector, &values)?);
        }

        info!("Analyzed {} sectors over {} sampled dates", series.len(), dates.len());
        Ok(SectorAnalysis { series, dates })
    }

    /// 首个采样日用固定金额买入，之后每个采样日按开盘价和拆股系数估值
    fn basket_values(&self, sector: &str, basket: &[&str], days: &[HashMap<&str, &DailyPriceRecord>]) -> Vec<f64> {
        let shares: Vec<f64> = basket
            .iter()
            .map(|symbol| match days.first().and_then(|day| day.get(symbol)) {
                Some(bar) if bar.open > 0.0 => self.notional / bar.open,
                _ => {
                    warn!("{} ({}) has no usable open price on the first sampled date", symbol, sector);
                    0.0
                }
            })
            .collect();

        days.iter()
            .map(|day| {
                basket
                    .iter()
                    .zip(&shares)
                    .filter_map(|(symbol, shares)| day.get(symbol).map(|bar| shares * bar.open * bar.split_coefficient))
                    .sum()
            })
            .collect()
    }
}

/// 各采样日中该板块出现的股票集合，取数量最少的一组（并列取最早）
pub(crate) fn canonical_symbols<'a>(
    symbols: &'a [String],
    days: &[HashMap<&str, &DailyPriceRecord>],
) -> Vec<&'a str> {
    let mut smallest: Option<Vec<&str>> = None;
    for day in days {
        let present: Vec<&str> = symbols
            .iter()
            .map(String::as_str)
            .filter(|s| day.contains_key(s))
            .collect();
        if smallest.as_ref().map_or(true, |current| present.len() < current.len()) {
            smallest = Some(present);
        }
    }
    smallest.unwrap_or_default()
}

/// 相对首个值的百分比变化；基准为零时沿用上一个值，没有上一个值则终止
pub(crate) fn normalize(sector: &str, values: &[f64]) -> Result<Vec<f64>> {
    let mut normalized: Vec<f64> = Vec::with_capacity(values.len());
    let baseline = values.first().copied().unwrap_or(0.0);

    for value in values {
        if baseline == 0.0 {
            match normalized.last().copied() {
                Some(previous) => normalized.push(previous),
                None => {
                    return Err(SectorHubError::DegenerateBaseline { sector: sector.to_string() });
                }
            }
        } else {
            normalized.push(100.0 * (value / baseline) - 100.0);
        }
    }

    Ok(normalized)
}
