// 三张输出表的读写
use crate::analysis::SectorAnalysis;
use crate::errors::Result;
use crate::models::price::{DailyPriceRecord, PriceTable};
use crate::models::stock::SymbolRecord;
use crate::scrapers::price_api::PriceSink;
use crate::storage::csv_writer::{IncrementalCsvWriter, WriteOutcome};
use log::{debug, info, warn};
use std::fs::File;
use std::path::{Path, PathBuf};

/// 写入 symbols.csv，每次都重建
pub fn save_symbols(writer: &mut IncrementalCsvWriter, path: &Path, records: &[SymbolRecord]) -> Result<WriteOutcome> {
    info!("Saving {} symbols to {}", records.len(), path.display());
    writer.write(path, &SymbolRecord::HEADERS, records, true)
}

pub fn read_symbols(path: &Path) -> Result<Vec<SymbolRecord>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let records = reader.deserialize().collect::<std::result::Result<Vec<SymbolRecord>, _>>()?;
    Ok(records)
}

pub fn read_prices(path: &Path) -> Result<PriceTable> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<DailyPriceRecord>, _>>()?;
    Ok(PriceTable::from_rows(rows))
}

/// 板块汇总表：首列为板块，之后每个采样日期一列
pub fn save_sector_summary(
    writer: &mut IncrementalCsvWriter,
    path: &Path,
    analysis: &SectorAnalysis,
) -> Result<WriteOutcome> {
    let mut headers = vec!["sector".to_string()];
    headers.extend(analysis.dates.iter().map(|d| d.to_string()));

    let rows: Vec<Vec<String>> = analysis
        .series
        .iter()
        .map(|(sector, values)| {
            let mut row = vec![sector.to_string()];
            row.extend(values.iter().map(|v| v.to_string()));
            row
        })
        .collect();

    writer.write(path, &headers, &rows, true)
}

/// 行情边抓边写入价格文件，本次运行第一次写入时重建文件
pub struct PriceFileSink<'a> {
    writer: &'a mut IncrementalCsvWriter,
    path: PathBuf,
}

impl<'a> PriceFileSink<'a> {
    pub fn new(writer: &'a mut IncrementalCsvWriter, path: PathBuf) -> Self {
        Self { writer, path }
    }
}

impl PriceSink for PriceFileSink<'_> {
    fn persist(&mut self, symbol: &str, rows: &[DailyPriceRecord]) -> Result<()> {
        match self.writer.write_incremental(&self.path, &DailyPriceRecord::HEADERS, rows, true)? {
            WriteOutcome::Skipped { reason } => warn!("Prices for {} were not saved: {}", symbol, reason),
            outcome => debug!("Prices for {} saved: {:?}", symbol, outcome),
        }
        Ok(())
    }
}
