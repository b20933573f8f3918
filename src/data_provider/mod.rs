use log::{info, warn};

use crate::errors::{Result, SectorHubError};
use crate::models::price::PriceTable;
use crate::models::sector::SectorIndex;
use crate::models::stock::SymbolRecord;
use crate::storage::tables;
use std::collections::HashMap;
use std::path::Path;

/// 读取前几次运行写下的股票列表和行情文件
pub struct StoredDataProvider {
    records: Vec<SymbolRecord>,
    prices: PriceTable,
    // 索引用于快速查找
    symbol_index: HashMap<String, usize>,
    sector_index: SectorIndex,
}

impl StoredDataProvider {
    /// 从股票列表文件加载，行情文件不存在时为空表
    pub fn load(symbols_path: &Path, prices_path: &Path) -> Result<Self> {
        let records = if symbols_path.exists() {
            tables::read_symbols(symbols_path)?
        } else {
            warn!("{} does not exist", symbols_path.display());
            Vec::new()
        };

        if records.is_empty() {
            return Err(SectorHubError::EmptyInput(
                "Symbols list is empty. File is possibly empty. Check file and rerun.".to_string(),
            ));
        }

        let prices = if prices_path.exists() {
            tables::read_prices(prices_path)?
        } else {
            PriceTable::new()
        };

        info!(
            "Loaded {} symbols and {} price rows from {}",
            records.len(),
            prices.len(),
            symbols_path.parent().unwrap_or(symbols_path).display()
        );

        Self::new_with_data(records, prices)
    }

    /// 使用提供的数据创建实例
    pub fn new_with_data(records: Vec<SymbolRecord>, prices: PriceTable) -> Result<Self> {
        let mut provider = Self {
            records,
            prices,
            symbol_index: HashMap::new(),
            sector_index: SectorIndex::new(),
        };

        provider.rebuild_indices();

        Ok(provider)
    }

    pub fn records(&self) -> &[SymbolRecord] {
        &self.records
    }

    pub fn get_record_by_symbol(&self, symbol: &str) -> Option<&SymbolRecord> {
        self.symbol_index.get(symbol).map(|&idx| &self.records[idx])
    }

    /// 文件顺序的股票代码
    pub fn symbols(&self) -> Vec<String> {
        self.records.iter().map(|r| r.symbol.clone()).collect()
    }

    pub fn sector_index(&self) -> &SectorIndex {
        &self.sector_index
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn set_prices(&mut self, prices: PriceTable) {
        self.prices = prices;
    }

    /// 重建索引，没有板块的股票不进入板块索引
    fn rebuild_indices(&mut self) {
        self.symbol_index.clear();
        self.sector_index = SectorIndex::new();

        for (i, record) in self.records.iter().enumerate() {
            self.symbol_index.insert(record.symbol.clone(), i);

            if let Some(sector) = record.sector.as_deref().filter(|s| !s.is_empty()) {
                self.sector_index.insert(sector, &record.symbol);
            }
        }
    }
}
