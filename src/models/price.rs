use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

fn default_split_coefficient() -> f64 {
    1.0
}

/// 单只股票单个交易日的行情
///
/// 列名沿用行情接口返回的字段名，写入价格文件时保持一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPriceRecord {
    pub symbol: String,
    pub date: NaiveDate,
    #[serde(rename = "1. open")]
    pub open: f64,
    #[serde(rename = "2. high")]
    pub high: f64,
    #[serde(rename = "3. low")]
    pub low: f64,
    #[serde(rename = "4. close")]
    pub close: f64,
    #[serde(rename = "5. adjusted close")]
    pub adjusted_close: Option<f64>,
    #[serde(rename = "6. volume")]
    pub volume: i64,
    #[serde(rename = "7. dividend amount")]
    pub dividend_amount: Option<f64>,
    #[serde(rename = "8. split coefficient", default = "default_split_coefficient")]
    pub split_coefficient: f64,
}

impl DailyPriceRecord {
    pub const HEADERS: [&'static str; 10] = [
        "symbol",
        "date",
        "1. open",
        "2. high",
        "3. low",
        "4. close",
        "5. adjusted close",
        "6. volume",
        "7. dividend amount",
        "8. split coefficient",
    ];
}

/// 所有请求股票的行情集合
///
/// 行顺序为请求顺序拼接，每只股票内部保持接口返回顺序（日期降序）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    rows: Vec<DailyPriceRecord>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<DailyPriceRecord>) -> Self {
        Self { rows }
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = DailyPriceRecord>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[DailyPriceRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按首次出现顺序返回股票代码
    pub fn symbols(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.symbol.as_str()))
            .map(|r| r.symbol.as_str())
            .collect()
    }

    /// 所有出现过的交易日，降序
    pub fn trading_dates_desc(&self) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        dates.into_iter().rev().collect()
    }

    /// 指定日期下 symbol -> 行情 的索引
    pub fn on_date(&self, date: NaiveDate) -> HashMap<&str, &DailyPriceRecord> {
        self.rows
            .iter()
            .filter(|r| r.date == date)
            .map(|r| (r.symbol.as_str(), r))
            .collect()
    }
}
