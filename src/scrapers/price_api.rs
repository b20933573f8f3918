use crate::errors::{Result, SectorHubError};
use crate::models::price::{DailyPriceRecord, PriceTable};
use crate::scrapers::base::HttpTransport;
use crate::scrapers::fetch::describe_status;
use crate::util;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const TIME_SERIES_KEY: &str = "Time Series (Daily)";

/// 接收每只股票成功获取的行情，用于边抓边写
pub trait PriceSink {
    fn persist(&mut self, symbol: &str, rows: &[DailyPriceRecord]) -> Result<()>;
}

/// 行情接口返回的单日数据，数值都是字符串
#[derive(Debug, Deserialize)]
struct RawDailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. adjusted close")]
    adjusted_close: Option<String>,
    #[serde(rename = "6. volume", alias = "5. volume")]
    volume: String,
    #[serde(rename = "7. dividend amount")]
    dividend_amount: Option<String>,
    #[serde(rename = "8. split coefficient")]
    split_coefficient: Option<String>,
}

impl RawDailyBar {
    fn into_record(self, symbol: &str, date: NaiveDate) -> Result<DailyPriceRecord> {
        let optional = |value: Option<String>| value.map(|v| util::parse_number(&v)).transpose();
        Ok(DailyPriceRecord {
            symbol: symbol.to_string(),
            date,
            open: util::parse_number(&self.open)?,
            high: util::parse_number(&self.high)?,
            low: util::parse_number(&self.low)?,
            close: util::parse_number(&self.close)?,
            adjusted_close: optional(self.adjusted_close)?,
            volume: util::parse_count(&self.volume)?,
            dividend_amount: optional(self.dividend_amount)?,
            split_coefficient: optional(self.split_coefficient)?.unwrap_or(1.0),
        })
    }
}

/// 解析日线调整行情，按日期降序返回
pub fn parse_daily_series(symbol: &str, body: &str) -> Result<Vec<DailyPriceRecord>> {
    let mut json: Value = serde_json::from_str(body)?;
    let series = json
        .get_mut(TIME_SERIES_KEY)
        .map(Value::take)
        .ok_or_else(|| SectorHubError::DataError(format!("response has no \"{}\" key", TIME_SERIES_KEY)))?;

    let bars: HashMap<String, RawDailyBar> = serde_json::from_value(series)?;
    let mut rows = bars
        .into_iter()
        .map(|(date, bar)| bar.into_record(symbol, util::parse_date(&date)?))
        .collect::<Result<Vec<_>>>()?;

    rows.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(rows)
}

/// 行情批量抓取的限速和重试参数
#[derive(Debug, Clone)]
pub struct PriceFetchSettings {
    pub rate_limit_delay: Duration,
    pub retry_delay: Duration,
    pub max_consecutive_unavailable: u32,
}

impl Default for PriceFetchSettings {
    fn default() -> Self {
        Self {
            rate_limit_delay: Duration::from_secs(12),
            retry_delay: Duration::from_secs(12),
            max_consecutive_unavailable: 10,
        }
    }
}

/// Alpha Vantage 日线行情客户端
pub struct PriceApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: String,
    settings: PriceFetchSettings,
}

impl PriceApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str, api_key: &str, settings: PriceFetchSettings) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            settings,
        }
    }

    fn query_url(&self, symbol: &str) -> String {
        format!(
            "{}?function=TIME_SERIES_DAILY_ADJUSTED&symbol={}&apikey={}",
            self.base_url, symbol, self.api_key
        )
    }

    /// 顺序抓取所有股票的日线行情
    ///
    /// 503 计数跨股票累计，只有成功响应才清零；达到上限即终止整个批次。
    /// 其他 HTTP 错误或无法解析的响应只跳过当前股票。
    pub async fn fetch_all(
        &self,
        symbols: &[String],
        mut sink: Option<&mut (dyn PriceSink + Send)>,
    ) -> Result<PriceTable> {
        if symbols.is_empty() {
            return Err(SectorHubError::EmptyInput(
                "Symbols list is empty. Nothing to request from the price API.".to_string(),
            ));
        }

        let mut table = PriceTable::new();
        let mut unavailable_streak = 0u32;

        for (i, symbol) in symbols.iter().enumerate() {
            let url = self.query_url(symbol);

            loop {
                let response = match self.transport.get(&url).await {
                    Ok(response) => response,
                    Err(e) => {
                        warn!("Request for {} failed: {}. Continuing with the remaining symbols.", symbol, e);
                        break;
                    }
                };

                if response.status == 503 {
                    unavailable_streak += 1;
                    if unavailable_streak >= self.settings.max_consecutive_unavailable {
                        error!(
                            "Hit {} consecutive 503 errors. Ending the run, check whether the price API is still online.",
                            unavailable_streak
                        );
                        return Err(SectorHubError::ServiceUnavailable {
                            symbol: symbol.clone(),
                            count: unavailable_streak,
                        });
                    }
                    warn!(
                        "{}. Retrying in {:?}. Current symbol is {}",
                        describe_status(503),
                        self.settings.retry_delay,
                        symbol
                    );
                    tokio::time::sleep(self.settings.retry_delay).await;
                    continue;
                }

                if !response.is_success() {
                    warn!("{} for {}. Skipping symbol.", describe_status(response.status), symbol);
                    break;
                }

                unavailable_streak = 0;
                match parse_daily_series(symbol, &response.body) {
                    Ok(rows) => {
                        debug!("{}: {} daily records", symbol, rows.len());
                        if let Some(sink) = sink.as_mut() {
                            sink.persist(symbol, &rows)?;
                        }
                        table.extend(rows);
                    }
                    Err(e) => {
                        warn!("Price API could not process {}: {}. Continuing with the remaining symbols.", symbol, e);
                    }
                }
                break;
            }

            if (i + 1) % 10 == 0 {
                info!("Finished API call for {} ({} of {})", symbol, i + 1, symbols.len());
            }

            // 接口限制每分钟 5 次请求
            if i + 1 != symbols.len() {
                tokio::time::sleep(self.settings.rate_limit_delay).await;
            }
        }

        Ok(table)
    }
}
