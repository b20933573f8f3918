use crate::errors::{Result, SectorHubError};
use crate::models::sector::SectorIndex;
use crate::models::stock::{ScreenerRow, SymbolRecord};
use crate::scrapers::base::{HttpTransport, ScreenerPageExtractor};
use crate::scrapers::fetch::{fetch_with_retry, FetchOutcome, RetryPolicy};
use crate::scrapers::profile::ProfileEnricher;
use crate::util;
use log::{debug, info, warn};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;

/// SwingTradeBot 列表页解析器
pub struct SwingTradeBotExtractor {
    row: Selector,
    cell: Selector,
    anchor: Selector,
}

impl SwingTradeBotExtractor {
    pub fn new() -> Result<Self> {
        Self::with_row_selector("div.table-responsive tbody tr")
    }

    pub fn with_row_selector(row: &str) -> Result<Self> {
        let parse = |s: &str| {
            Selector::parse(s).map_err(|e| SectorHubError::SelectorError(format!("{}: {:?}", s, e)))
        };
        Ok(Self {
            row: parse(row)?,
            cell: parse("td")?,
            anchor: parse("a")?,
        })
    }
}

#[derive(Default)]
struct PartialRow {
    symbol: Option<String>,
    name: Option<String>,
    close_price: Option<f64>,
    volatility: Option<f64>,
    avg_volume: Option<f64>,
}

impl PartialRow {
    /// 数值按列顺序填入第一个空位，三个都填满后忽略其余列
    fn push_number(&mut self, text: &str) -> Result<()> {
        let slot = if self.close_price.is_none() {
            &mut self.close_price
        } else if self.volatility.is_none() {
            &mut self.volatility
        } else if self.avg_volume.is_none() {
            &mut self.avg_volume
        } else {
            return Ok(());
        };
        *slot = Some(util::parse_number(text)?);
        Ok(())
    }

    fn push_link(&mut self, text: String) {
        if self.symbol.is_none() {
            self.symbol = Some(text);
        } else if self.name.is_none() {
            self.name = Some(text);
        }
    }

    fn finish(self) -> Result<ScreenerRow> {
        let symbol = self
            .symbol
            .ok_or_else(|| SectorHubError::DataError("screener row without a symbol".to_string()))?;
        let missing = |field: &str| SectorHubError::DataError(format!("screener row {} has no {}", symbol, field));

        Ok(ScreenerRow {
            name: self.name.unwrap_or_default(),
            close_price: self.close_price.ok_or_else(|| missing("close price"))?,
            volatility: self.volatility.ok_or_else(|| missing("volatility"))?,
            avg_volume: self.avg_volume.ok_or_else(|| missing("average volume"))? as i64,
            symbol,
        })
    }
}

impl ScreenerPageExtractor for SwingTradeBotExtractor {
    fn extract_rows(&self, html: &str) -> Result<Vec<ScreenerRow>> {
        let document = Html::parse_document(html);
        let mut rows = Vec::new();

        for tr in document.select(&self.row) {
            let mut row = PartialRow::default();

            for td in tr.select(&self.cell) {
                // 代码和名称在 <a> 中，数值直接是单元格文本
                match td.select(&self.anchor).next() {
                    Some(a) => row.push_link(a.text().collect::<String>().trim().to_string()),
                    None => {
                        let text = td.text().collect::<String>();
                        let text = text.trim();
                        if !text.is_empty() {
                            row.push_number(text)?;
                        }
                    }
                }
            }

            rows.push(row.finish()?);
        }

        Ok(rows)
    }
}

/// 抓取的结束状态
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Complete { message: String },
    Aborted { page: u32, message: String },
}

impl ScrapeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScrapeOutcome::Complete { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            ScrapeOutcome::Complete { message } | ScrapeOutcome::Aborted { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub records: Vec<SymbolRecord>,
    pub sector_index: SectorIndex,
    pub outcome: ScrapeOutcome,
}

impl ScrapeResult {
    fn aborted(records: Vec<SymbolRecord>, sector_index: SectorIndex, page: u32, message: String) -> Self {
        Self {
            records,
            sector_index,
            outcome: ScrapeOutcome::Aborted { page, message },
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        self.records.iter().map(|r| r.symbol.clone()).collect()
    }
}

/// 筛选器分页抓取，每行立即通过资料页补充信息
pub struct ScreenerPaginator {
    transport: Arc<dyn HttpTransport>,
    extractor: Arc<dyn ScreenerPageExtractor>,
    enricher: ProfileEnricher,
    base_url: String,
    policy: RetryPolicy,
}

impl ScreenerPaginator {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        extractor: Arc<dyn ScreenerPageExtractor>,
        enricher: ProfileEnricher,
        base_url: &str,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            extractor,
            enricher,
            base_url: base_url.to_string(),
            policy,
        }
    }

    pub fn page_url(&self, page: u32) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", self.base_url, separator, page)
    }

    /// 抓取 [1, max_page) 页。页面请求失败时返回已收集的部分结果
    pub async fn scrape(&self, max_page: u32) -> Result<ScrapeResult> {
        let mut records = Vec::new();
        let mut sector_index = SectorIndex::new();
        let mut seen: HashSet<String> = HashSet::new();

        for page in 1..max_page {
            let url = self.page_url(page);
            let body = match fetch_with_retry(self.transport.as_ref(), &url, &self.policy).await {
                FetchOutcome::Success { body, .. } => body,
                FetchOutcome::Failure { message, .. } => {
                    warn!("Scraping page {} failed, keeping {} symbols collected so far", page, records.len());
                    let message = format!("{} The page_num was {}.", message, page);
                    return Ok(ScrapeResult::aborted(records, sector_index, page, message));
                }
            };

            let rows = self.extractor.extract_rows(&body)?;
            debug!("Page {} has {} rows", page, rows.len());

            for row in rows {
                let symbol = row.symbol.clone();
                // 代码唯一，翻页时重复出现的只保留第一次
                if seen.contains(&symbol) {
                    debug!("{} already scraped, skipping repeat on page {}", symbol, page);
                    continue;
                }
                let profile = match self.enricher.enrich(&symbol).await {
                    Ok(profile) => profile,
                    Err(e @ SectorHubError::ProfileUnavailable { .. }) => {
                        let message = format!("{} The page_num was {}.", e, page);
                        return Ok(ScrapeResult::aborted(records, sector_index, page, message));
                    }
                    Err(e) => return Err(e),
                };

                let record = SymbolRecord::from_parts(row, profile);
                match record.sector.as_deref() {
                    Some(sector) => sector_index.insert(sector, &record.symbol),
                    None => debug!("{} has no sector, not indexed", record.symbol),
                }
                seen.insert(symbol.clone());
                records.push(record);

                if records.len() % 10 == 0 {
                    info!("Scraped {} symbols (latest {})", records.len(), symbol);
                }
            }

            info!("Finished scraping symbols from the screener and profile pages for page {}.", page);
        }

        Ok(ScrapeResult {
            records,
            sector_index,
            outcome: ScrapeOutcome::Complete {
                message: "Successfully scraped the screener and profile pages".to_string(),
            },
        })
    }
}
