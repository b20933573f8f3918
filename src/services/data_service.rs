use crate::analysis::{ChartRenderer, SamplingWindow, SectorAnalysis, SectorAnalyzer, SvgChartRenderer};
use crate::config::Config;
use crate::data_provider::StoredDataProvider;
use crate::errors::{Result, SectorHubError};
use crate::models::price::PriceTable;
use crate::models::sector::SectorIndex;
use crate::scrapers::base::HttpTransport;
use crate::scrapers::fetch::{ReqwestTransport, RetryPolicy};
use crate::scrapers::price_api::{PriceApiClient, PriceFetchSettings};
use crate::scrapers::profile::{ProfileEnricher, YahooProfileExtractor};
use crate::scrapers::screener::{ScrapeResult, ScreenerPaginator, SwingTradeBotExtractor};
use crate::storage::csv_writer::{IncrementalCsvWriter, WriteOutcome};
use crate::storage::tables::{self, PriceFileSink};
use crate::util;
use log::{error, info, warn};
use std::sync::Arc;

/// 数据服务，串联抓取、行情获取、分析和存储
pub struct DataService {
    config: Config,
    transport: Arc<dyn HttpTransport>,
    writer: IncrementalCsvWriter,
    renderer: Box<dyn ChartRenderer>,
}

impl DataService {
    /// 创建新的数据服务实例
    pub fn new(config: Config) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
        let writer = IncrementalCsvWriter::new(config.lock_policy);
        Ok(Self::with_parts(config, transport, writer, Box::new(SvgChartRenderer::new())))
    }

    pub fn with_parts(
        config: Config,
        transport: Arc<dyn HttpTransport>,
        writer: IncrementalCsvWriter,
        renderer: Box<dyn ChartRenderer>,
    ) -> Self {
        Self {
            config,
            transport,
            writer,
            renderer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 加载之前保存的股票列表和行情
    pub fn load_provider(&self) -> Result<StoredDataProvider> {
        StoredDataProvider::load(&self.config.symbols_path(), &self.config.prices_path())
    }

    /// 抓取筛选器和公司资料页；完整成功且需要保存时写入股票列表
    pub async fn scrape_symbols(&mut self) -> Result<ScrapeResult> {
        let pages = self.config.max_page.saturating_sub(1);
        info!(
            "Scraping {} screener pages and their profile pages. Each page has about 20 symbols.",
            pages
        );

        let enricher = ProfileEnricher::new(
            self.transport.clone(),
            Arc::new(YahooProfileExtractor::new()?),
            &self.config.profile_url,
            RetryPolicy::profile(self.config.profile_retry_delay),
        );
        let paginator = ScreenerPaginator::new(
            self.transport.clone(),
            Arc::new(SwingTradeBotExtractor::new()?),
            enricher,
            &self.config.screener_url,
            RetryPolicy::screener(self.config.page_retry_delay),
        );

        let result = paginator.scrape(self.config.max_page).await?;

        if result.outcome.is_success() {
            if result.records.is_empty() {
                return Err(SectorHubError::EmptyInput(
                    "Symbols list is empty. The screener returned no rows, nothing was saved.".to_string(),
                ));
            }
            info!("{} ({} symbols)", result.outcome.message(), result.records.len());
            if self.config.overwrite {
                let path = self.config.symbols_path();
                if let WriteOutcome::Skipped { reason } = tables::save_symbols(&mut self.writer, &path, &result.records)? {
                    warn!("Symbols were not saved: {}", reason);
                }
            }
        } else {
            error!("{}", result.outcome.message());
            error!("Scraping was unsuccessful. Check the error message for an internet or HTTP issue.");
        }

        Ok(result)
    }

    /// 逐个获取日线行情，需要保存时边抓边写
    pub async fn fetch_prices(&mut self, symbols: &[String]) -> Result<PriceTable> {
        if symbols.is_empty() {
            return Err(SectorHubError::EmptyInput(
                "Symbols list is empty. File is possibly empty. Check file and rerun.".to_string(),
            ));
        }

        info!(
            "The price API allows 5 calls a minute. This step will take roughly {} minutes for {} symbols.",
            util::estimate_minutes(symbols.len(), self.config.rate_limit_delay),
            symbols.len()
        );

        let client = PriceApiClient::new(
            self.transport.clone(),
            &self.config.price_api_url,
            &self.config.api_key,
            PriceFetchSettings {
                rate_limit_delay: self.config.rate_limit_delay,
                retry_delay: self.config.price_retry_delay,
                max_consecutive_unavailable: self.config.max_consecutive_unavailable,
            },
        );

        let prices = if self.config.overwrite {
            let path = self.config.prices_path();
            let mut sink = PriceFileSink::new(&mut self.writer, path.clone());
            let prices = client.fetch_all(symbols, Some(&mut sink)).await?;
            info!("{} was created or updated.", path.display());
            prices
        } else {
            client.fetch_all(symbols, None).await?
        };

        info!("Fetched {} price rows for {} symbols", prices.len(), prices.symbols().len());
        Ok(prices)
    }

    /// 计算板块表现，需要保存时写出汇总表和图表
    pub fn analyze_sectors(&mut self, index: &SectorIndex, prices: &PriceTable) -> Result<SectorAnalysis> {
        let window = SamplingWindow::new(self.config.window_span, self.config.window_step);
        let analysis = SectorAnalyzer::new(window, self.config.notional).analyze(index, prices)?;

        if self.config.overwrite {
            let summary = self.config.summary_path();
            match tables::save_sector_summary(&mut self.writer, &summary, &analysis)? {
                WriteOutcome::Skipped { reason } => warn!("Sector summary was not saved: {}", reason),
                _ => info!("{} was generated.", summary.display()),
            }
            self.renderer.render(&analysis.series, &analysis.dates, &self.config.chart_path())?;
        }

        if let Some(description) = analysis.describe_best(window.span) {
            info!("{}", description);
        }
        if let Some((sector, _)) = analysis.series.best() {
            let symbols = index.get(sector).unwrap_or_default();
            info!("Stocks within the {} sector: {:?}", sector, symbols);
        }

        Ok(analysis)
    }

    /// 完整流程：抓取、行情、分析
    pub async fn run_pipeline(&mut self) -> Result<SectorAnalysis> {
        let scraped = self.scrape_symbols().await?;
        let symbols = scraped.symbols();
        let prices = self.fetch_prices(&symbols).await?;
        self.analyze_sectors(&scraped.sector_index, &prices)
    }

    /// 用已保存的股票列表重新获取行情
    pub async fn refresh_prices(&mut self) -> Result<PriceTable> {
        let provider = self.load_provider()?;
        self.fetch_prices(&provider.symbols()).await
    }

    /// 只用已保存的文件做分析
    pub fn analyze_stored(&mut self) -> Result<SectorAnalysis> {
        let provider = self.load_provider()?;
        self.analyze_sectors(provider.sector_index(), provider.prices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LockPolicy;
    use crate::scrapers::base::HttpResponse;
    use crate::scrapers::testing::{screener_page, sector_profile, FakeTransport};
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn config(dir: &std::path::Path) -> Config {
        Config::new()
            .with_data_dir(dir.to_str().unwrap())
            .with_max_page(2)
            .with_overwrite(true)
            .with_api_key("demo")
            .with_screener_url("https://screener.test/equities?sort=average_daily_volume")
            .with_profile_url("https://profile.test/quote")
            .with_price_api_url("https://prices.test/query")
            .with_delays(Duration::ZERO, Duration::ZERO)
            .with_window(3, 1)
            .with_lock_policy(LockPolicy::Skip)
    }

    fn series(opens: &[(&str, &str)]) -> String {
        let days: Vec<String> = opens
            .iter()
            .map(|(date, open)| {
                format!(
                    r#""{}": {{"1. open": "{o}", "2. high": "{o}", "3. low": "{o}", "4. close": "{o}", "5. adjusted close": "{o}", "6. volume": "100", "7. dividend amount": "0.0", "8. split coefficient": "1.0"}}"#,
                    date,
                    o = open
                )
            })
            .collect();
        format!(r#"{{"Time Series (Daily)": {{{}}}}}"#, days.join(","))
    }

    fn service(dir: &std::path::Path, transport: Arc<FakeTransport>) -> DataService {
        DataService::with_parts(
            config(dir),
            transport,
            IncrementalCsvWriter::new(LockPolicy::Skip),
            Box::new(SvgChartRenderer::new()),
        )
    }

    #[tokio::test]
    async fn pipeline_writes_all_outputs() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(
            FakeTransport::new()
                .route(
                    "screener.test",
                    vec![HttpResponse::new(
                        200,
                        screener_page(&[
                            ("AAA", "Aaa Inc", "10.00", "1.5", "2,000"),
                            ("BBB", "Bbb Inc", "5.00", "0.5", "1,000"),
                        ]),
                    )],
                )
                .route("profile.test", vec![HttpResponse::new(200, sector_profile("Technology"))])
                .route(
                    "symbol=AAA",
                    vec![HttpResponse::new(200, series(&[("2024-01-04", "10"), ("2024-01-03", "20"), ("2024-01-02", "10")]))],
                )
                .route(
                    "symbol=BBB",
                    vec![HttpResponse::new(200, series(&[("2024-01-04", "10"), ("2024-01-03", "5"), ("2024-01-02", "5")]))],
                ),
        );
        let mut service = service(dir.path(), transport);

        let analysis = service.run_pipeline().await.unwrap();

        assert_eq!(analysis.series.get("Technology").unwrap(), &[0.0, 50.0, 50.0]);
        assert!(dir.path().join("symbols.csv").exists());
        assert!(dir.path().join("ninety_day_historical_prices.csv").exists());
        assert!(dir.path().join("sector_performances.svg").exists());
        let summary = fs::read_to_string(dir.path().join("sector_analysis.csv")).unwrap();
        assert_eq!(summary, "sector,2024-01-02,2024-01-03,2024-01-04\nTechnology,0,50,50\n");

        // 之后可以只用保存的文件重新分析
        let again = service.analyze_stored().unwrap();
        assert_eq!(again.series, analysis.series);
    }

    #[tokio::test]
    async fn empty_symbol_list_aborts_before_any_request_or_write() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(FakeTransport::new());
        let mut service = service(dir.path(), transport.clone());

        let err = service.fetch_prices(&[]).await.unwrap_err();

        assert!(matches!(err, SectorHubError::EmptyInput(_)));
        assert!(err.is_fatal());
        assert!(transport.calls().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn aborted_scrape_keeps_partial_results_but_writes_nothing() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(
            FakeTransport::new()
                .route("screener.test", vec![HttpResponse::new(503, "")]),
        );
        let mut service = service(dir.path(), transport);

        let result = service.scrape_symbols().await.unwrap();

        assert!(!result.outcome.is_success());
        assert!(result.records.is_empty());
        assert!(!dir.path().join("symbols.csv").exists());
    }

    #[tokio::test]
    async fn pipeline_with_no_pages_writes_no_files() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(FakeTransport::new());
        let mut service = DataService::with_parts(
            config(dir.path()).with_max_page(1),
            transport.clone(),
            IncrementalCsvWriter::new(LockPolicy::Skip),
            Box::new(SvgChartRenderer::new()),
        );

        let err = service.run_pipeline().await.unwrap_err();

        assert!(matches!(err, SectorHubError::EmptyInput(_)));
        assert!(transport.calls().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn analyze_without_saved_symbols_is_empty_input() {
        let dir = tempdir().unwrap();
        let mut service = service(dir.path(), Arc::new(FakeTransport::new()));

        assert!(matches!(service.analyze_stored(), Err(SectorHubError::EmptyInput(_))));
    }
}
