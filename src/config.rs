use std::path::PathBuf;
use std::time::Duration;

/// 文件被占用时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPolicy {
    /// 报告后跳过本次写入
    Skip,
    /// 等待用户确认后无限重试
    Prompt,
}

pub struct Config {
    pub data_dir: String,
    pub max_page: u32,
    pub overwrite: bool,
    pub api_key: String,
    pub screener_url: String,
    pub profile_url: String,
    pub price_api_url: String,
    pub request_timeout: Duration,
    pub page_retry_delay: Duration,
    pub profile_retry_delay: Duration,
    pub price_retry_delay: Duration,
    pub rate_limit_delay: Duration,
    pub max_consecutive_unavailable: u32,
    pub window_span: usize,
    pub window_step: usize,
    pub notional: f64,
    pub lock_policy: LockPolicy,
    pub symbols_file: String,
    pub prices_file: String,
    pub summary_file: String,
    pub chart_file: String,
}

/// 筛选器固定查询参数，页码由调用方追加
const SCREENER_URL: &str = "https://swingtradebot.com/equities?adx_trend=&direction=desc&end_date=2019-11-15&grade=&grade_target=B&include_etfs=0&max_price=99999999999999.0&min_price=0.0&min_vol=0&optionable=false&sort=average_daily_volume&sort_by=average_daily_volume+ASC&trading_date=2019-11-15&weekly_options=false";

impl Config {
    pub fn new() -> Self {
        Self {
            data_dir: "data".to_string(),
            max_page: 11,
            overwrite: false,
            api_key: String::new(),
            screener_url: SCREENER_URL.to_string(),
            profile_url: "https://finance.yahoo.com/quote".to_string(),
            price_api_url: "https://www.alphavantage.co/query".to_string(),
            request_timeout: Duration::from_secs(30),
            page_retry_delay: Duration::from_secs(2),
            profile_retry_delay: Duration::from_secs(2),
            price_retry_delay: Duration::from_secs(12),
            rate_limit_delay: Duration::from_secs(12),
            max_consecutive_unavailable: 10,
            window_span: 100,
            window_step: 5,
            notional: 1000.0,
            lock_policy: LockPolicy::Prompt,
            symbols_file: "symbols.csv".to_string(),
            prices_file: "ninety_day_historical_prices.csv".to_string(),
            summary_file: "sector_analysis.csv".to_string(),
            chart_file: "sector_performances.svg".to_string(),
        }
    }

    pub fn with_data_dir(mut self, dir: &str) -> Self {
        self.data_dir = dir.to_string();
        self
    }

    pub fn with_max_page(mut self, max_page: u32) -> Self {
        self.max_page = max_page;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = key.to_string();
        self
    }

    pub fn with_screener_url(mut self, url: &str) -> Self {
        self.screener_url = url.to_string();
        self
    }

    pub fn with_profile_url(mut self, url: &str) -> Self {
        self.profile_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_price_api_url(mut self, url: &str) -> Self {
        self.price_api_url = url.to_string();
        self
    }

    /// 统一设置所有重试和限速等待，测试时常用 Duration::ZERO
    pub fn with_delays(mut self, retry: Duration, rate_limit: Duration) -> Self {
        self.page_retry_delay = retry;
        self.profile_retry_delay = retry;
        self.price_retry_delay = retry;
        self.rate_limit_delay = rate_limit;
        self
    }

    pub fn with_max_consecutive_unavailable(mut self, max: u32) -> Self {
        self.max_consecutive_unavailable = max;
        self
    }

    pub fn with_window(mut self, span: usize, step: usize) -> Self {
        self.window_span = span;
        self.window_step = step;
        self
    }

    pub fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    pub fn symbols_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.symbols_file)
    }

    pub fn prices_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.prices_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.summary_file)
    }

    pub fn chart_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.chart_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
