use crate::errors::{Result, SectorHubError};
use crate::models::stock::{AddressFields, Classification, ProfileFields};
use crate::scrapers::base::{HttpTransport, ProfilePageExtractor};
use crate::scrapers::fetch::{fetch_with_retry, FetchOutcome, RetryPolicy};
use crate::util;
use log::{debug, warn};
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::Arc;

/// 地址末行为这些国家时，城市和邮编之间用逗号分隔
const COMMA_SEPARATED_COUNTRIES: [&str; 3] = ["United States", "Brazil", "Canada"];

/// 资料页各区域的 CSS 选择器，页面改版时只需替换这里
#[derive(Debug, Clone)]
pub struct ProfileSelectors {
    pub contact: String,
    pub classification: String,
    pub classification_value: String,
    pub description: String,
}

impl Default for ProfileSelectors {
    fn default() -> Self {
        Self {
            contact: r#"p[data-reactid="8"]"#.to_string(),
            classification: r#"p[class="D(ib) Va(t)"]"#.to_string(),
            classification_value: r#"span[class="Fw(600)"]"#.to_string(),
            description: r#"section[class="quote-sub-section Mt(30px)"] p[class="Mt(15px) Lh(1.6)"]"#.to_string(),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| SectorHubError::SelectorError(format!("{}: {:?}", selector, e)))
}

/// Yahoo Finance 公司资料页解析器
pub struct YahooProfileExtractor {
    contact: Selector,
    anchor: Selector,
    classification: Selector,
    classification_value: Selector,
    description: Selector,
}

impl YahooProfileExtractor {
    pub fn new() -> Result<Self> {
        Self::with_selectors(&ProfileSelectors::default())
    }

    pub fn with_selectors(selectors: &ProfileSelectors) -> Result<Self> {
        Ok(Self {
            contact: parse_selector(&selectors.contact)?,
            anchor: parse_selector("a")?,
            classification: parse_selector(&selectors.classification)?,
            classification_value: parse_selector(&selectors.classification_value)?,
            description: parse_selector(&selectors.description)?,
        })
    }

    /// 电话、网址、城市、国家
    pub fn extract_address(&self, document: &Html) -> AddressFields {
        let Some(paragraph) = document.select(&self.contact).next() else {
            debug!("Contact paragraph not found");
            return AddressFields::default();
        };

        // 链接按顺序依次填入电话和网址
        let mut links = paragraph
            .select(&self.anchor)
            .map(|a| a.text().collect::<String>().trim().to_string());
        let phone = links.next();
        let website = links.next();

        // 没有任何链接时无法定位地址
        if phone.is_none() {
            return AddressFields::default();
        }

        let text = text_with_line_breaks(paragraph);
        let (city, country) = split_city_country(&address_before(&text, phone.as_deref(), website.as_deref()));

        AddressFields { phone, website, city, country }
    }

    /// 板块、行业、员工数
    pub fn extract_classification(&self, document: &Html) -> Classification {
        let Some(paragraph) = document.select(&self.classification).next() else {
            debug!("Classification paragraph not found");
            return Classification::default();
        };

        let mut values = paragraph.select(&self.classification_value).map(|span| {
            let text = span.text().collect::<String>().trim().to_string();
            if text.is_empty() { None } else { Some(text) }
        });

        let sector = values.next().flatten();
        let industry = values.next().flatten();
        let fte = values
            .next()
            .flatten()
            .and_then(|text| match util::parse_count(&text) {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!("Could not parse employee count \"{}\": {}", text, e);
                    None
                }
            });

        Classification { sector, industry, fte }
    }

    pub fn extract_description(&self, document: &Html) -> Option<String> {
        document
            .select(&self.description)
            .next()
            .map(|p| p.text().collect::<String>().trim().to_string())
    }
}

impl ProfilePageExtractor for YahooProfileExtractor {
    fn extract(&self, html: &str) -> ProfileFields {
        let document = Html::parse_document(html);
        ProfileFields {
            address: self.extract_address(&document),
            classification: self.extract_classification(&document),
            description: self.extract_description(&document),
        }
    }
}

/// 元素文本，`<br>` 转为换行
fn text_with_line_breaks(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if e.name() == "br" => text.push('\n'),
            _ => {}
        }
    }
    text
}

/// 地址是电话（或网址）之前的文本
fn address_before(text: &str, phone: Option<&str>, website: Option<&str>) -> String {
    let text = text.trim();
    let marker = match (phone, website) {
        (Some(p), _) if !p.is_empty() => Some(p),
        (_, Some(w)) if !w.is_empty() => Some(w),
        _ => None,
    };

    match marker {
        Some(m) => text
            .split(&format!("\n{}", m))
            .next()
            .unwrap_or_default()
            .trim_end()
            .to_string(),
        None => text.to_string(),
    }
}

/// 从多行地址中取城市和国家
pub(crate) fn split_city_country(address: &str) -> (Option<String>, Option<String>) {
    if address.trim().is_empty() {
        return (None, None);
    }

    let lines: Vec<&str> = address.lines().map(str::trim).collect();
    let country = lines.last().map(|c| c.to_string());
    if lines.len() < 2 {
        return (None, country);
    }

    let city_zip = lines[lines.len() - 2];
    let city = match country.as_deref() {
        Some(c) if COMMA_SEPARATED_COUNTRIES.contains(&c) => city_zip.split(',').next().unwrap_or(city_zip),
        _ => city_zip.rsplit_once(' ').map(|(city, _)| city).unwrap_or(city_zip),
    };

    (Some(city.trim().to_string()), country)
}

/// 公司资料补充器
pub struct ProfileEnricher {
    transport: Arc<dyn HttpTransport>,
    extractor: Arc<dyn ProfilePageExtractor>,
    base_url: String,
    policy: RetryPolicy,
}

impl ProfileEnricher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        extractor: Arc<dyn ProfilePageExtractor>,
        base_url: &str,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            extractor,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        }
    }

    pub fn profile_url(&self, symbol: &str) -> String {
        format!("{}/{}/profile?p={}", self.base_url, symbol, symbol)
    }

    /// 获取并解析单只股票的资料页
    pub async fn enrich(&self, symbol: &str) -> Result<ProfileFields> {
        let url = self.profile_url(symbol);
        match fetch_with_retry(self.transport.as_ref(), &url, &self.policy).await {
            FetchOutcome::Success { body, .. } => Ok(self.extractor.extract(&body)),
            FetchOutcome::Failure { message, .. } => Err(SectorHubError::ProfileUnavailable {
                symbol: symbol.to_string(),
                message,
            }),
        }
    }
}
