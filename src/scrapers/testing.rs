//! 测试用的脚本化传输层

use crate::errors::{Result, SectorHubError};
use crate::scrapers::base::{HttpResponse, HttpTransport};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

struct Route {
    pattern: String,
    responses: Mutex<VecDeque<HttpResponse>>,
    failing: bool,
}

/// 按 URL 子串匹配路由，依次返回预设响应，最后一个响应会一直重复
pub(crate) struct FakeTransport {
    routes: Vec<Route>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self { routes: Vec::new(), calls: Mutex::new(Vec::new()) }
    }

    pub(crate) fn route(mut self, pattern: &str, responses: Vec<HttpResponse>) -> Self {
        self.routes.push(Route {
            pattern: pattern.to_string(),
            responses: Mutex::new(responses.into()),
            failing: false,
        });
        self
    }

    pub(crate) fn failing(mut self, pattern: &str) -> Self {
        self.routes.push(Route {
            pattern: pattern.to_string(),
            responses: Mutex::new(VecDeque::new()),
            failing: true,
        });
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(url.to_string());

        let route = self
            .routes
            .iter()
            .find(|r| url.contains(&r.pattern))
            .ok_or_else(|| SectorHubError::Unknown(format!("no route for {}", url)))?;

        if route.failing {
            return Err(SectorHubError::Unknown("connection refused".to_string()));
        }

        let mut responses = route.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        response.ok_or_else(|| SectorHubError::Unknown(format!("no response scripted for {}", url)))
    }
}

/// 带完整联系方式、分类和简介的资料页
pub(crate) const APPLE_PROFILE: &str = r#"
        <html><body>
          <div>
            <p class="D(ib) W(47.727%) Pend(40px)" data-reactid="8">One Apple Park Way<br/>Cupertino, CA 95014<br/>United States<br/><a href="tel:4089961010">408 996 1010</a><br/><a href="http://www.apple.com">http://www.apple.com</a></p>
            <p class="D(ib) Va(t)"><span>Sector(s)</span>: <span class="Fw(600)">Technology</span><br/><span>Industry</span>: <span class="Fw(600)">Consumer Electronics</span><br/><span>Full Time Employees</span>: <span class="Fw(600)">137,000</span></p>
          </div>
          <section class="quote-sub-section Mt(30px)"><h2>Description</h2><p class="Mt(15px) Lh(1.6)">Apple Inc. designs, manufactures, and markets smartphones.</p></section>
        </body></html>
    "#;

/// 生成一页筛选器表格，每行 (代码, 名称, 收盘价, 波动率, 平均成交量)
pub(crate) fn screener_page(rows: &[(&str, &str, &str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(symbol, name, close, volatility, volume)| {
            format!(
                "<tr><td><a href=\"/stocks/{0}\">{0}</a></td><td><a href=\"/stocks/{0}\">{1}</a></td><td></td><td>{2}</td><td>{3}</td><td>{4}</td></tr>",
                symbol, name, close, volatility, volume
            )
        })
        .collect();
    format!(
        "<html><body><div class=\"table-responsive\"><table><thead><tr><th>Symbol</th></tr></thead><tbody>{}</tbody></table></div></body></html>",
        body
    )
}

/// 只有板块信息的资料页
pub(crate) fn sector_profile(sector: &str) -> String {
    format!(
        "<html><body><p class=\"D(ib) Va(t)\"><span class=\"Fw(600)\">{}</span><span class=\"Fw(600)\">Misc</span><span class=\"Fw(600)\">1,200</span></p></body></html>",
        sector
    )
}
