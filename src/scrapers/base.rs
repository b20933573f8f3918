use crate::models::stock::{ProfileFields, ScreenerRow};
use crate::errors::Result;
use async_trait::async_trait;

/// 一次 GET 请求的原始结果
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 所有远程数据源共用的 HTTP 传输接口
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 发送 GET 请求，非 2xx 状态不视为错误，只有连接层失败才返回 Err
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// 筛选器列表页解析，页面结构变动只影响实现
pub trait ScreenerPageExtractor: Send + Sync {
    fn extract_rows(&self, html: &str) -> Result<Vec<ScreenerRow>>;
}

/// 公司资料页解析，缺失的区域返回全部为 None 的字段
pub trait ProfilePageExtractor: Send + Sync {
    fn extract(&self, html: &str) -> ProfileFields;
}
