use chrono::NaiveDate;
use std::time::Duration;
use crate::errors::{Result, SectorHubError};

// 去掉千分位逗号后解析浮点数
pub fn parse_number(text: &str) -> Result<f64> {
    let cleaned = text.trim().replace(',', "");
    cleaned
        .parse::<f64>()
        .map_err(|e| SectorHubError::DataError(format!("Invalid number \"{}\": {}", text, e)))
}

// 整数字段，允许 "1,200" 和 "1200.0" 两种写法
pub fn parse_count(text: &str) -> Result<i64> {
    let cleaned = text.trim().replace(',', "");
    match cleaned.parse::<i64>() {
        Ok(value) => Ok(value),
        Err(_) => Ok(parse_number(&cleaned)? as i64),
    }
}

// 日期转换工具
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")?)
}

/// 按请求间隔估算批量抓取耗时（分钟，向上取整）
pub fn estimate_minutes(requests: usize, interval: Duration) -> u64 {
    let seconds = interval.as_secs().saturating_mul(requests as u64);
    (seconds + 59) / 60
}
