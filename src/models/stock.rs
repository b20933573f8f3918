use serde::{Deserialize, Serialize};

/// 筛选器表格中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerRow {
    pub symbol: String,
    pub name: String,
    pub close_price: f64,
    pub volatility: f64,
    pub avg_volume: i64,
}

/// 公司联系方式和地址
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressFields {
    pub phone: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// 板块、行业和全职员工数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub fte: Option<i64>,
}

/// 公司资料页提取结果，任何字段缺失都为 None
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub address: AddressFields,
    pub classification: Classification,
    pub description: Option<String>,
}

/// 合并筛选器与公司资料后的股票记录
///
/// 字段顺序即 symbols.csv 的列顺序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub symbol: String,
    pub name: String,
    pub close_price: f64,
    pub volatility: f64,
    pub avg_volume: i64,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub fte: Option<i64>,
    pub description: Option<String>,
}

impl SymbolRecord {
    pub const HEADERS: [&'static str; 13] = [
        "symbol",
        "name",
        "close_price",
        "volatility",
        "avg_volume",
        "phone",
        "website",
        "city",
        "country",
        "sector",
        "industry",
        "fte",
        "description",
    ];

    pub fn from_parts(row: ScreenerRow, profile: ProfileFields) -> Self {
        let ProfileFields { address, classification, description } = profile;
        Self {
            symbol: row.symbol,
            name: row.name,
            close_price: row.close_price,
            volatility: row.volatility,
            avg_volume: row.avg_volume,
            phone: address.phone,
            website: address.website,
            city: address.city,
            country: address.country,
            sector: classification.sector,
            industry: classification.industry,
            fte: classification.fte,
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_screener_row_with_profile() {
        let row = ScreenerRow {
            symbol: "AAPL".into(),
            name: "Apple Inc.".into(),
            close_price: 265.76,
            volatility: 1.2,
            avg_volume: 25_000_000,
        };
        let profile = ProfileFields {
            address: AddressFields {
                phone: Some("408-996-1010".into()),
                website: None,
                city: Some("Cupertino".into()),
                country: Some("United States".into()),
            },
            classification: Classification {
                sector: Some("Technology".into()),
                industry: Some("Consumer Electronics".into()),
                fte: Some(137_000),
            },
            description: None,
        };

        let record = SymbolRecord::from_parts(row, profile);
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.city.as_deref(), Some("Cupertino"));
        assert_eq!(record.sector.as_deref(), Some("Technology"));
        assert_eq!(record.fte, Some(137_000));
        assert!(record.website.is_none());
    }
}
