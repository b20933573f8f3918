// 公开导出的模块，供外部使用
pub mod models;
pub mod data_provider;
pub mod errors;
pub mod analysis;
pub mod storage;

// 为了支持主程序，这些模块保持公开
// 但在库使用场景中，一般通过 DataService 调用
#[doc(hidden)]
pub mod scrapers;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod services;
#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use models::stock::SymbolRecord;
pub use models::price::{DailyPriceRecord, PriceTable};
pub use models::sector::{PerformanceSeries, SectorIndex};
pub use analysis::SectorAnalysis;
pub use data_provider::StoredDataProvider;
pub use errors::{Result, SectorHubError};
