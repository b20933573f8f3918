pub mod base;
pub mod fetch;
pub mod profile;
pub mod screener;
pub mod price_api;

#[cfg(test)]
pub(crate) mod testing;
