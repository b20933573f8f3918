pub mod stock;
pub mod price;
pub mod sector;
