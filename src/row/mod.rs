//! Row normalization: market metadata plus prices as one flat sheet row.

pub mod builder;
pub mod types;

pub use builder::{normalize, RowBuilder};
pub use types::{CellValue, PriceCell, PriceRow, NOT_AVAILABLE};
