pub mod alias;
pub mod family;
pub mod types;

pub use alias::{AliasTable, FieldAlias};
pub use family::{SourceFamily, DIVIDEND_YIELD, HOME_PRICE, STOCK_MARKET};
pub use types::{CanonicalRecord, FieldValue, RawSheet, Scalar};
