// src/schema/family.rs
//! The publisher layouts we know how to read.

use once_cell::sync::Lazy;

use super::alias::AliasTable;
use crate::process::date_parser::DateEncoding;

/// Marker in `latest_fields` for the derived dividend yield.
pub const DIVIDEND_YIELD: &str = "dividend_yield";

/// Inputs of the derived dividend yield in the latest summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YieldFields {
    pub dividend: &'static str,
    pub price: &'static str,
}

/// Static description of one publisher layout.
#[derive(Debug, Clone)]
pub struct SourceFamily {
    /// Stable id, also used as the output file stem.
    pub id: &'static str,
    pub file_name: &'static str,
    pub sheet_name: &'static str,
    pub header_offset: usize,
    pub aliases: AliasTable,
    pub date_field: &'static str,
    pub encoding: DateEncoding,
    /// Drop rows with no date before resolving (footnotes under the data).
    pub skip_undated_rows: bool,
    pub source: &'static str,
    pub description: &'static str,
    /// Columns of the flat CSV projection, in order.
    pub csv_columns: &'static [&'static str],
    /// Key of this family's block in `latest.json`.
    pub latest_key: &'static str,
    /// Fields of the latest block after `date`, in output order.
    pub latest_fields: &'static [&'static str],
    pub latest_yield: Option<YieldFields>,
}

pub static STOCK_MARKET: Lazy<SourceFamily> = Lazy::new(|| SourceFamily {
    id: "stock_market_data",
    file_name: "ie_data.xls",
    sheet_name: "Data",
    header_offset: 7,
    aliases: AliasTable::builder()
        .field("date", &["Date"])
        .field("sp500", &["P", "S&P Comp."])
        .field("dividend", &["D", "Dividend"])
        .field("earnings", &["E", "Earnings"])
        .field("cpi", &["CPI"])
        .field("date_fraction", &["Fraction", "Date.1"])
        .field("long_interest_rate", &["Rate GS10", "Long Interest Rate GS10"])
        .field("real_price", &["Price", "Real Price"])
        .field("real_dividend", &["Real Dividend"])
        .field("real_total_return_price", &["Real Total Return Price"])
        .field("real_earnings", &["Real Earnings"])
        .field("real_tr_scaled_earnings", &["Real TR Scaled Earnings"])
        .field("cape", &["CAPE"])
        .field("tr_cape", &["TR CAPE"])
        .field("excess_cape_yield", &["Excess CAPE Yield"])
        .field("monthly_bond_returns", &["Monthly Total Bond Returns"])
        .field("real_total_bond_returns", &["Real Total Bond Returns"])
        .field(
            "annualized_stock_return_10y",
            &["10 Year Annualized Stock Real Return"],
        )
        .field(
            "annualized_bond_return_10y",
            &["10 Year Annualized Bond Real Return"],
        )
        .field(
            "real_excess_return_10y",
            &["Real 10 Year Excess Annualized Returns"],
        )
        .required("date")
        .build()
        .expect("stock market alias table should be unambiguous"),
    date_field: "date",
    encoding: DateEncoding::Fractional,
    skip_undated_rows: true,
    source: "Robert Shiller - Yale Economics",
    description:
        "U.S. Stock Market Data including S&P 500, earnings, dividends, and CAPE ratio",
    csv_columns: &[
        "date_string",
        "sp500",
        "dividend",
        "earnings",
        "cpi",
        "cape",
        "real_price",
        "real_dividend",
        "real_earnings",
        "long_interest_rate",
    ],
    latest_key: "stock_market",
    latest_fields: &["sp500", "cape", DIVIDEND_YIELD, "earnings", "cpi"],
    latest_yield: Some(YieldFields {
        dividend: "dividend",
        price: "sp500",
    }),
});

pub static HOME_PRICE: Lazy<SourceFamily> = Lazy::new(|| SourceFamily {
    id: "home_price_data",
    file_name: "Fig3-1.xls",
    sheet_name: "Data",
    header_offset: 3,
    aliases: AliasTable::builder()
        .field("date", &["Date"])
        .field("real_home_price_index", &["Real Home Price Index"])
        .field("building_cost_index", &["Building Cost Index"])
        .field("us_population_millions", &["US Population (millions)"])
        .field("long_rate", &["Long Rate"])
        .required("date")
        .build()
        .expect("home price alias table should be unambiguous"),
    date_field: "date",
    encoding: DateEncoding::PlainYear,
    skip_undated_rows: false,
    source: "Robert Shiller - Irrational Exuberance Figure 3.1",
    description: "U.S. Real Home Price Index and related data since 1890",
    csv_columns: &[
        "date_string",
        "real_home_price_index",
        "building_cost_index",
        "us_population_millions",
        "long_rate",
    ],
    latest_key: "home_prices",
    latest_fields: &[
        "real_home_price_index",
        "building_cost_index",
        "us_population_millions",
    ],
    latest_yield: None,
});

/// Every known family, in output order.
pub fn all() -> [&'static SourceFamily; 2] {
    [&*STOCK_MARKET, &*HOME_PRICE]
}

/// Look a family up by id or by its publisher file name.
pub fn find(name: &str) -> Option<&'static SourceFamily> {
    all()
        .into_iter()
        .find(|f| f.id == name || f.file_name.eq_ignore_ascii_case(name))
}
