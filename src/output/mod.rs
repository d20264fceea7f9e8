// src/output/mod.rs
pub mod csv;
pub mod json;
pub mod latest;

pub use self::csv::{project_rows, write_csv};
pub use json::write_json;
pub use latest::{
    carry_forward, latest_summary, read_previous_blocks, write_latest, LatestBlock, LatestSummary,
};
