//! # impala-lineage
//!
//! A library for deriving best-effort lineage from Impala SQL scripts without a
//! grammar or a metastore.
//!
//! # Features
//!
//! - Quote- and parenthesis-aware scanning of scripts into statements and clauses.
//! - Destination detection for `insert`, `create table ... as select` and `create table ... like`.
//! - Recursive expansion of CTEs and derived tables into the physical tables they read.
//! - Column-level records with `copy`/expression transforms, falling back to table-level
//!   records for star projections and unusable select lists.
//! - Table-level edge summaries for graph viewers.
//!
//! # Example
//!
//! ```rust,no_run
//! use impala_lineage::{config::LineageConfig, lineage::extract_lineage, summary::table_edges};
//!
//! fn main() -> anyhow::Result<()> {
//!     env_logger::init();
//!
//!     let sql = r#"
//!         with recent as (select id, amount from sales.orders where dt > '2024-01-01')
//!         insert into mart.totals (id, total)
//!         select r.id, sum(r.amount) from recent r group by r.id;
//!
//!         create table mart.totals_bkp like mart.totals;
//!     "#;
//!     let records = extract_lineage(sql, &LineageConfig::default());
//!     println!("{}", serde_json::to_string_pretty(&records)?);
//!     println!("{}", serde_json::to_string_pretty(&table_edges(&records))?);
//!     Ok(())
//! }
//! ```
pub mod clause;
pub mod config;
pub mod cte;
pub mod lineage;
pub mod resolve;
pub mod scanner;
pub mod select_item;
pub mod summary;
pub mod target;
pub mod test_utils;
