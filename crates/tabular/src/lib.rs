//! Tabular Data
//!
//! A small header-plus-rows table read from and written to CSV, a numeric
//! column-major view of it, and a writer that only publishes complete files.

mod atomic;
mod error;
mod numeric;
mod table;

pub use atomic::AtomicWriter;
pub use error::TableError;
pub use numeric::NumericTable;
pub use table::Table;
