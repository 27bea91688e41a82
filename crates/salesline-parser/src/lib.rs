pub mod errors;
pub mod loader;
pub mod model;
pub mod schema;
mod values;

pub use errors::{LoadError, ParseError, RowError};
pub use loader::{
    decode_lossy, load_sales_bytes, load_sales_file, LoadOptions, DEFAULT_MAX_INVALID_FRACTION,
};
pub use model::{DateOrder, LoadedTable, SalesRecord};
pub use schema::{normalize_header, SourceColumn, REQUIRED_COLUMNS};
