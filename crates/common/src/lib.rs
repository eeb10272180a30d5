pub mod error;
pub mod units;

pub use error::{Error, Result};
pub use units::{from_bytes, parse_size, to_bytes, Unit};
