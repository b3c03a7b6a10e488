pub use constellation_core::error::{Error, Result};
