pub mod config;
pub mod error;
pub mod types;

pub use error::{PdropError, PdropResult};
pub use types::File;
