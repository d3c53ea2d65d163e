pub mod config;
pub mod error;
pub mod fields;
pub mod records;
pub mod safety;
pub mod types;

pub use config::Config;
pub use error::PolicyGlassError;
pub use fields::*;
pub use records::*;
pub use safety::*;
pub use types::*;
