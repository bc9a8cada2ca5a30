pub mod config;
pub mod error;

pub use config::K25519Config;
pub use error::{CoreError, CoreResult};
