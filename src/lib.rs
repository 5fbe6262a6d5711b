pub mod clock;
pub mod config;
pub mod date;
pub mod error;
pub mod payment;
pub mod restore;
pub mod source;
pub mod store;

#[cfg(test)]
mod test_support;

pub use clock::RunClock;
pub use config::ConvertConfig;
pub use date::DateFallback;
pub use error::{ConvertError, Result};
pub use payment::PaymentType;
