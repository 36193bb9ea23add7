pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ChannelIndex, Denomination, OpCode, StorageClass};
