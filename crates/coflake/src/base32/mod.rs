mod crockford;
mod error;
mod snowflake;

pub use error::*;
pub use snowflake::*;
