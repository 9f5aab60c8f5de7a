mod decoded;
mod snowflake;

pub use decoded::*;
pub use snowflake::*;
