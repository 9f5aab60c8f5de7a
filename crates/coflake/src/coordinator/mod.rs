mod interface;
mod key;
mod memory;
mod retry;

pub use interface::*;
pub use key::*;
pub use memory::*;
pub use retry::*;
pub(crate) use retry::AttemptError;
