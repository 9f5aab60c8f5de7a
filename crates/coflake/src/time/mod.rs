mod interface;
#[cfg(target_has_atomic = "64")]
mod mono_clock;
mod system;

pub use interface::*;
#[cfg(target_has_atomic = "64")]
pub use mono_clock::*;
pub use system::*;
