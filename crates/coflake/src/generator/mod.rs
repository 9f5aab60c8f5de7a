mod config;
mod coordinated;
mod policy;
pub(crate) mod state;

pub use config::*;
pub use coordinated::*;
pub use policy::*;
pub use state::Poll;
