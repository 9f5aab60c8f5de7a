#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "base32")]
mod base32;
mod coordinator;
mod error;
#[cfg(feature = "futures")]
mod futures;
mod generator;
mod id;
mod mutex;
#[cfg(feature = "serde")]
pub mod serde;
mod time;

#[cfg_attr(docsrs, doc(cfg(feature = "base32")))]
#[cfg(feature = "base32")]
pub use crate::base32::*;
pub use crate::coordinator::*;
pub use crate::error::*;
#[cfg_attr(docsrs, doc(cfg(feature = "futures")))]
#[cfg(feature = "futures")]
pub use crate::futures::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
