//! Post store backends - local file and Redis indexed layout.

mod local;

pub use local::LocalFileBackend;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisBackend;
#[cfg(feature = "redis")]
pub(crate) use self::redis::{Keys, unavailable};
