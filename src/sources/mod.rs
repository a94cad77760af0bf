//! Package sources.
//!
//! The registry and cache layout on disk, the git driver that fills the
//! cache, and the lock that keeps concurrent runs out of it.

pub mod git;
pub mod layout;
pub mod lock;

pub use git::Git;
pub use layout::CacheLayout;
pub use lock::{CacheLock, LockError};
