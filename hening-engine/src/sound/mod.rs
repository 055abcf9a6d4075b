//! Sound assets, handles and the resource pool
//!
//! The pool loads a fixed catalog once at process start and owns one
//! [`SoundHandle`] per entry for the process lifetime. Sessions and previews
//! borrow handles; they never load or unload assets themselves.

pub mod asset;
pub mod backend;
pub mod handle;
pub mod pool;

pub use asset::{default_catalog, SoundAsset, SoundCategory, NO_SOUND};
pub use backend::{SoundBackend, Voice};
pub use handle::{PlayerState, SoundHandle};
pub use pool::{PoolReport, SoundPool};
