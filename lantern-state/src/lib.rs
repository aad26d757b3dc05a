//! Lantern State Management
//!
//! Persists what Lantern knows about the sources it manages: their remote
//! identifiers and the attributes last read back from the remote API.
//!
//! - **StateFile**: every managed source, with a serial and a lineage
//! - **StateBackend**: where a state file is stored (only `local` so far)
//!
//! # Example
//!
//! ```ignore
//! use lantern_state::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::local(".lantern/state.json")).await?;
//! backend.init().await?;
//!
//! let mut state = backend.read_state().await?.unwrap_or_default();
//! // ... apply changes ...
//! state.next_serial();
//! backend.write_state(&state).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod state;

pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::create_backend;
pub use state::{ResourceState, STATE_FORMAT_VERSION, StateFile};
