//! Hierarchical option cascade.
//!
//! Keeps the four region selectors (province → district → city → village)
//! consistent with each other and with the remotely fetched option lists.
//!
//! # Architecture
//!
//! ```text
//! user event ──► Cascade::select / reload
//!                    │
//!                    ▼
//!              CascadeState::dispatch(Action) ──► Vec<Effect>
//!                    │                               │
//!                    │          ┌────────────────────┼──────────────┐
//!                    │          ▼                    ▼              ▼
//!                    │     Notify → Callbacks   Fetch → spawn   Cancel → FetchTracker
//!                    │                               │
//!                    └──── OptionsLoaded / FetchFailed ◄─ mpsc ─┘
//! ```
//!
//! All state mutation happens on the owner's task. Spawned fetch tasks only
//! report back through the channel, and every result carries the fetch id it
//! was issued with so a superseded response can never overwrite a newer list.

mod callbacks;
mod driver;
mod selection;
mod state;
mod tracker;

pub use callbacks::{Callbacks, LevelCallback};
pub use driver::{Cascade, SelectOutcome};
pub use selection::Selection;
pub use state::{Action, CascadeState, Effect, FetchId, LevelView};
