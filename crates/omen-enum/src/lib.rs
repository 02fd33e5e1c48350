//! OMEN guess enumeration.
//!
//! Produces password guesses from a trained ruleset in ascending
//! target-level order (most probable first). The pieces, innermost out:
//! - [`optimizer`]: the time-memory trade-off cache over conditional
//!   transitions
//! - [`walker`]: the guess structure that enumerates all continuations of
//!   one initial prefix at an exact level sum
//! - [`enumerator`]: the driver that decomposes each target level over
//!   length, initial prefix, and transition budget
//! - [`session`]: save/restore so long-running enumerations survive
//!   interruption
//!
//! The enumerator is deliberately separable from the CLI so it can feed
//! other crackers directly.

pub mod enumerator;
pub mod error;
pub mod optimizer;
pub mod session;
pub mod walker;

pub use enumerator::{EnumeratorState, MarkovEnumerator, ParseBreakdown, Pointer};
pub use error::{EnumError, SessionError};
pub use optimizer::{CpView, Optimizer, DEFAULT_OPTIMIZER_DEPTH};
pub use session::SessionStore;
pub use walker::{GuessStructure, Slot, WalkerState};
