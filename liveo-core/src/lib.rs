//! Result model, wire envelope and reconciliation for liveo
//!
//! This crate holds everything about live race results that does not need a
//! network connection:
//!
//! - **Results**: the [`ResultSnapshot`] / [`Course`] / [`Competitor`] model and its
//!   `{Hash, Results}` wire form
//! - **Patches**: [`IndexPatch`], a positional list edit, and [`apply_index_patch`]
//! - **Reconciliation**: [`reconcile`] applies a [`Delta`] onto the current
//!   snapshot, checking the hash chain first
//! - **Diff**: [`ResultSnapshot::delta_to`] produces deltas, used by servers and tests
//! - **Codec**: the `{"Type","Msg"}` envelope shared by API calls and events
//! - **Observability**: tracing subscriber and OpenTelemetry setup
//!
//! The transport lives in `liveo-client`.
//!
//! # Example
//!
//! ```rust
//! use liveo_core::{reconcile, Competitor, Course, Delta, IndexPatch, Reconciliation, ResultSnapshot};
//!
//! let current = ResultSnapshot::new(1, "Night Sprint", vec![Course::new("Brown")]);
//! let delta = Delta::new(1, 2).with_competitors(0, IndexPatch::new().add(0, Competitor::new("Ann", 754_000_000_000)));
//!
//! match reconcile(&current, &delta) {
//!     Reconciliation::Applied(next) => assert_eq!(next.courses[0].competitors[0].display_time(), "12:34"),
//!     Reconciliation::RebaseRequired(reason) => panic!("rebase: {}", reason),
//! }
//! ```

pub mod codec;
pub mod diff;
pub mod display;
pub mod error;
pub mod observability;
pub mod patch;
pub mod reconcile;
pub mod results;
pub mod types;

pub use display::format_race_time;
pub use error::{Error, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use patch::{apply_index_patch, IndexPatch, PatchError};
pub use reconcile::{reconcile, Delta, RebaseReason, Reconciliation};
pub use results::{Competitor, Course, ResultHash, ResultSnapshot};
pub use types::{
    ApiResponse, EventMessage, Inbound, Tag, NEW_DELTA_EVENT, NEW_RESULTS_EVENT, REQUEST_RESULTS,
};
