//! Request descriptors and the page fetch coordinator.
//!
//! - [`request`] - canonical request descriptors and the page envelope
//! - [`coordinator`] - the per-screen Idle → Loading → Success/Failure state machine

mod coordinator;
mod request;

pub use coordinator::{
    CoordinatorEvent, CoordinatorOptions, Dispatch, FetchState, PageCoordinator, Transition,
    DEFAULT_PAGE_LIMIT,
};
pub use request::{PageResult, RequestDescriptor};
