//! Dashboard state for wxdash
//!
//! The store owns what the dashboard currently shows; the refresh service
//! fetches, derives and hands results to the store. Rendering code only
//! reads snapshots and subscribes to changes.

pub mod error;
pub mod refresh;
pub mod store;

pub use error::{ErrorNotice, Section};
pub use refresh::{RefreshOutcome, RefreshService};
pub use store::{DashboardState, DashboardStore, LoadState, RefreshTicket};
