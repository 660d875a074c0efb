//! Built-in scheduled jobs.

pub mod view_refresh;

pub use view_refresh::ViewRefreshJob;
