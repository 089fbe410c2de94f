//! Dashboard: per-user document statistics and the API usage view.

pub mod handlers;
