//! HTTP handlers for all API routes.

pub mod history;
pub mod predict;
pub mod projection;
pub mod recommendations;
pub mod system;
