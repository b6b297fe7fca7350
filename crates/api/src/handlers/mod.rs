//! HTTP request handlers, one module per resource.

pub mod approval;
pub mod period;
pub mod revision;
pub mod status;
