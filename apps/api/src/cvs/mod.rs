//! Read-only CV detail view for the CV owner.

pub mod handlers;
