//! Applicant-side job feed: sector and position filtering, apply gating,
//! plus company job posting.

pub mod feed;
pub mod gating;
pub mod handlers;
pub mod posting;
pub mod sector;
