//! Applicant analytics for a single job: score filtering and ordering, the
//! score histogram, bulk selection and accept/reject email dispatch.

pub mod dispatch;
pub mod filter;
pub mod handlers;
pub mod histogram;
pub mod selection;
pub mod view;
