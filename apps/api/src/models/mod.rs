pub mod application;
pub mod cv;
pub mod job;
pub mod user;

pub use application::{Application, ApplicationStatus};
pub use cv::{Cv, CvDetails, CvRecord};
pub use job::Job;
pub use user::CurrentUser;
