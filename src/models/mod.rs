pub mod announcement;
pub mod assignment;
pub mod classroom;
pub mod dismissed_notification;
pub mod enrollment;
pub mod material;
pub mod submission;
pub mod user;
