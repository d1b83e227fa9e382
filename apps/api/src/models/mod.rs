pub mod organization;
pub mod resume;
pub mod user;
