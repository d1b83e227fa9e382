// Organization, job and candidate-review endpoints.
// Every operation is gated on the caller's membership; writes need admin.

pub mod access;
pub mod handlers;
pub mod queries;
