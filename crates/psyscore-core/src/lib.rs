//! psyscore-core
//!
//! Pure domain types shared by the scoring pipeline and its callers:
//! response sets, demographic profiles and the test-application record.
//! No scoring logic lives here.

pub mod error;
pub mod models;
