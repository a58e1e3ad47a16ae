//! HTTP route handlers
//!
//! Each handler is split into a synchronous `handle_*` function that maps a
//! raw request body to an [`ApiResponse`](crate::server::protocol::ApiResponse)
//! and a thin axum wrapper that pulls the shared state.
//!
//! - `level` - Level data lookup (`POST /leveldata`)
//! - `grade` - Query grading (`POST /playground`)

pub mod grade;
pub mod level;

pub use grade::{grade, handle_grade};
pub use level::{handle_level_data, level_data};
