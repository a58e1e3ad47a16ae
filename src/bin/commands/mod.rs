pub mod config;
pub mod grade;
pub mod import;
pub mod level;
pub mod serve;
