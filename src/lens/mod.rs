//! Lens module
//!
//! This module provides the high-level "lens" abstractions that hold the
//! business logic of sqlspell. Lenses are shared by every interface (CLI,
//! HTTP server, embedding).
//!
//! # Architecture
//!
//! Each lens module exports:
//! - A **Lens struct** (`LevelLens`, `GradeLens`) - the entry point for all operations
//! - **Option structs** - settings the lens is built with
//! - **Output types** - return types of lens methods
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlspell::database::{MemoryLevelStore, LevelStore};
//! use sqlspell::lens::grade::{GradeLens, GradeOptions};
//! use sqlspell::lens::level::LevelLens;
//!
//! let store = MemoryLevelStore::new();
//! let level = LevelLens::new(&store).view("12", false)?;
//! let result = GradeLens::new(GradeOptions::default()).grade_level(&store, 1, 2, "SELECT 1");
//! ```

pub mod utils;

// LevelLens - level lookup and client views
pub mod level;

// GradeLens - query grading in scratch databases
pub mod grade;
