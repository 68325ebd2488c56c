//! Domain model for the Interview & Progress context.

pub mod commands;
pub mod interview;
pub mod repository;
pub mod template;
