//! Command handlers.

pub mod db;
pub mod keys;
pub mod logs;
pub mod search;
