pub mod config;
pub mod error;
pub mod lead;
pub mod message;
pub mod sentiment;
pub mod task;
pub mod trace;
