pub mod config;
pub mod core;
pub mod db;
pub mod http;
pub mod job;
pub mod jobs;
pub mod listener;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod transform;

pub use crate::core::*;
pub use crate::pipeline::Pipeline;
