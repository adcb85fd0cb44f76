mod client;
mod heart_rate_repository;

pub use client::*;
pub use heart_rate_repository::*;
