mod heart_rate;
mod in_memory_heart_rate_repository;
mod reading;
mod report;
mod result;

pub use heart_rate::*;
pub use in_memory_heart_rate_repository::*;
pub use reading::*;
pub use report::*;
pub use result::*;
