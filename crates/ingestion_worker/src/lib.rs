pub mod domain;
pub mod ingestion_worker;
pub mod spool;

pub use domain::*;
pub use ingestion_worker::*;
pub use spool::*;
