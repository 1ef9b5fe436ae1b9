mod purge_job;

pub use purge_job::*;
