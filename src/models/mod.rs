pub mod job;
pub mod scrap_error;
pub mod task;
