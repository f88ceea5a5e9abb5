pub mod area;
pub mod attendance;
pub mod employee;
pub mod job_role;
pub mod role;
pub mod saved_report;
pub mod schedule;
