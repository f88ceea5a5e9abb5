pub mod attendance;
pub mod catalog;
pub mod employee;
pub mod health;
pub mod report;
