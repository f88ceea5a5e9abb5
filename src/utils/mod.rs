pub mod employee_cache;
pub mod employee_code_filter;
