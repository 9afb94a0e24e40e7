pub mod prelude;

pub mod audit_logs;
pub mod customers;
pub mod employees;
pub mod infra_tasks;
pub mod sessions;
pub mod tasks;
pub mod users;
