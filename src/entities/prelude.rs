pub use super::audit_logs::Entity as AuditLogs;
pub use super::customers::Entity as Customers;
pub use super::employees::Entity as Employees;
pub use super::infra_tasks::Entity as InfraTasks;
pub use super::sessions::Entity as Sessions;
pub use super::tasks::Entity as Tasks;
pub use super::users::Entity as Users;
