pub mod audit;
pub mod auth_service;
pub mod auth_service_impl;
pub mod ingest_service;
pub mod ingest_service_impl;
pub mod notify;

pub use audit::AuditRecorder;
pub use auth_service::{
    ApprovalOutcome, AuthError, AuthService, CreateUserRequest, CreatedUser, LoginAs, MeInfo,
    SessionIssued, SignupRequest, SignupStatus, UpdateUserRequest,
};
pub use auth_service_impl::SeaOrmAuthService;
pub use ingest_service::{AppendSummary, IngestService, ReplaceSummary};
pub use ingest_service_impl::ExcelIngestService;
pub use notify::{LogNotifier, Notifier};
