pub mod audit_logs;
pub mod courses;
pub mod enrollments;
pub mod students;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use courses::Entity as Courses;
pub use enrollments::{EnrollmentStatus, Entity as Enrollments};
pub use students::Entity as Students;
pub use users::{Entity as Users, Role};
