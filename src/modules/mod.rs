pub mod auth;
pub mod change_logs;
pub mod student_codes;
pub mod users;
