//! # Rollbook Models
//!
//! Domain models and DTOs for the Rollbook API, plus the pure student-code
//! allocator.
//!
//! # Modules
//!
//! - [`ids`]: Strongly-typed UUID newtypes
//! - [`value_types`]: Validated primitives ([`Email`], [`StudentCode`])
//! - [`users`]: User records, roles, and request DTOs
//! - [`student_codes`]: First-fit code allocation, gap reports, and compaction plans
//! - [`change_logs`]: Audit trail entries
//!
//! # Example
//!
//! ```ignore
//! use rollbook_models::student_codes::allocate_next;
//!
//! let next = allocate_next(["SU-001", "SU-002", "SU-004"]);
//! assert_eq!(next.to_string(), "SU-003");
//! ```

pub mod change_logs;
pub mod ids;
pub mod student_codes;
pub mod users;
pub mod value_types;

pub use change_logs::{ChangeAction, ChangeLog, NewChangeLog};
pub use ids::{ChangeLogId, UserId};
pub use student_codes::{
    CodeReassignment, FailedReassignment, GapReport, ReassignmentReport, StudentCodeEntry,
    allocate_next, find_gaps, reassign_all,
};
pub use users::{NewUser, Role, User, UserChanges};
pub use value_types::{Email, StudentCode, ValueTypeError};
