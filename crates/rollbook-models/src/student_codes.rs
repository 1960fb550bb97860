//! Student-code allocation.
//!
//! Codes are handed out first-fit: a new student receives the lowest unused
//! number, so numbers freed by deleted records are recycled before the
//! sequence grows. Everything here is a pure function over the codes the
//! caller read from the registry; persisting the result is the caller's job.
//!
//! Stored codes are scanned tolerantly. A value whose suffix does not parse
//! (see [`StudentCode::parse_number`]) is ignored rather than rejected, so
//! hand-edited or legacy rows never block registration.
//!
//! # Example
//!
//! ```ignore
//! use rollbook_models::student_codes::{allocate_next, find_gaps};
//!
//! let existing = ["SU-001", "SU-003"];
//! assert_eq!(allocate_next(existing).to_string(), "SU-002");
//!
//! let report = find_gaps(["SU-001", "SU-002", "SU-004"]);
//! assert_eq!(report.gap_count, 1);
//! ```

use std::num::NonZeroU64;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::ids::UserId;
use crate::value_types::StudentCode;

fn parsed_numbers<I, S>(codes: I) -> Vec<u64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut numbers: Vec<u64> = codes
        .into_iter()
        .filter_map(|code| StudentCode::parse_number(code.as_ref()))
        .collect();
    numbers.sort_unstable();
    numbers
}

/// Returns the lowest code whose number is not taken by `existing`.
///
/// Never fails. An empty registry yields `SU-001`.
pub fn allocate_next<I, S>(existing: I) -> StudentCode
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut next = NonZeroU64::MIN;

    for value in parsed_numbers(existing) {
        if value > next.get() {
            break;
        }
        if value == next.get() {
            next = next.saturating_add(1);
        }
    }

    StudentCode::from_nonzero(next)
}

/// Diagnostic view of the numbering: how many codes exist, the highest one,
/// and every unused number below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GapReport {
    /// Number of codes supplied, including ones that failed to parse.
    pub total_students: usize,
    /// `None` when no code parsed.
    pub highest_code: Option<StudentCode>,
    pub gaps: Vec<StudentCode>,
    pub gap_count: usize,
}

impl GapReport {
    pub fn is_contiguous(&self) -> bool {
        self.gaps.is_empty()
    }
}

/// Lists the unused numbers between `SU-001` and the highest allocated code.
///
/// With nothing to scan the report has no highest code and no gaps.
pub fn find_gaps<I, S>(existing: I) -> GapReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let codes: Vec<S> = existing.into_iter().collect();
    let total_students = codes.len();

    let mut numbers = parsed_numbers(&codes);
    numbers.dedup();

    let highest = numbers.last().copied().and_then(StudentCode::from_number);

    let mut gaps = Vec::new();
    if let Some(highest) = highest {
        let mut taken = numbers.iter().peekable();
        for candidate in 1..highest.number() {
            while taken.next_if(|&&n| n < candidate).is_some() {}
            if taken.peek() != Some(&&candidate) {
                if let Some(code) = StudentCode::from_number(candidate) {
                    gaps.push(code);
                }
            }
        }
    }

    GapReport {
        total_students,
        highest_code: highest,
        gap_count: gaps.len(),
        gaps,
    }
}

/// A student as seen by compaction: identity, current code, and
/// registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentCodeEntry {
    pub id: UserId,
    pub student_code: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Whether the record carries an identity UID.
    pub linked: bool,
}

impl StudentCodeEntry {
    /// Unlinked legacy records keep a code they already hold but are never
    /// handed a new one.
    pub fn is_numbered(&self) -> bool {
        self.linked || self.student_code.is_some()
    }
}

/// One line of a compaction plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeReassignment {
    pub id: UserId,
    pub old_code: Option<String>,
    pub new_code: StudentCode,
}

impl CodeReassignment {
    /// Whether applying this entry requires a write.
    pub fn is_change(&self) -> bool {
        self.old_code.as_deref() != Some(self.new_code.to_string().as_str())
    }
}

/// Plans a gapless renumbering: students ordered by registration time (ties
/// broken by id) receive `SU-001`, `SU-002`, ... in turn.
///
/// The plan covers every student except unlinked ones without a code. Once
/// applied, planning again yields no changes.
pub fn reassign_all(students: &[StudentCodeEntry]) -> Vec<CodeReassignment> {
    let mut ordered: Vec<&StudentCodeEntry> =
        students.iter().filter(|s| s.is_numbered()).collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    ordered
        .into_iter()
        .zip(1u64..)
        .filter_map(|(student, number)| {
            StudentCode::from_number(number).map(|new_code| CodeReassignment {
                id: student.id,
                old_code: student.student_code.clone(),
                new_code,
            })
        })
        .collect()
}

/// A reassignment entry whose write failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailedReassignment {
    pub id: UserId,
    pub new_code: StudentCode,
    pub error: String,
}

/// Outcome of applying a compaction plan to the registry.
///
/// Writes are not transactional. When `complete` is false, `updated` holds
/// what was written, `failed` the entry that broke, and `pending` everything
/// not yet written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReassignmentReport {
    pub total_students: usize,
    pub changed: usize,
    pub updated: Vec<CodeReassignment>,
    pub failed: Option<FailedReassignment>,
    pub pending: Vec<CodeReassignment>,
    pub complete: bool,
}
