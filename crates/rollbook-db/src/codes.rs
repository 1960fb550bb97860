//! Student-code workflows that combine the pure allocator with registry writes.
//!
//! Allocation reads the registry and writes afterwards with no lock held in
//! between, so two concurrent registrations can compute the same code. The
//! registry's unique constraint rejects the second write; we then re-read and
//! try again.

use rollbook_models::{
    CodeReassignment, FailedReassignment, NewUser, ReassignmentReport, StudentCode, User, UserId,
    allocate_next,
};
use tracing::{info, instrument, warn};

use crate::registry::{RegistryError, UniqueField, UserRegistry};

async fn next_free_code(registry: &dyn UserRegistry) -> Result<StudentCode, RegistryError> {
    let codes = registry.student_codes().await?;
    Ok(allocate_next(&codes))
}

/// Inserts a user, allocating a student code first when the role carries one.
///
/// A duplicate-code rejection triggers a fresh read and another attempt, up
/// to `max_retries` times. Past that the conflict is returned to the caller.
#[instrument(skip(registry, user), fields(role = %user.role))]
pub async fn insert_with_student_code(
    registry: &dyn UserRegistry,
    mut user: NewUser,
    max_retries: u32,
) -> Result<User, RegistryError> {
    if !user.role.holds_student_code() {
        user.student_code = None;
        return registry.insert_user(user).await;
    }

    let mut attempt = 0;
    loop {
        let code = next_free_code(registry).await?;
        user.student_code = Some(code);

        match registry.insert_user(user.clone()).await {
            Ok(created) => return Ok(created),
            Err(err) if err.is_conflict_on(UniqueField::StudentCode) && attempt < max_retries => {
                attempt += 1;
                warn!(%code, attempt, "Student code taken concurrently, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

/// Gives an existing record the next free code, with the same retry policy
/// as [`insert_with_student_code`].
///
/// Records without an identity UID are refused with
/// [`RegistryError::Unlinked`]; they must be linked first.
#[instrument(skip(registry))]
pub async fn assign_student_code(
    registry: &dyn UserRegistry,
    id: UserId,
    max_retries: u32,
) -> Result<StudentCode, RegistryError> {
    let user = registry.find_user(id).await?.ok_or(RegistryError::NotFound)?;
    if user.auth_uid.is_none() {
        return Err(RegistryError::Unlinked);
    }

    let mut attempt = 0;
    loop {
        let code = next_free_code(registry).await?;

        match registry.set_student_code(id, Some(code)).await {
            Ok(()) => return Ok(code),
            Err(err) if err.is_conflict_on(UniqueField::StudentCode) && attempt < max_retries => {
                attempt += 1;
                warn!(%code, attempt, "Student code taken concurrently, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

/// Writes a compaction plan to the registry.
///
/// Only entries whose code actually changes are written. All of them first
/// have their code cleared, then receive the new one, so no intermediate
/// state holds the same code twice. The first failure stops the run; nothing
/// already written is undone.
#[instrument(skip_all, fields(total = plan.len()))]
pub async fn apply_reassignments(
    registry: &dyn UserRegistry,
    plan: &[CodeReassignment],
) -> ReassignmentReport {
    let changes: Vec<CodeReassignment> = plan.iter().filter(|r| r.is_change()).cloned().collect();

    let mut report = ReassignmentReport {
        total_students: plan.len(),
        changed: changes.len(),
        updated: Vec::new(),
        failed: None,
        pending: Vec::new(),
        complete: false,
    };

    for (index, entry) in changes.iter().enumerate() {
        if entry.old_code.is_none() {
            continue;
        }
        if let Err(err) = registry.set_student_code(entry.id, None).await {
            warn!(id = %entry.id, error = %err, "Releasing student code failed");
            report.failed = Some(failure(entry, &err));
            report.pending = changes
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, r)| r.clone())
                .collect();
            return report;
        }
    }

    for (index, entry) in changes.iter().enumerate() {
        if let Err(err) = registry.set_student_code(entry.id, Some(entry.new_code)).await {
            warn!(id = %entry.id, code = %entry.new_code, error = %err, "Writing student code failed");
            report.failed = Some(failure(entry, &err));
            report.pending = changes[index + 1..].to_vec();
            return report;
        }
        report.updated.push(entry.clone());
    }

    report.complete = true;
    info!(changed = report.changed, "Student codes compacted");
    report
}

fn failure(entry: &CodeReassignment, err: &RegistryError) -> FailedReassignment {
    FailedReassignment {
        id: entry.id,
        new_code: entry.new_code,
        error: err.to_string(),
    }
}
