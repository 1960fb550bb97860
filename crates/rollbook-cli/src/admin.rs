//! Operations an operator runs outside the HTTP API.

use rollbook_db::{Registry, RegistryError, apply_reassignments, insert_with_student_code};
use rollbook_models::{
    ChangeAction, Email, NewChangeLog, NewUser, ReassignmentReport, Role, User, reassign_all,
};
use serde_json::json;

/// Creates an admin record for an identity already provisioned with the
/// identity provider. Admins cannot self-register, so this is how the first
/// one comes to exist.
pub async fn create_admin(
    registry: &Registry,
    auth_uid: &str,
    first_name: &str,
    last_name: &str,
    email: &str,
) -> Result<User, Box<dyn std::error::Error>> {
    let user = NewUser {
        auth_uid: auth_uid.trim().to_string(),
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
        email: Email::new(email)?,
        role: Role::Admin,
        student_code: None,
    };

    let created = insert_with_student_code(registry.users.as_ref(), user, 0).await?;

    registry
        .change_logs
        .record(
            NewChangeLog::new(None, created.id, ChangeAction::UserCreated)
                .with_details(json!({ "role": created.role, "source": "cli" })),
        )
        .await?;

    Ok(created)
}

/// Plans and applies a gapless renumbering, logging every written entry.
pub async fn reassign_codes(registry: &Registry) -> Result<ReassignmentReport, RegistryError> {
    let students = registry.users.students_by_creation().await?;
    let plan = reassign_all(&students);
    let report = apply_reassignments(registry.users.as_ref(), &plan).await;

    for entry in &report.updated {
        registry
            .change_logs
            .record(
                NewChangeLog::new(None, entry.id, ChangeAction::CodeReassigned).with_details(
                    json!({ "oldCode": entry.old_code, "newCode": entry.new_code, "source": "cli" }),
                ),
            )
            .await?;
    }

    Ok(report)
}
