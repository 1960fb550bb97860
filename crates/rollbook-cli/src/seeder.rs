//! Fake user data for development databases.
//!
//! Seeded records get identity UIDs prefixed with [`SEED_UID_PREFIX`] so they
//! can be told apart from real accounts and cleared later.

use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rollbook_db::{Registry, RegistryError, insert_with_student_code};
use rollbook_models::{Email, NewUser, Role, User};
use std::time::Instant;
use uuid::Uuid;

pub const SEED_UID_PREFIX: &str = "seed-";

const PAGE_SIZE: i64 = 100;

/// Generates `count` users with fake names and unique addresses.
pub fn generate_users(role: Role, count: usize) -> Vec<NewUser> {
    (0..count)
        .filter_map(|idx| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let tag = Uuid::new_v4().simple().to_string();

            let email = format!(
                "{}.{}+{}{}-{}@example.com",
                first_name.to_lowercase().replace(|c: char| !c.is_ascii_alphanumeric(), ""),
                last_name.to_lowercase().replace(|c: char| !c.is_ascii_alphanumeric(), ""),
                role,
                idx,
                &tag[..8]
            );

            Email::new(email).ok().map(|email| NewUser {
                auth_uid: format!("{}{}", SEED_UID_PREFIX, tag),
                first_name,
                last_name,
                email,
                role,
                student_code: None,
            })
        })
        .collect()
}

/// Inserts generated users one at a time so each student goes through the
/// normal code allocation.
pub async fn seed_users(
    registry: &Registry,
    role: Role,
    count: usize,
    max_conflict_retries: u32,
) -> Result<Vec<User>, RegistryError> {
    let start_time = Instant::now();
    println!("🎓 Seeding {} {} users...", count, role);

    let mut created = Vec::with_capacity(count);
    for user in generate_users(role, count) {
        created.push(
            insert_with_student_code(registry.users.as_ref(), user, max_conflict_retries).await?,
        );
    }

    println!(
        "   ✓ Inserted {} users in {:?}",
        created.len(),
        start_time.elapsed()
    );
    Ok(created)
}

/// Deletes every seeded record, returning how many were removed.
pub async fn clear_seeded(registry: &Registry) -> Result<u64, RegistryError> {
    let mut seeded = Vec::new();
    let mut offset = 0;
    loop {
        let (page, total) = registry.users.list_users(None, PAGE_SIZE, offset).await?;
        seeded.extend(
            page.iter()
                .filter(|u| {
                    u.auth_uid
                        .as_deref()
                        .is_some_and(|uid| uid.starts_with(SEED_UID_PREFIX))
                })
                .map(|u| u.id),
        );
        offset += PAGE_SIZE;
        if page.is_empty() || offset >= total {
            break;
        }
    }

    let mut removed = 0;
    for id in seeded {
        if registry.users.delete_user(id).await? {
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollbook_models::find_gaps;

    #[test]
    fn test_generated_users_are_unique() {
        let users = generate_users(Role::Teacher, 50);
        assert_eq!(users.len(), 50);

        let mut emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
        emails.sort_unstable();
        emails.dedup();
        assert_eq!(emails.len(), 50);
        assert!(users.iter().all(|u| u.auth_uid.starts_with(SEED_UID_PREFIX)));
    }

    #[tokio::test]
    async fn test_seeded_students_are_numbered_contiguously() {
        let registry = Registry::memory();
        seed_users(&registry, Role::Student, 12, 1).await.unwrap();

        let report = find_gaps(registry.users.student_codes().await.unwrap());
        assert_eq!(report.total_students, 12);
        assert!(report.is_contiguous());
        assert_eq!(report.highest_code.map(|c| c.to_string()).as_deref(), Some("SU-012"));
    }

    #[tokio::test]
    async fn test_clear_seeded_keeps_real_accounts() {
        let registry = Registry::memory();
        let real = crate::admin::create_admin(&registry, "real-uid", "A", "B", "a@school.test")
            .await
            .unwrap();
        seed_users(&registry, Role::Student, 3, 1).await.unwrap();
        seed_users(&registry, Role::Teacher, 2, 1).await.unwrap();

        assert_eq!(clear_seeded(&registry).await.unwrap(), 5);
        let (left, total) = registry.users.list_users(None, 10, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(left[0].id, real.id);
    }
}
