use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use rollbook_core::{ErrorResponse, PaginationMeta};
use rollbook_models::change_logs::{ChangeAction, ChangeLog, PaginatedChangeLogsResponse};
use rollbook_models::student_codes::{
    CodeReassignment, FailedReassignment, GapReport, ReassignmentReport,
};
use rollbook_models::users::{
    CreateUserDto, PaginatedUsersResponse, RegisterUserDto, Role, UpdateUserDto, User,
};
use rollbook_models::{ChangeLogId, Email, StudentCode, UserId};

use crate::modules::auth::model::SyncResponse;
use crate::modules::student_codes::model::NextCodeResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::sync,
        crate::modules::auth::controller::me,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::student_codes::controller::get_next_code,
        crate::modules::student_codes::controller::get_gaps,
        crate::modules::student_codes::controller::reassign_codes,
        crate::modules::change_logs::controller::get_change_logs,
    ),
    components(
        schemas(
            User,
            Role,
            UserId,
            Email,
            StudentCode,
            RegisterUserDto,
            CreateUserDto,
            UpdateUserDto,
            PaginatedUsersResponse,
            SyncResponse,
            NextCodeResponse,
            GapReport,
            CodeReassignment,
            FailedReassignment,
            ReassignmentReport,
            ChangeLog,
            ChangeLogId,
            ChangeAction,
            PaginatedChangeLogsResponse,
            PaginationMeta,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Identity registration and linking"),
        (name = "Users", description = "User administration"),
        (name = "Student Codes", description = "Student code allocation and maintenance"),
        (name = "Change Logs", description = "Audit trail")
    ),
    info(
        title = "Rollbook API",
        version = "0.1.0",
        description = "School administration backend: user records, identity linking and SU-NNN student codes.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_code_endpoints() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/sync",
            "/api/student-codes/next",
            "/api/student-codes/gaps",
            "/api/student-codes/reassign",
            "/api/users/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
