use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, MeResponse},
        courses::{CourseList, CourseRequest},
        enrollments::{EnrollRequest, EnrollmentList, ProgressRequest},
        students::{StudentList, StudentRequest},
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    entity::{EnrollmentStatus, Role},
    models::{Course, Enrollment, Student, User},
    response::{ApiResponse, Meta},
    routes::{auth, courses, enrollments, health, params, students, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::me,
        users::list_users,
        users::list_instructors,
        users::get_user,
        users::create_user,
        users::update_user,
        users::deactivate_user,
        students::list_students,
        students::search_students,
        students::get_student,
        students::create_student,
        students::update_student,
        students::deactivate_student,
        courses::list_courses,
        courses::list_available_courses,
        courses::search_courses,
        courses::get_course,
        courses::create_course,
        courses::update_course,
        courses::deactivate_course,
        enrollments::list_enrollments,
        enrollments::list_by_student,
        enrollments::list_by_course,
        enrollments::enroll,
        enrollments::cancel_enrollment,
        enrollments::update_progress
    ),
    components(
        schemas(
            Role,
            EnrollmentStatus,
            User,
            Student,
            Course,
            Enrollment,
            LoginRequest,
            LoginResponse,
            MeResponse,
            CreateUserRequest,
            UpdateUserRequest,
            StudentRequest,
            CourseRequest,
            EnrollRequest,
            ProgressRequest,
            UserList,
            StudentList,
            CourseList,
            EnrollmentList,
            params::Pagination,
            params::SearchQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<Student>,
            ApiResponse<Course>,
            ApiResponse<Enrollment>,
            ApiResponse<UserList>,
            ApiResponse<StudentList>,
            ApiResponse<CourseList>,
            ApiResponse<EnrollmentList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User administration"),
        (name = "Students", description = "Student endpoints"),
        (name = "Courses", description = "Course endpoints"),
        (name = "Enrollments", description = "Enrollment and progress endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn documents_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/login",
            "/api/users/{id}",
            "/api/students/search",
            "/api/courses/available",
            "/api/enrollments/{id}/progress",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
