use course_management_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::{
        courses::CourseRequest,
        enrollments::{EnrollRequest, ProgressRequest},
        students::StudentRequest,
    },
    entity::{EnrollmentStatus, Role, users::ActiveModel as UserActive},
    error::AppError,
    middleware::auth::AuthUser,
    models::{Course, Student},
    services::{course_service, enrollment_service, student_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

// Seat accounting across enroll, cancel, progress and course resize.
#[tokio::test]
async fn enrollment_seat_accounting_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let admin = create_user(&state, Role::Admin, "admin@escola.com").await?;
    let instructor = create_user(&state, Role::Instructor, "joao.silva@escola.com").await?;

    // A single-seat course: first enrollment fills it, second student is turned away.
    let course = create_course(&state, &instructor, "Rust Basics", 1).await?;
    assert_eq!(course.available_seats, 1);

    let ana = create_student(&state, &admin, "Ana Paula Costa", 0).await?;
    let bruno = create_student(&state, &admin, "Bruno Henrique Lima", 1).await?;

    let first = enrollment_service::enroll(&state, &admin, enroll(ana.id, course.id))
        .await?
        .data
        .expect("enrollment");
    assert_eq!(first.status, EnrollmentStatus::Active);
    assert_eq!(first.progress, 0.0);
    assert_eq!(first.course_name.as_deref(), Some("Rust Basics"));
    assert_eq!(available_seats(&state, course.id).await?, 0);

    let err = enrollment_service::enroll(&state, &admin, enroll(bruno.id, course.id))
        .await
        .unwrap_err();
    assert_bad_request(err, enrollment_service::NO_VACANCY);

    // Cancelling frees the seat; cancelling again is rejected and frees nothing.
    enrollment_service::cancel(&state, &admin, first.id).await?;
    assert_eq!(available_seats(&state, course.id).await?, 1);
    let err = enrollment_service::cancel(&state, &admin, first.id)
        .await
        .unwrap_err();
    assert_bad_request(err, "Enrollment is already cancelled or completed");
    assert_eq!(available_seats(&state, course.id).await?, 1);

    // The cancelled pair still holds the unique slot.
    let err = enrollment_service::enroll(&state, &admin, enroll(ana.id, course.id))
        .await
        .unwrap_err();
    assert_bad_request(err, enrollment_service::ALREADY_ENROLLED);

    let second = enrollment_service::enroll(&state, &admin, enroll(bruno.id, course.id))
        .await?
        .data
        .expect("enrollment");

    // Progress is bounded and reaching 100 completes the enrollment.
    let err = enrollment_service::update_progress(
        &state,
        &admin,
        second.id,
        ProgressRequest { progress: 120.0 },
    )
    .await
    .unwrap_err();
    assert_bad_request(err, "Progress must be between 0 and 100");

    let halfway = enrollment_service::update_progress(
        &state,
        &admin,
        second.id,
        ProgressRequest { progress: 50.0 },
    )
    .await?
    .data
    .expect("enrollment");
    assert_eq!(halfway.status, EnrollmentStatus::Active);
    assert!(halfway.completed_at.is_none());

    let done = enrollment_service::update_progress(
        &state,
        &admin,
        second.id,
        ProgressRequest { progress: 100.0 },
    )
    .await?
    .data
    .expect("enrollment");
    assert_eq!(done.status, EnrollmentStatus::Completed);
    assert!(done.completed_at.is_some());

    let err = enrollment_service::update_progress(
        &state,
        &admin,
        second.id,
        ProgressRequest { progress: 10.0 },
    )
    .await
    .unwrap_err();
    assert_bad_request(err, "Cannot update progress of an inactive enrollment");
    let err = enrollment_service::cancel(&state, &admin, second.id)
        .await
        .unwrap_err();
    assert_bad_request(err, "Enrollment is already cancelled or completed");
    assert_eq!(available_seats(&state, course.id).await?, 0);

    let bruno_view = student_service::get_student(&state, bruno.id)
        .await?
        .data
        .expect("student");
    assert_eq!(bruno_view.total_courses, 1);
    assert_eq!(bruno_view.average_progress, 100.0);

    // Resize: ten seats with eight taken cannot shrink to five; nine leaves one free.
    let big = create_course(&state, &instructor, "Advanced Databases", 10).await?;
    for i in 0..8 {
        let student = create_student(&state, &admin, &format!("Student {i}"), 10 + i).await?;
        enrollment_service::enroll(&state, &admin, enroll(student.id, big.id)).await?;
    }
    assert_eq!(available_seats(&state, big.id).await?, 2);

    let err = course_service::update_course(
        &state,
        &instructor,
        big.id,
        course_request("Advanced Databases", 5, instructor.user_id),
    )
    .await
    .unwrap_err();
    assert!(
        err.to_string().contains("8 students are already enrolled"),
        "unexpected error: {err}"
    );
    assert_eq!(available_seats(&state, big.id).await?, 2);

    let resized = course_service::update_course(
        &state,
        &instructor,
        big.id,
        course_request("Advanced Databases", 9, instructor.user_id),
    )
    .await?
    .data
    .expect("course");
    assert_eq!(resized.total_seats, 9);
    assert_eq!(resized.available_seats, 1);
    assert_eq!(resized.enrollment_count, 8);

    let by_course = enrollment_service::list_by_course(&state, big.id)
        .await?
        .data
        .expect("list");
    assert_eq!(by_course.items.len(), 8);

    // Soft-deleted entities stay readable but take no new enrollments.
    student_service::deactivate_student(&state, &admin, ana.id).await?;
    let ana_view = student_service::get_student(&state, ana.id)
        .await?
        .data
        .expect("student");
    assert!(!ana_view.active);
    let err = enrollment_service::enroll(&state, &admin, enroll(ana.id, big.id))
        .await
        .unwrap_err();
    assert_bad_request(err, "Inactive student cannot enroll");

    course_service::deactivate_course(&state, &instructor, big.id).await?;
    let carla = create_student(&state, &admin, "Carla Fernanda Souza", 2).await?;
    let err = enrollment_service::enroll(&state, &admin, enroll(carla.id, big.id))
        .await
        .unwrap_err();
    assert_bad_request(err, "Inactive course does not accept new enrollments");

    let missing = Uuid::new_v4();
    let err = enrollment_service::enroll(&state, &admin, enroll(missing, course.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url, 5).await?;
    run_migrations(&pool).await?;

    // Clean tables between runs
    sqlx::query("TRUNCATE TABLE audit_logs, enrollments, courses, students, users CASCADE")
        .execute(&pool)
        .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "flow-test-secret".into(),
        jwt_ttl_hours: 1,
        db_max_connections: 5,
    };
    Ok(AppState::new(pool, config))
}

async fn create_user(state: &AppState, role: Role, email: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(email.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role),
        active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    })
}

async fn create_student(
    state: &AppState,
    actor: &AuthUser,
    name: &str,
    seq: u64,
) -> anyhow::Result<Student> {
    let request = StudentRequest {
        name: name.to_string(),
        email: format!("student{seq}@aluno.com"),
        national_id: format!("{:011}", 10_000_000_000u64 + seq),
        phone: None,
    };
    let student = student_service::create_student(state, actor, request)
        .await?
        .data
        .expect("student");
    Ok(student)
}

async fn create_course(
    state: &AppState,
    actor: &AuthUser,
    name: &str,
    seats: i32,
) -> anyhow::Result<Course> {
    let request = course_request(name, seats, actor.user_id);
    let course = course_service::create_course(state, actor, request)
        .await?
        .data
        .expect("course");
    Ok(course)
}

fn course_request(name: &str, seats: i32, instructor_id: Uuid) -> CourseRequest {
    CourseRequest {
        name: name.to_string(),
        description: None,
        duration_hours: 40,
        total_seats: seats,
        instructor_id,
    }
}

fn enroll(student_id: Uuid, course_id: Uuid) -> EnrollRequest {
    EnrollRequest {
        student_id,
        course_id,
    }
}

async fn available_seats(state: &AppState, course_id: Uuid) -> anyhow::Result<i32> {
    let course = course_service::get_course(state, course_id)
        .await?
        .data
        .expect("course");
    Ok(course.available_seats)
}

fn assert_bad_request(err: AppError, expected: &str) {
    match err {
        AppError::BadRequest(message) => assert_eq!(message, expected),
        other => panic!("expected bad request {expected:?}, got {other:?}"),
    }
}
