use course_management_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    repositories::users,
    services::auth_service::hash_password,
};
use uuid::Uuid;

const STUDENT_NAMES: [&str; 9] = [
    "Ana Paula Costa",
    "Bruno Henrique Lima",
    "Carla Fernanda Souza",
    "Daniel Rodrigues",
    "Eduarda Alves",
    "Felipe Martins",
    "Gabriela Santos",
    "Hugo Pereira",
    "Isabela Rocha",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    let orm = create_orm_conn(&pool);
    if users::count(&orm).await? > 0 {
        println!("Database already has users, skipping seed");
        return Ok(());
    }

    let admin_id = insert_user(&pool, "Administrator", "admin@escola.com", "admin123", "admin").await?;
    let mut instructors = Vec::new();
    for (name, email) in [
        ("Prof. João Silva", "joao.silva@escola.com"),
        ("Profa. Maria Santos", "maria.santos@escola.com"),
        ("Prof. Carlos Oliveira", "carlos.oliveira@escola.com"),
    ] {
        instructors.push(insert_user(&pool, name, email, "senha123", "instructor").await?);
    }
    let [joao, maria, carlos] = [instructors[0], instructors[1], instructors[2]];

    seed_students(&pool).await?;

    let courses = [
        ("Introduction to Software Architecture", "Architectural patterns and styles", 60, 30, joao),
        ("Web Development with Axum", "Building web services in Rust", 80, 25, maria),
        ("Advanced Databases", "SQL, NoSQL and query tuning", 50, 20, carlos),
        ("Agile Methodologies", "Scrum, Kanban and agile practices", 40, 35, joao),
        ("DevOps and Cloud Computing", "Docker, Kubernetes and AWS", 70, 15, maria),
    ];
    for (name, description, hours, seats, instructor_id) in courses {
        sqlx::query(
            r#"
            INSERT INTO courses (id, name, description, duration_hours, total_seats, available_seats, instructor_id)
            VALUES ($1, $2, $3, $4, $5, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(hours)
        .bind(seats)
        .bind(instructor_id)
        .execute(&pool)
        .await?;
    }
    println!("Seeded courses");

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn insert_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Created user {email} (role={role})");
    Ok(id)
}

async fn seed_students(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for (i, name) in STUDENT_NAMES.iter().enumerate() {
        let email = format!("{}@aluno.com", name.to_lowercase().replace(' ', "."));
        let national_id = format!("{:011}", 10_000_000_000u64 + i as u64);
        let phone = format!("(11) 9{:04}-{:04}", i, i * 10);
        sqlx::query(
            r#"
            INSERT INTO students (id, name, email, national_id, phone)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(national_id)
        .bind(phone)
        .execute(pool)
        .await?;
    }

    println!("Seeded students");
    Ok(())
}
