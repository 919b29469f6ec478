use anyhow::Context;
use chrono::Utc;
use coaching_api::{
    db::{create_orm_conn, run_migrations},
    entity::{
        courses::{ActiveModel as CourseActive, Column as CourseCol, Entity as Courses},
        students::{ActiveModel as StudentActive, Column as StudentCol, Entity as Students},
    },
    services::auth_service::hash_password,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let orm = create_orm_conn(&database_url, 1).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    seed_courses(&orm).await?;
    let student_id = ensure_student(&orm, "Asha Verma", "student@example.com", "student123").await?;

    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    let admin_hash = hash_password(&admin_password)?;

    println!("Seed completed. Student ID: {student_id}");
    println!("Set ADMIN_USERNAME and ADMIN_PASSWORD_HASH to enable admin login:");
    println!("ADMIN_PASSWORD_HASH='{admin_hash}'");
    Ok(())
}

async fn ensure_student(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Students::find()
        .filter(StudentCol::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("Student {email} already present");
        return Ok(existing.id);
    }

    let now = Utc::now();
    let student = StudentActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        phone: Set(Some("+919876543210".to_string())),
        password_hash: Set(hash_password(password)?),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    println!("Ensured student {email}");
    Ok(student.id)
}

async fn seed_courses(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let courses = vec![
        (
            "JEE Main Crash Course",
            "Full syllabus revision with weekly mock tests",
            "3 months",
            "R. Sharma",
            499_900,
        ),
        (
            "NEET Biology Intensive",
            "Chapter-wise biology with NCERT drills",
            "4 months",
            "P. Iyer",
            649_900,
        ),
        (
            "Foundation Mathematics",
            "Class 9 and 10 maths fundamentals",
            "6 months",
            "A. Khan",
            299_900,
        ),
    ];

    for (title, description, duration, faculty, price_minor) in courses {
        let exists = Courses::find()
            .filter(CourseCol::Title.eq(title))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let now = Utc::now();
        CourseActive {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            duration: Set(duration.to_string()),
            faculty: Set(faculty.to_string()),
            price_minor: Set(price_minor),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded courses");
    Ok(())
}
