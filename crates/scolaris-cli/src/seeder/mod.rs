//! Database seeding for development and load testing.
//!
//! Data is generated in parallel with Rayon and inserted with multi-row
//! `INSERT` statements inside one transaction per table.

pub mod academics;
pub mod models;
pub mod schools;
pub mod students;
pub mod users;

use scolaris_auth::Role;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

pub use models::{SEED_EMAIL_DOMAIN, SeedConfig};
pub use users::SEED_PASSWORD;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub schools: usize,
    pub users: usize,
    pub classes: usize,
    pub subjects: usize,
    pub students: usize,
    pub grades: usize,
    pub attendance: usize,
}

fn group_by_school(pairs: impl IntoIterator<Item = (Uuid, Uuid)>) -> HashMap<Uuid, Vec<Uuid>> {
    let mut grouped: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (id, school_id) in pairs {
        grouped.entry(school_id).or_default().push(id);
    }
    grouped
}

/// Seeds a complete dataset: schools on a fresh trial, admins, parents,
/// classes, subjects, students, grades and attendance.
pub async fn seed_all(
    db: &PgPool,
    config: SeedConfig,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🌱 Starting database seeding...");
    println!(
        "   - Schools: {} ({} students each)",
        config.num_schools,
        config.students_per_school()
    );

    let school_ids = schools::seed_schools(db, config.num_schools, config.trial_days).await?;

    let users = users::seed_users(
        db,
        &school_ids,
        config.admins_per_school,
        config.parents_per_school,
    )
    .await?;
    let parents_by_school = group_by_school(
        users
            .iter()
            .filter(|(_, _, role)| *role == Role::Parent)
            .map(|&(id, school_id, _)| (id, school_id)),
    );

    let classes = academics::seed_classes(db, &school_ids, config.classes_per_school).await?;
    let subjects = academics::seed_subjects(db, &school_ids).await?;
    let subjects_by_school = group_by_school(subjects.iter().copied());

    let students = students::seed_students(
        db,
        &classes,
        config.students_per_class,
        &parents_by_school,
    )
    .await?;
    let grades =
        students::seed_grades(db, &students, &subjects_by_school, config.grades_per_subject)
            .await?;
    let attendance = students::seed_attendance(db, &students, config.attendance_days).await?;

    let summary = SeedSummary {
        schools: school_ids.len(),
        users: users.len(),
        classes: classes.len(),
        subjects: subjects.len(),
        students: students.len(),
        grades,
        attendance,
    };

    println!("\n✅ Seeding completed in {:?}", start_time.elapsed());
    println!("   {:?}", summary);

    Ok(summary)
}

/// Removes every seeded school and everything attached to it. Superadmins
/// and schools registered through the API are kept.
pub async fn clear_all(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let deleted = schools::clear_seeded_schools(db).await?;
    println!("\n✅ Seed data cleared in {:?}", start_time.elapsed());
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SeedConfig {
        SeedConfig {
            num_schools: 2,
            admins_per_school: 1,
            parents_per_school: 3,
            classes_per_school: 2,
            students_per_class: 4,
            grades_per_subject: 2,
            attendance_days: 3,
            trial_days: 30,
        }
    }

    #[test]
    fn group_by_school_collects_ids() {
        let school = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let grouped = group_by_school(vec![(a, school), (b, school)]);
        assert_eq!(grouped[&school], vec![a, b]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn seeds_and_clears_full_dataset(pool: PgPool) {
        let summary = seed_all(&pool, small_config()).await.unwrap();

        assert_eq!(summary.schools, 2);
        assert_eq!(summary.users, 8);
        assert_eq!(summary.classes, 4);
        assert_eq!(summary.students, 16);
        assert_eq!(summary.grades, 16 * academics::SUBJECTS.len() * 2);
        assert_eq!(summary.attendance, 16 * 3);

        let cross_school: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM students s JOIN users u ON u.id = s.parent_id
             WHERE u.school_id <> s.school_id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(cross_school, 0);

        let deleted = clear_all(&pool).await.unwrap();
        assert_eq!(deleted, 2);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn clear_keeps_registered_schools(pool: PgPool) {
        sqlx::query("INSERT INTO schools (name, email) VALUES ('Real School', 'office@real.test')")
            .execute(&pool)
            .await
            .unwrap();
        seed_all(&pool, small_config()).await.unwrap();

        clear_all(&pool).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schools")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
