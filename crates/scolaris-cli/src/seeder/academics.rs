//! Class and subject seeding.

use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;
use uuid::Uuid;

use super::models::{ClassSeed, SeededClass, SubjectSeed};

const BATCH_SIZE: usize = 1000;

const LEVELS: &[&str] = &["6e", "5e", "4e", "3e", "2nde", "1ere", "Tle"];
const SECTIONS: &[&str] = &["A", "B", "C", "D"];

/// Subject catalogue with coefficients, applied to every seeded school.
pub const SUBJECTS: &[(&str, i32)] = &[
    ("Mathematics", 4),
    ("French", 4),
    ("English", 2),
    ("Physics", 3),
    ("History and Geography", 2),
    ("Physical Education", 1),
];

/// Spreads `per_school` classes over levels first, then sections, so four
/// classes become `6e A, 5e A, 4e A, 3e A`.
pub fn generate_classes(school_ids: &[Uuid], per_school: usize) -> Vec<ClassSeed> {
    school_ids
        .par_iter()
        .flat_map(|&school_id| {
            (0..per_school)
                .map(|i| {
                    let level = LEVELS[i % LEVELS.len()];
                    let section = SECTIONS[(i / LEVELS.len()) % SECTIONS.len()];
                    let round = i / (LEVELS.len() * SECTIONS.len());
                    let name = if round == 0 {
                        format!("{} {}", level, section)
                    } else {
                        format!("{} {}{}", level, section, round + 1)
                    };
                    ClassSeed {
                        school_id,
                        name,
                        level: level.to_string(),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn generate_subjects(school_ids: &[Uuid]) -> Vec<SubjectSeed> {
    school_ids
        .iter()
        .flat_map(|&school_id| {
            SUBJECTS.iter().map(move |&(name, coefficient)| SubjectSeed {
                school_id,
                name,
                coefficient,
            })
        })
        .collect()
}

pub async fn seed_classes(
    db: &PgPool,
    school_ids: &[Uuid],
    per_school: usize,
) -> Result<Vec<SeededClass>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🏷️  Seeding {} classes per school...", per_school);

    let classes = generate_classes(school_ids, per_school);

    let mut tx = db.begin().await?;
    let mut seeded = Vec::with_capacity(classes.len());
    for chunk in classes.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO classes (school_id, name, level) ");
        query.push_values(chunk, |mut row, class| {
            row.push_bind(class.school_id)
                .push_bind(&class.name)
                .push_bind(&class.level);
        });
        query.push(" RETURNING id, school_id");

        let rows: Vec<(Uuid, Uuid)> = query.build_query_as().fetch_all(&mut *tx).await?;
        seeded.extend(
            rows.into_iter()
                .map(|(id, school_id)| SeededClass { id, school_id }),
        );
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} classes in {:?}",
        seeded.len(),
        start_time.elapsed()
    );

    Ok(seeded)
}

/// Returns `(subject_id, school_id)` pairs.
pub async fn seed_subjects(
    db: &PgPool,
    school_ids: &[Uuid],
) -> Result<Vec<(Uuid, Uuid)>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("📘 Seeding {} subjects per school...", SUBJECTS.len());

    let subjects = generate_subjects(school_ids);

    let mut tx = db.begin().await?;
    let mut seeded = Vec::with_capacity(subjects.len());
    for chunk in subjects.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO subjects (school_id, name, coefficient) ");
        query.push_values(chunk, |mut row, subject| {
            row.push_bind(subject.school_id)
                .push_bind(subject.name)
                .push_bind(subject.coefficient);
        });
        query.push(" RETURNING id, school_id");

        let rows: Vec<(Uuid, Uuid)> = query.build_query_as().fetch_all(&mut *tx).await?;
        seeded.extend(rows);
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} subjects in {:?}",
        seeded.len(),
        start_time.elapsed()
    );

    Ok(seeded)
}
