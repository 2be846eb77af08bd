//! School seeding functionality.

use chrono::{Duration, Utc};
use fake::Fake;
use fake::faker::address::en::*;
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;
use uuid::Uuid;

use super::models::{SEED_EMAIL_DOMAIN, SchoolSeed};

const BATCH_SIZE: usize = 500;

/// Generates school data in parallel using Rayon. The index suffix keeps
/// names unique within one run.
pub fn generate_schools(count: usize) -> Vec<SchoolSeed> {
    let run = Uuid::new_v4().simple().to_string();
    let run = &run[..6];

    (0..count)
        .into_par_iter()
        .map(|i| {
            let city: String = CityName().fake();
            let street: String = StreetName().fake();
            let building: String = BuildingNumber().fake();

            SchoolSeed {
                name: format!("{} Academy {}-{}", city, run, i + 1),
                address: format!("{} {}, {}", building, street, city),
                phone: PhoneNumber().fake(),
                email: format!("office.{}.{}@{}", run, i + 1, SEED_EMAIL_DOMAIN),
            }
        })
        .collect()
}

/// Seeds schools with a fresh trial window starting now.
pub async fn seed_schools(
    db: &PgPool,
    count: usize,
    trial_days: i64,
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🏫 Seeding {} schools...", count);

    let schools = generate_schools(count);
    let end_date = Utc::now() + Duration::days(trial_days);

    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(schools.len());
    for chunk in schools.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO schools (name, address, phone, email, subscription_end_date) ",
        );
        query.push_values(chunk, |mut row, school| {
            row.push_bind(&school.name)
                .push_bind(&school.address)
                .push_bind(&school.phone)
                .push_bind(&school.email)
                .push_bind(end_date);
        });
        query.push(" RETURNING id");

        let chunk_ids: Vec<Uuid> = query.build_query_scalar().fetch_all(&mut *tx).await?;
        ids.extend(chunk_ids);
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} schools in {:?}",
        ids.len(),
        start_time.elapsed()
    );

    Ok(ids)
}

/// Deletes seeded schools. Classes, students, school users and their
/// records go with them through the foreign key cascades.
pub async fn clear_seeded_schools(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded schools...");

    let result = sqlx::query("DELETE FROM schools WHERE email LIKE $1")
        .bind(format!("%@{}", SEED_EMAIL_DOMAIN))
        .execute(db)
        .await?
        .rows_affected();

    println!(
        "   ✓ Deleted {} schools in {:?}",
        result,
        start_time.elapsed()
    );

    Ok(result)
}
