//! Admin and parent account seeding.

use fake::Fake;
use fake::faker::name::en::*;
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;
use scolaris_auth::Role;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;
use uuid::Uuid;

use super::models::{SEED_EMAIL_DOMAIN, UserSeed};

const BATCH_SIZE: usize = 1000;

/// Password shared by every seeded account.
pub const SEED_PASSWORD: &str = "password123";

fn generate_user(
    role: Role,
    school_id: Uuid,
    school_idx: usize,
    user_idx: usize,
    password_hash: &str,
) -> UserSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();

    UserSeed {
        email: format!(
            "{}.{}.s{}.{}.{}@{}",
            first_name.to_lowercase(),
            last_name.to_lowercase().replace(' ', ""),
            school_idx,
            role.as_str(),
            user_idx,
            SEED_EMAIL_DOMAIN
        ),
        first_name,
        last_name,
        phone: matches!(role, Role::Parent).then(|| PhoneNumber().fake()),
        password_hash: password_hash.to_string(),
        role,
        school_id,
    }
}

/// Generates `admins` and `parents` accounts for every school in parallel.
pub fn generate_users(
    school_ids: &[Uuid],
    admins: usize,
    parents: usize,
    password_hash: &str,
) -> Vec<UserSeed> {
    school_ids
        .par_iter()
        .enumerate()
        .flat_map(|(school_idx, &school_id)| {
            let mut users = Vec::with_capacity(admins + parents);
            for user_idx in 0..admins {
                users.push(generate_user(
                    Role::Admin,
                    school_id,
                    school_idx,
                    user_idx,
                    password_hash,
                ));
            }
            for user_idx in 0..parents {
                users.push(generate_user(
                    Role::Parent,
                    school_id,
                    school_idx,
                    user_idx,
                    password_hash,
                ));
            }
            users
        })
        .collect()
}

/// Seeds users and returns `(id, school_id, role)` for each inserted row.
pub async fn seed_users(
    db: &PgPool,
    school_ids: &[Uuid],
    admins: usize,
    parents: usize,
) -> Result<Vec<(Uuid, Uuid, Role)>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!(
        "👤 Seeding {} admins and {} parents per school...",
        admins, parents
    );

    // Minimum cost keeps seeding fast; these accounts are for development only.
    let password_hash = bcrypt::hash(SEED_PASSWORD, 4)?;
    let users = generate_users(school_ids, admins, parents, &password_hash);

    let mut tx = db.begin().await?;
    let mut inserted = Vec::with_capacity(users.len());
    for chunk in users.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO users (first_name, last_name, email, phone, password, role, school_id) ",
        );
        query.push_values(chunk, |mut row, user| {
            row.push_bind(&user.first_name)
                .push_bind(&user.last_name)
                .push_bind(&user.email)
                .push_bind(&user.phone)
                .push_bind(&user.password_hash)
                .push_bind(user.role)
                .push_bind(user.school_id);
        });
        query.push(" RETURNING id, school_id, role");

        let rows: Vec<(Uuid, Uuid, Role)> = query.build_query_as().fetch_all(&mut *tx).await?;
        inserted.extend(rows);
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} users in {:?} (password: {})",
        inserted.len(),
        start_time.elapsed(),
        SEED_PASSWORD
    );

    Ok(inserted)
}
