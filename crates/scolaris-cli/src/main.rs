use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use scolaris_cli::seeder::{self, SeedConfig};
use scolaris_cli::superadmin::create_superadmin;
use scolaris_models::users::CreateSuperAdminDto;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "scolaris-cli")]
#[command(about = "Scolaris CLI - Administrative tools for Scolaris", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a platform superadmin account
    CreateSuperadmin {
        /// First name of the superadmin
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the superadmin
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake schools, classes, students and records
    Seed {
        /// Number of schools to create
        #[arg(short = 's', long, default_value = "3")]
        schools: usize,

        /// Number of admins per school
        #[arg(long, default_value = "1")]
        admins: usize,

        /// Number of parents per school
        #[arg(long, default_value = "20")]
        parents: usize,

        /// Number of classes per school
        #[arg(long, default_value = "4")]
        classes: usize,

        /// Number of students per class
        #[arg(long, default_value = "25")]
        students: usize,

        /// Number of grades per student and subject
        #[arg(long, default_value = "3")]
        grades: usize,

        /// Number of past school days with attendance
        #[arg(long, default_value = "10")]
        days: usize,

        /// Length of the seeded schools' trial in days
        #[arg(long, default_value = "30")]
        trial_days: i64,
    },
    /// Clear all seeded data (keeps superadmins and registered schools)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match scolaris_db::init_db_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = scolaris_db::run_migrations(&pool).await {
        eprintln!("❌ Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    match cli.command {
        Commands::CreateSuperadmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_superadmin(&pool, first_name, last_name, email, password).await,
        Commands::Seed {
            schools,
            admins,
            parents,
            classes,
            students,
            grades,
            days,
            trial_days,
        } => {
            let config = SeedConfig {
                num_schools: schools,
                admins_per_school: admins,
                parents_per_school: parents,
                classes_per_school: classes,
                students_per_class: students,
                grades_per_subject: grades,
                attendance_days: days,
                trial_days,
            };
            handle_seed(&pool, config).await
        }
        Commands::ClearSeed => handle_clear_seed(&pool).await,
    }
}

fn prompt_or_exit(value: Option<String>, prompt: &str) -> String {
    if let Some(value) = value {
        return value;
    }
    match Input::new().with_prompt(prompt).interact_text() {
        Ok(value) => value,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", prompt.to_lowercase(), e);
            std::process::exit(1);
        }
    }
}

async fn handle_create_superadmin(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) {
    let first_name = prompt_or_exit(first_name, "First name");
    let last_name = prompt_or_exit(last_name, "Last name");
    let email = prompt_or_exit(email, "Email address");

    let password = match password {
        Some(password) => password,
        None => match Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
        {
            Ok(password) => password,
            Err(e) => {
                eprintln!("❌ Failed to read password: {}", e);
                std::process::exit(1);
            }
        },
    };

    let dto = CreateSuperAdminDto {
        first_name: first_name.clone(),
        last_name: last_name.clone(),
        email: email.clone(),
        password,
    };

    match create_superadmin(pool, dto).await {
        Ok(_) => {
            println!("\n✅ Superadmin created successfully!");
            println!("   Email: {}", email);
            println!("   Name: {} {}", first_name, last_name);
        }
        Err(e) => {
            eprintln!("\n❌ Error creating superadmin: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_seed(pool: &PgPool, config: SeedConfig) {
    if let Err(e) = seeder::seed_all(pool, config).await {
        eprintln!("\n❌ Error seeding database: {}", e);
        std::process::exit(1);
    }
    println!(
        "   Seeded accounts use the password `{}`",
        seeder::SEED_PASSWORD
    );
}

async fn handle_clear_seed(pool: &PgPool) {
    match seeder::clear_all(pool).await {
        Ok(count) => println!("✅ Cleared {} seeded schools", count),
        Err(e) => {
            eprintln!("\n❌ Error clearing seeded data: {}", e);
            std::process::exit(1);
        }
    }
}
