//! Row shapes and configuration for database seeding.

use chrono::NaiveDate;
use scolaris_auth::Role;
use scolaris_models::attendance::AttendanceStatus;
use scolaris_models::grades::GradeType;
use uuid::Uuid;

/// Every seeded school and user gets an address under this domain so
/// `clear-seed` can find them again.
pub const SEED_EMAIL_DOMAIN: &str = "seed.scolaris.test";

pub struct SchoolSeed {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

pub struct UserSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub school_id: Uuid,
}

pub struct ClassSeed {
    pub school_id: Uuid,
    pub name: String,
    pub level: String,
}

pub struct SubjectSeed {
    pub school_id: Uuid,
    pub name: &'static str,
    pub coefficient: i32,
}

pub struct StudentSeed {
    pub school_id: Uuid,
    pub class_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: &'static str,
    pub nsi: String,
}

pub struct GradeSeed {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub value: f64,
    pub grade_type: GradeType,
    pub period: &'static str,
}

pub struct AttendanceSeed {
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub reason: Option<String>,
}

/// Created classes with the school they belong to.
#[derive(Clone, Copy)]
pub struct SeededClass {
    pub id: Uuid,
    pub school_id: Uuid,
}

/// Created students with their school, used to pair them with subjects.
#[derive(Clone, Copy)]
pub struct SeededStudent {
    pub id: Uuid,
    pub school_id: Uuid,
}

/// Complete configuration for database seeding.
#[derive(Clone)]
pub struct SeedConfig {
    pub num_schools: usize,
    pub admins_per_school: usize,
    pub parents_per_school: usize,
    pub classes_per_school: usize,
    pub students_per_class: usize,
    pub grades_per_subject: usize,
    pub attendance_days: usize,
    pub trial_days: i64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            num_schools: 3,
            admins_per_school: 1,
            parents_per_school: 20,
            classes_per_school: 4,
            students_per_class: 25,
            grades_per_subject: 3,
            attendance_days: 10,
            trial_days: 30,
        }
    }
}

impl SeedConfig {
    pub fn new(num_schools: usize) -> Self {
        Self {
            num_schools,
            ..Default::default()
        }
    }

    pub fn students_per_school(&self) -> usize {
        self.classes_per_school * self.students_per_class
    }
}
