//! Student, grade and attendance seeding.

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use fake::Fake;
use fake::faker::name::en::*;
use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use scolaris_models::attendance::AttendanceStatus;
use scolaris_models::grades::GradeType;
use scolaris_models::nsi::generate_nsi;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use uuid::Uuid;

use super::models::{AttendanceSeed, GradeSeed, SeededClass, SeededStudent, StudentSeed};

const BATCH_SIZE: usize = 1000;
const PERIODS: &[&str] = &["T1", "T2"];
const GRADE_TYPES: &[GradeType] = &[GradeType::Homework, GradeType::Test, GradeType::Exam];

/// Generates students for every class. Parents are picked from the class's
/// school; roughly one student in ten is left without a linked parent.
pub fn generate_students(
    classes: &[SeededClass],
    per_class: usize,
    parents_by_school: &HashMap<Uuid, Vec<Uuid>>,
    today: NaiveDate,
) -> Vec<StudentSeed> {
    let mut students: Vec<StudentSeed> = classes
        .par_iter()
        .flat_map(|class| {
            let mut rng = rand::thread_rng();
            let parents = parents_by_school.get(&class.school_id);
            (0..per_class)
                .map(|_| {
                    let age_days = rng.gen_range(10 * 365..18 * 365);
                    let parent_id = match parents {
                        Some(p) if !p.is_empty() && rng.gen_ratio(9, 10) => p.choose(&mut rng).copied(),
                        _ => None,
                    };
                    StudentSeed {
                        school_id: class.school_id,
                        class_id: class.id,
                        parent_id,
                        first_name: FirstName().fake(),
                        last_name: LastName().fake(),
                        date_of_birth: today - Duration::days(age_days),
                        gender: if rng.gen_bool(0.5) { "female" } else { "male" },
                        nsi: generate_nsi(&mut rng, today),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    dedupe_nsi(&mut students, today);
    students
}

/// Regenerates the rare in-batch collision so the insert does not trip the
/// unique constraint.
fn dedupe_nsi(students: &mut [StudentSeed], today: NaiveDate) {
    let mut rng = rand::thread_rng();
    let mut seen = HashSet::with_capacity(students.len());
    for student in students.iter_mut() {
        while !seen.insert(student.nsi.clone()) {
            student.nsi = generate_nsi(&mut rng, today);
        }
    }
}

/// Grades out of 20 centred around 12, with a few struggling students.
pub fn generate_grades(
    students: &[SeededStudent],
    subjects_by_school: &HashMap<Uuid, Vec<Uuid>>,
    per_subject: usize,
) -> Vec<GradeSeed> {
    students
        .par_iter()
        .flat_map(|student| {
            let mut rng = rand::thread_rng();
            let baseline: f64 = if rng.gen_ratio(1, 8) {
                rng.gen_range(4.0..9.0)
            } else {
                rng.gen_range(9.0..17.0)
            };
            let subjects = subjects_by_school
                .get(&student.school_id)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let mut grades = Vec::with_capacity(subjects.len() * per_subject);
            for &subject_id in subjects {
                for i in 0..per_subject {
                    let value: f64 = (baseline + rng.gen_range(-3.0..3.0)).clamp(0.0, 20.0);
                    grades.push(GradeSeed {
                        student_id: student.id,
                        subject_id,
                        value: (value * 4.0).round() / 4.0,
                        grade_type: GRADE_TYPES[i % GRADE_TYPES.len()],
                        period: PERIODS[i % PERIODS.len()],
                    });
                }
            }
            grades
        })
        .collect()
}

/// The last `days` school days (Monday to Friday) before `today`.
pub fn school_days(today: NaiveDate, days: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(days);
    let mut date = today;
    while dates.len() < days {
        date -= Duration::days(1);
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(date);
        }
    }
    dates
}

pub fn generate_attendance(students: &[SeededStudent], dates: &[NaiveDate]) -> Vec<AttendanceSeed> {
    students
        .par_iter()
        .flat_map(|student| {
            let mut rng = rand::thread_rng();
            let absent_rate = if rng.gen_ratio(1, 10) { 0.3 } else { 0.04 };
            dates
                .iter()
                .map(|&date| {
                    let roll: f64 = rng.r#gen();
                    let (status, reason) = if roll < absent_rate {
                        if rng.gen_ratio(1, 3) {
                            (AttendanceStatus::Excused, Some("Medical appointment".to_string()))
                        } else {
                            (AttendanceStatus::Absent, None)
                        }
                    } else if roll < absent_rate + 0.05 {
                        (AttendanceStatus::Late, None)
                    } else {
                        (AttendanceStatus::Present, None)
                    };
                    AttendanceSeed {
                        student_id: student.id,
                        date,
                        status,
                        reason,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_students(
    db: &PgPool,
    classes: &[SeededClass],
    per_class: usize,
    parents_by_school: &HashMap<Uuid, Vec<Uuid>>,
) -> Result<Vec<SeededStudent>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🎒 Seeding {} students per class...", per_class);

    let students = generate_students(
        classes,
        per_class,
        parents_by_school,
        Utc::now().date_naive(),
    );

    let mut tx = db.begin().await?;
    let mut seeded = Vec::with_capacity(students.len());
    for chunk in students.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO students (school_id, class_id, parent_id, first_name, last_name, date_of_birth, gender, nsi) ",
        );
        query.push_values(chunk, |mut row, student| {
            row.push_bind(student.school_id)
                .push_bind(student.class_id)
                .push_bind(student.parent_id)
                .push_bind(&student.first_name)
                .push_bind(&student.last_name)
                .push_bind(student.date_of_birth)
                .push_bind(student.gender)
                .push_bind(&student.nsi);
        });
        query.push(" RETURNING id, school_id");

        let rows: Vec<(Uuid, Uuid)> = query.build_query_as().fetch_all(&mut *tx).await?;
        seeded.extend(
            rows.into_iter()
                .map(|(id, school_id)| SeededStudent { id, school_id }),
        );
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} students in {:?}",
        seeded.len(),
        start_time.elapsed()
    );

    Ok(seeded)
}

pub async fn seed_grades(
    db: &PgPool,
    students: &[SeededStudent],
    subjects_by_school: &HashMap<Uuid, Vec<Uuid>>,
    per_subject: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("📝 Seeding {} grades per student and subject...", per_subject);

    let grades = generate_grades(students, subjects_by_school, per_subject);

    let mut tx = db.begin().await?;
    for chunk in grades.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO grades (student_id, subject_id, value, grade_type, period) ",
        );
        query.push_values(chunk, |mut row, grade| {
            row.push_bind(grade.student_id)
                .push_bind(grade.subject_id)
                .push_bind(grade.value)
                .push_bind(grade.grade_type)
                .push_bind(grade.period);
        });
        query.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} grades in {:?}",
        grades.len(),
        start_time.elapsed()
    );

    Ok(grades.len())
}

pub async fn seed_attendance(
    db: &PgPool,
    students: &[SeededStudent],
    days: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("📅 Seeding {} days of attendance...", days);

    let dates = school_days(Utc::now().date_naive(), days);
    let records = generate_attendance(students, &dates);

    let mut tx = db.begin().await?;
    for chunk in records.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO attendance (student_id, date, status, reason) ");
        query.push_values(chunk, |mut row, record| {
            row.push_bind(record.student_id)
                .push_bind(record.date)
                .push_bind(record.status)
                .push_bind(&record.reason);
        });
        query.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} attendance records in {:?}",
        records.len(),
        start_time.elapsed()
    );

    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scolaris_models::nsi::is_valid_nsi;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    #[test]
    fn students_belong_to_their_class_school() {
        let school = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let classes = vec![SeededClass {
            id: Uuid::new_v4(),
            school_id: school,
        }];
        let parents = HashMap::from([(school, vec![parent])]);

        let students = generate_students(&classes, 40, &parents, today());

        assert_eq!(students.len(), 40);
        for student in &students {
            assert_eq!(student.school_id, school);
            assert!(is_valid_nsi(&student.nsi));
            assert!(student.parent_id.is_none_or(|p| p == parent));
        }
        let nsis: HashSet<_> = students.iter().map(|s| &s.nsi).collect();
        assert_eq!(nsis.len(), 40);
    }

    #[test]
    fn students_without_parents_in_school_stay_unlinked() {
        let classes = vec![SeededClass {
            id: Uuid::new_v4(),
            school_id: Uuid::new_v4(),
        }];
        let students = generate_students(&classes, 5, &HashMap::new(), today());
        assert!(students.iter().all(|s| s.parent_id.is_none()));
    }

    #[test]
    fn grades_stay_on_the_twenty_point_scale() {
        let school = Uuid::new_v4();
        let students = vec![SeededStudent {
            id: Uuid::new_v4(),
            school_id: school,
        }];
        let subjects = HashMap::from([(school, vec![Uuid::new_v4(), Uuid::new_v4()])]);

        let grades = generate_grades(&students, &subjects, 3);

        assert_eq!(grades.len(), 6);
        assert!(grades.iter().all(|g| (0.0..=20.0).contains(&g.value)));
    }

    #[test]
    fn school_days_skip_weekends() {
        // 2025-03-12 is a Wednesday
        let days = school_days(today(), 5);
        assert_eq!(days.len(), 5);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
        assert_eq!(days[4], NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        assert!(
            days.iter()
                .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        );
    }

    #[test]
    fn one_attendance_row_per_student_and_day() {
        let students = vec![
            SeededStudent {
                id: Uuid::new_v4(),
                school_id: Uuid::new_v4(),
            };
            3
        ];
        let dates = school_days(today(), 4);
        assert_eq!(generate_attendance(&students, &dates).len(), 12);
    }
}
