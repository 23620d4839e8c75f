use chrono::Utc;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

use crate::auth;
use crate::sampler;
use crate::store::StoreError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Self-registration form, already decoded from request params.
#[derive(Debug, Clone)]
pub struct NewStudentForm {
    pub faculty_code: String,
    pub session_type: String,
    /// Optional client-supplied identifier (`FACULTY/SESSION/NNN`). When
    /// absent the next sequence number for (faculty, session) is allocated.
    pub student_no: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: Option<String>,
    pub major: String,
    pub enrollment_year: i64,
}

#[derive(Debug, Clone)]
pub struct RegisteredStudent {
    pub student_id: i64,
    pub student_no: String,
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters long")]
    PasswordTooShort,
    #[error("enrollment year must be a positive number")]
    InvalidYear,
    #[error("phone number format is invalid")]
    InvalidPhone,
    #[error("student id must look like FACULTY/SESSION/NNN")]
    InvalidStudentNo,
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    #[error("this email address is already registered")]
    EmailTaken,
    #[error("this student id is already registered")]
    StudentNoTaken,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RegisterError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation { ref field } if field == "email" => {
                RegisterError::EmailTaken
            }
            StoreError::UniqueViolation { ref field } if field == "student_no" => {
                RegisterError::StudentNoTaken
            }
            other => RegisterError::Store(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnrollError {
    #[error("already registered for this course")]
    AlreadyRegistered,
    #[error("course is full")]
    CourseFull,
    #[error("course not found")]
    CourseNotFound,
    #[error("not registered for this course")]
    NotRegistered,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The self-registration pipeline: validate, hash, allocate the public
/// identifier, insert the student row, seed sample grades, auto-enroll the
/// declared program's courses. The whole sequence runs in one transaction so
/// a failure in a later step leaves no partial rows behind.
pub fn register_student<R: Rng>(
    conn: &Connection,
    rng: &mut R,
    current_semester: &str,
    form: &NewStudentForm,
) -> Result<RegisteredStudent, RegisterError> {
    let form = normalize(form);
    validate(&form)?;

    let password_hash = auth::hash_password(&form.password);

    let tx = conn.unchecked_transaction().map_err(StoreError::from)?;

    let (numeric_id, student_no) = allocate_student_no(&tx, &form)?;

    let now = Utc::now().to_rfc3339();
    tx.execute(
        "INSERT INTO students(
            faculty_code, session_type, numeric_id, student_no,
            first_name, last_name, email, password_hash, phone,
            major, enrollment_year, created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &form.faculty_code,
            &form.session_type,
            numeric_id,
            &student_no,
            &form.first_name,
            &form.last_name,
            &form.email,
            &password_hash,
            &form.phone,
            &form.major,
            form.enrollment_year,
            &now,
        ),
    )
    .map_err(StoreError::from)?;
    let student_id = tx.last_insert_rowid();

    seed_sample_grades(&tx, rng, student_id)?;
    auto_enroll_program_courses(&tx, student_id, &form.major, current_semester)?;

    tx.commit().map_err(StoreError::from)?;

    tracing::info!(student_no = %student_no, "registered new student");
    Ok(RegisteredStudent {
        student_id,
        student_no,
    })
}

fn normalize(form: &NewStudentForm) -> NewStudentForm {
    let mut out = form.clone();
    out.faculty_code = out.faculty_code.trim().to_uppercase();
    out.session_type = out.session_type.trim().to_uppercase();
    out.first_name = out.first_name.trim().to_string();
    out.last_name = out.last_name.trim().to_string();
    out.email = out.email.trim().to_string();
    out.major = out.major.trim().to_string();
    out.student_no = out
        .student_no
        .as_deref()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());
    out.phone = out
        .phone
        .as_deref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    out
}

fn validate(form: &NewStudentForm) -> Result<(), RegisterError> {
    if form.faculty_code.is_empty() {
        return Err(RegisterError::MissingField("faculty code"));
    }
    if form.session_type.is_empty() {
        return Err(RegisterError::MissingField("session type"));
    }
    if form.first_name.is_empty() {
        return Err(RegisterError::MissingField("first name"));
    }
    if form.last_name.is_empty() {
        return Err(RegisterError::MissingField("last name"));
    }
    if form.email.is_empty() {
        return Err(RegisterError::MissingField("email"));
    }
    if form.major.is_empty() {
        return Err(RegisterError::MissingField("major"));
    }
    if form.password != form.confirm_password {
        return Err(RegisterError::PasswordMismatch);
    }
    if form.password.len() < MIN_PASSWORD_LEN {
        return Err(RegisterError::PasswordTooShort);
    }
    if form.enrollment_year <= 0 {
        return Err(RegisterError::InvalidYear);
    }
    if let Some(phone) = &form.phone {
        if !phone_looks_valid(phone) {
            return Err(RegisterError::InvalidPhone);
        }
    }
    Ok(())
}

fn phone_looks_valid(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    digits >= 7
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
}

/// Either takes the client-supplied identifier (normalized upstream, checked
/// for shape and uniqueness) or synthesizes the next `FACULTY/SESSION/NNN`
/// for the pair.
fn allocate_student_no(
    conn: &Connection,
    form: &NewStudentForm,
) -> Result<(i64, String), RegisterError> {
    if let Some(supplied) = &form.student_no {
        let numeric_id = parse_student_no(supplied, &form.faculty_code, &form.session_type)
            .ok_or(RegisterError::InvalidStudentNo)?;
        let taken: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM students WHERE student_no = ?",
                [supplied],
                |r| r.get(0),
            )
            .optional()
            .map_err(StoreError::from)?;
        if taken.is_some() {
            return Err(RegisterError::StudentNoTaken);
        }
        return Ok((numeric_id, supplied.clone()));
    }

    let numeric_id: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(numeric_id), 0) + 1
             FROM students
             WHERE faculty_code = ? AND session_type = ?",
            (&form.faculty_code, &form.session_type),
            |r| r.get(0),
        )
        .map_err(StoreError::from)?;
    let student_no = format!(
        "{}/{}/{:03}",
        form.faculty_code, form.session_type, numeric_id
    );
    Ok((numeric_id, student_no))
}

fn parse_student_no(supplied: &str, faculty_code: &str, session_type: &str) -> Option<i64> {
    let mut parts = supplied.split('/');
    let faculty = parts.next()?;
    let session = parts.next()?;
    let sequence = parts.next()?;
    if parts.next().is_some() || faculty != faculty_code || session != session_type {
        return None;
    }
    sequence.parse::<i64>().ok().filter(|n| *n > 0)
}

/// Draws up to `SAMPLE_GRADE_COURSES` distinct courses and records a sampled
/// letter grade with a random period tag for each.
fn seed_sample_grades<R: Rng>(
    conn: &Connection,
    rng: &mut R,
    student_id: i64,
) -> Result<(), StoreError> {
    let mut stmt = conn.prepare("SELECT id FROM courses ORDER BY RANDOM() LIMIT ?")?;
    let course_ids = stmt
        .query_map([sampler::SAMPLE_GRADE_COURSES as i64], |r| r.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let now = Utc::now().to_rfc3339();
    for course_id in &course_ids {
        let grade = sampler::sample_grade(rng);
        let (semester, academic_year) = sampler::sample_period(rng);
        conn.execute(
            "INSERT INTO grades(student_id, course_id, grade, semester, academic_year, assigned_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            (student_id, course_id, grade, semester, academic_year, &now),
        )?;
    }
    tracing::debug!(student_id, count = course_ids.len(), "seeded sample grades");
    Ok(())
}

/// Enrolls the student in every course tagged with their major. The insert is
/// conditional on no existing (student, course) registration in any semester,
/// so rerunning never duplicates rows.
pub fn auto_enroll_program_courses(
    conn: &Connection,
    student_id: i64,
    major: &str,
    semester: &str,
) -> Result<usize, StoreError> {
    let mut stmt = conn.prepare("SELECT id FROM courses WHERE program = ?")?;
    let course_ids = stmt
        .query_map([major], |r| r.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let now = Utc::now().to_rfc3339();
    let mut enrolled = 0usize;
    for course_id in course_ids {
        let inserted = conn.execute(
            "INSERT INTO registrations(student_id, course_id, semester, registered_at)
             SELECT ?1, ?2, ?3, ?4
             WHERE NOT EXISTS(
                 SELECT 1 FROM registrations WHERE student_id = ?1 AND course_id = ?2
             )",
            (student_id, course_id, semester, &now),
        )?;
        if inserted > 0 {
            refresh_enrollment(conn, course_id)?;
            enrolled += 1;
        }
    }
    Ok(enrolled)
}

/// Self-service course registration for the current semester. Capacity check,
/// conditional insert, and counter refresh share one transaction.
pub fn register_for_course(
    conn: &Connection,
    student_id: i64,
    course_id: i64,
    semester: &str,
) -> Result<(), EnrollError> {
    let tx = conn.unchecked_transaction().map_err(StoreError::from)?;

    let capacity: Option<(i64, i64)> = tx
        .query_row(
            "SELECT c.max_capacity,
                    (SELECT COUNT(*) FROM registrations r WHERE r.course_id = c.id)
             FROM courses c
             WHERE c.id = ?",
            [course_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()
        .map_err(StoreError::from)?;
    let Some((max_capacity, live_registrations)) = capacity else {
        return Err(EnrollError::CourseNotFound);
    };
    if live_registrations >= max_capacity {
        return Err(EnrollError::CourseFull);
    }

    let now = Utc::now().to_rfc3339();
    let inserted = tx
        .execute(
            "INSERT INTO registrations(student_id, course_id, semester, registered_at)
             VALUES(?, ?, ?, ?)
             ON CONFLICT(student_id, course_id, semester) DO NOTHING",
            (student_id, course_id, semester, &now),
        )
        .map_err(StoreError::from)?;
    if inserted == 0 {
        return Err(EnrollError::AlreadyRegistered);
    }

    refresh_enrollment(&tx, course_id)?;
    tx.commit().map_err(StoreError::from)?;
    Ok(())
}

/// Drops a registration. When no row matches the counter is left untouched,
/// so phantom drops cannot push it below the number of real registrants.
pub fn drop_course(conn: &Connection, student_id: i64, course_id: i64) -> Result<(), EnrollError> {
    let tx = conn.unchecked_transaction().map_err(StoreError::from)?;

    let removed = tx
        .execute(
            "DELETE FROM registrations WHERE student_id = ? AND course_id = ?",
            (student_id, course_id),
        )
        .map_err(StoreError::from)?;
    if removed == 0 {
        return Err(EnrollError::NotRegistered);
    }

    refresh_enrollment(&tx, course_id)?;
    tx.commit().map_err(StoreError::from)?;
    Ok(())
}

/// Rewrites the denormalized counter from the live registration rows rather
/// than incrementing blindly, keeping it truthful under any interleaving.
pub fn refresh_enrollment(conn: &Connection, course_id: i64) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE courses
         SET current_enrollment = (SELECT COUNT(*) FROM registrations WHERE course_id = ?1)
         WHERE id = ?1",
        [course_id],
    )?;
    Ok(())
}
