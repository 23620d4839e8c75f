use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("portal.sqlite3");
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            faculty_code TEXT NOT NULL,
            session_type TEXT NOT NULL,
            numeric_id INTEGER NOT NULL,
            student_no TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            phone TEXT,
            major TEXT NOT NULL,
            enrollment_year INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_faculty_session
         ON students(faculty_code, session_type)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_code TEXT NOT NULL UNIQUE,
            course_name TEXT NOT NULL,
            instructor TEXT NOT NULL,
            schedule_days TEXT NOT NULL,
            schedule_time TEXT NOT NULL,
            credits INTEGER NOT NULL,
            max_capacity INTEGER NOT NULL,
            current_enrollment INTEGER NOT NULL DEFAULT 0,
            program TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_program ON courses(program)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS registrations(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            course_id INTEGER NOT NULL,
            semester TEXT NOT NULL,
            registered_at TEXT NOT NULL,
            UNIQUE(student_id, course_id, semester),
            FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE,
            FOREIGN KEY(course_id) REFERENCES courses(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_registrations_student ON registrations(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_registrations_course ON registrations(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            course_id INTEGER NOT NULL,
            grade TEXT NOT NULL,
            semester TEXT NOT NULL,
            academic_year TEXT NOT NULL,
            assigned_at TEXT NOT NULL,
            UNIQUE(student_id, course_id, semester, academic_year),
            FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE,
            FOREIGN KEY(course_id) REFERENCES courses(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_student ON grades(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_course ON grades(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS announcements(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            author TEXT NOT NULL,
            is_important INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    seed_sample_courses(conn)?;

    Ok(())
}

/// Initial course catalog for fresh workspaces. `INSERT OR IGNORE` keeps
/// reopening idempotent and leaves admin edits alone.
fn seed_sample_courses(conn: &Connection) -> anyhow::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let sample: &[(&str, &str, &str, &str, &str, i64, i64, &str)] = &[
        (
            "CS101",
            "Introduction to Programming",
            "Dr. Smith",
            "Mon, Wed",
            "10:00-11:30",
            3,
            50,
            "Computer Science",
        ),
        (
            "CS102",
            "Data Structures",
            "Dr. Johnson",
            "Tue, Thu",
            "14:00-15:30",
            3,
            40,
            "Computer Science",
        ),
        (
            "BUS101",
            "Business Fundamentals",
            "Prof. Davis",
            "Mon, Wed",
            "09:00-10:30",
            3,
            60,
            "Business Administration",
        ),
        (
            "BUS201",
            "Marketing Principles",
            "Prof. Wilson",
            "Tue, Thu",
            "11:00-12:30",
            3,
            45,
            "Business Administration",
        ),
        (
            "EE101",
            "Circuit Analysis",
            "Dr. Brown",
            "Mon, Wed, Fri",
            "13:00-14:00",
            4,
            35,
            "Electrical Engineering",
        ),
    ];

    for (code, name, instructor, days, time, credits, capacity, program) in sample {
        conn.execute(
            "INSERT OR IGNORE INTO courses(
                course_code, course_name, instructor, schedule_days, schedule_time,
                credits, max_capacity, current_enrollment, program, created_at
             ) VALUES(?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
            (code, name, instructor, days, time, credits, capacity, program, &now),
        )?;
    }
    Ok(())
}
