mod test_support;

use serde_json::json;
use test_support::{
    login_admin, register_student, request_err, request_ok, select_workspace, spawn_sidecar,
    temp_dir,
};

fn course_enrollment(courses: &serde_json::Value, code: &str) -> i64 {
    courses
        .get("courses")
        .and_then(|v| v.as_array())
        .expect("courses")
        .iter()
        .find(|c| c.get("courseCode").and_then(|v| v.as_str()) == Some(code))
        .and_then(|c| c.get("currentEnrollment"))
        .and_then(|v| v.as_i64())
        .expect("currentEnrollment")
}

#[test]
fn deleting_a_student_cascades_and_refreshes_counters() {
    let workspace = temp_dir("portal-cascade-student");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let admin = login_admin(&mut stdin, &mut reader);
    let _ = register_student(&mut stdin, &mut reader, "a@uni.edu", "Computer Science");
    let _ = register_student(&mut stdin, &mut reader, "b@uni.edu", "Computer Science");

    let before = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "admin.courses.list",
        json!({ "session": admin }),
    );
    assert_eq!(course_enrollment(&before, "CS101"), 2);
    assert_eq!(course_enrollment(&before, "CS102"), 2);

    let students = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "admin.students.list",
        json!({ "session": admin }),
    );
    let victim_id = students
        .pointer("/students/0/studentId")
        .and_then(|v| v.as_i64())
        .expect("studentId");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "admin.students.delete",
        json!({ "session": admin, "studentId": victim_id }),
    );

    let after_students = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "admin.students.list",
        json!({ "session": admin }),
    );
    assert_eq!(
        after_students
            .get("students")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(1)
    );

    let after_courses = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "admin.courses.list",
        json!({ "session": admin }),
    );
    assert_eq!(course_enrollment(&after_courses, "CS101"), 1);
    assert_eq!(course_enrollment(&after_courses, "CS102"), 1);

    // The victim's seeded grades went with them.
    let dashboard = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "admin.dashboard",
        json!({ "session": admin }),
    );
    assert_eq!(
        dashboard.get("totalRegistrations").and_then(|v| v.as_i64()),
        Some(2)
    );
    let grades = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "admin.grades.list",
        json!({ "session": admin }),
    );
    assert_eq!(
        grades
            .get("grades")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(5),
        "only the surviving student's seeded grades remain"
    );
}

#[test]
fn deleting_a_course_cascades_registrations_and_grades() {
    let workspace = temp_dir("portal-cascade-course");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let admin = login_admin(&mut stdin, &mut reader);
    let _ = register_student(&mut stdin, &mut reader, "cs@uni.edu", "Computer Science");

    let courses = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "admin.courses.list",
        json!({ "session": admin }),
    );
    let cs101_id = courses
        .get("courses")
        .and_then(|v| v.as_array())
        .expect("courses")
        .iter()
        .find(|c| c.get("courseCode").and_then(|v| v.as_str()) == Some("CS101"))
        .and_then(|c| c.get("courseId"))
        .and_then(|v| v.as_i64())
        .expect("courseId");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "admin.courses.delete",
        json!({ "session": admin, "courseId": cs101_id }),
    );

    let dashboard = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "admin.dashboard",
        json!({ "session": admin }),
    );
    assert_eq!(
        dashboard.get("totalCourses").and_then(|v| v.as_i64()),
        Some(4)
    );
    assert_eq!(
        dashboard.get("totalRegistrations").and_then(|v| v.as_i64()),
        Some(1),
        "only the CS102 registration survives"
    );

    let grades = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "admin.grades.list",
        json!({ "session": admin }),
    );
    for grade in grades.get("grades").and_then(|v| v.as_array()).expect("grades") {
        assert_ne!(
            grade.get("courseCode").and_then(|v| v.as_str()),
            Some("CS101")
        );
    }
}

#[test]
fn deleting_a_missing_student_is_not_found() {
    let workspace = temp_dir("portal-cascade-missing");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let admin = login_admin(&mut stdin, &mut reader);
    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "admin.students.delete",
        json!({ "session": admin, "studentId": 7 }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("not_found"));
}
