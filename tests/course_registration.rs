mod test_support;

use serde_json::json;
use test_support::{
    login_admin, login_student, request_err, request_ok, select_workspace, spawn_sidecar, temp_dir,
};

fn enrollment_of(result: &serde_json::Value, code: &str) -> i64 {
    result
        .get("allCourses")
        .and_then(|v| v.as_array())
        .expect("allCourses")
        .iter()
        .find(|c| c.get("courseCode").and_then(|v| v.as_str()) == Some(code))
        .and_then(|c| c.get("currentEnrollment"))
        .and_then(|v| v.as_i64())
        .expect("currentEnrollment")
}

fn course_id_of(result: &serde_json::Value, code: &str) -> i64 {
    result
        .get("allCourses")
        .and_then(|v| v.as_array())
        .expect("allCourses")
        .iter()
        .find(|c| c.get("courseCode").and_then(|v| v.as_str()) == Some(code))
        .and_then(|c| c.get("courseId"))
        .and_then(|v| v.as_i64())
        .expect("courseId")
}

#[test]
fn register_and_drop_maintain_the_counter() {
    let workspace = temp_dir("portal-course-add-drop");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let (session, _) = login_student(&mut stdin, &mut reader, "adddrop@uni.edu", "History");
    let listing = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "courses.list",
        json!({ "session": session }),
    );
    let ee101 = course_id_of(&listing, "EE101");
    assert_eq!(enrollment_of(&listing, "EE101"), 0);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.register",
        json!({ "session": session, "courseId": ee101 }),
    );
    let after_add = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "courses.list",
        json!({ "session": session }),
    );
    assert_eq!(enrollment_of(&after_add, "EE101"), 1);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "courses.drop",
        json!({ "session": session, "courseId": ee101 }),
    );
    let after_drop = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "courses.list",
        json!({ "session": session }),
    );
    assert_eq!(enrollment_of(&after_drop, "EE101"), 0);
}

#[test]
fn duplicate_registration_is_rejected() {
    let workspace = temp_dir("portal-course-dup");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let (session, _) = login_student(&mut stdin, &mut reader, "dup@uni.edu", "History");
    let listing = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "courses.list",
        json!({ "session": session }),
    );
    let ee101 = course_id_of(&listing, "EE101");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.register",
        json!({ "session": session, "courseId": ee101 }),
    );
    let error = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "courses.register",
        json!({ "session": session, "courseId": ee101 }),
    );
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("duplicate_registration")
    );

    let after = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "courses.list",
        json!({ "session": session }),
    );
    assert_eq!(enrollment_of(&after, "EE101"), 1);
}

#[test]
fn dropping_an_unregistered_course_leaves_the_counter_alone() {
    let workspace = temp_dir("portal-course-phantom-drop");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let (holder, _) = login_student(&mut stdin, &mut reader, "holder@uni.edu", "History");
    let (other, _) = login_student(&mut stdin, &mut reader, "other@uni.edu", "History");
    let listing = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "courses.list",
        json!({ "session": holder }),
    );
    let ee101 = course_id_of(&listing, "EE101");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.register",
        json!({ "session": holder, "courseId": ee101 }),
    );

    // The other student never registered; their drop must fail and must not
    // push the counter below the real registrant count.
    let error = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "courses.drop",
        json!({ "session": other, "courseId": ee101 }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("not_found"));

    let after = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "courses.list",
        json!({ "session": other }),
    );
    assert_eq!(enrollment_of(&after, "EE101"), 1);
}

#[test]
fn full_course_rejects_further_registrations() {
    let workspace = temp_dir("portal-course-full");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let admin = login_admin(&mut stdin, &mut reader);
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "admin.courses.create",
        json!({
            "session": admin,
            "courseCode": "TST101",
            "courseName": "Tiny Seminar",
            "instructor": "Dr. Small",
            "scheduleDays": "Fri",
            "scheduleTime": "08:00-09:00",
            "credits": 1,
            "maxCapacity": 1
        }),
    );
    let course_id = created
        .get("courseId")
        .and_then(|v| v.as_i64())
        .expect("courseId");

    let (first, _) = login_student(&mut stdin, &mut reader, "first@uni.edu", "History");
    let (second, _) = login_student(&mut stdin, &mut reader, "second@uni.edu", "History");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.register",
        json!({ "session": first, "courseId": course_id }),
    );
    let error = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "courses.register",
        json!({ "session": second, "courseId": course_id }),
    );
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("course_full")
    );
}

#[test]
fn registering_for_a_missing_course_is_not_found() {
    let workspace = temp_dir("portal-course-missing");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let (session, _) = login_student(&mut stdin, &mut reader, "missing@uni.edu", "History");
    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "courses.register",
        json!({ "session": session, "courseId": 9999 }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("not_found"));
}
