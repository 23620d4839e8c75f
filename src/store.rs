use thiserror::Error;

/// Typed storage failures. Handlers branch on the category instead of
/// matching driver message text; the violated column rides along for
/// user-facing duplicate errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {field}")]
    UniqueViolation { field: String },
    #[error(transparent)]
    Db(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, Some(msg)) = &e {
            if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                if let Some(field) = unique_field(msg) {
                    return StoreError::UniqueViolation { field };
                }
            }
        }
        StoreError::Db(e)
    }
}

/// SQLite reports unique failures as
/// `UNIQUE constraint failed: students.email[, ...]`. The category comes from
/// the error code; only the column name is pulled out of the message.
fn unique_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("UNIQUE constraint failed: ")?;
    let first = rest.split(',').next()?.trim();
    let column = first.rsplit('.').next()?;
    if column.is_empty() {
        None
    } else {
        Some(column.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn unique_field_extracts_column() {
        assert_eq!(
            unique_field("UNIQUE constraint failed: students.email"),
            Some("email".to_string())
        );
        assert_eq!(
            unique_field("UNIQUE constraint failed: grades.student_id, grades.course_id"),
            Some("student_id".to_string())
        );
        assert_eq!(unique_field("NOT NULL constraint failed: students.email"), None);
    }

    #[test]
    fn duplicate_insert_classifies_as_unique_violation() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute("CREATE TABLE t(email TEXT NOT NULL UNIQUE)", [])
            .expect("create");
        conn.execute("INSERT INTO t(email) VALUES('a@b.c')", [])
            .expect("first insert");
        let err = conn
            .execute("INSERT INTO t(email) VALUES('a@b.c')", [])
            .map_err(StoreError::from)
            .expect_err("second insert must fail");
        match err {
            StoreError::UniqueViolation { field } => assert_eq!(field, "email"),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }
}
