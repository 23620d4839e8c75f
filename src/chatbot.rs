/// Keyword table for the help-desk bot. Scan order matters: the first keyword
/// contained in the lowercased message wins.
pub const RESPONSES: &[(&str, &str)] = &[
    (
        "hello",
        "Hello! How can I help you with the student portal today?",
    ),
    ("hi", "Hi there! What can I assist you with?"),
    (
        "grades",
        "You can view your grades in the 'Grades' section. If you have issues, contact the administration office.",
    ),
    (
        "courses",
        "You can register for courses in the 'Course Registration' section. Required courses for your program are automatically assigned.",
    ),
    (
        "registration",
        "Course registration is available in the 'Course Registration' section. You can also drop courses from there.",
    ),
    (
        "profile",
        "Update your personal information in the 'My Profile' section.",
    ),
    (
        "announcements",
        "Check the 'Announcements' section for latest university updates.",
    ),
    (
        "password",
        "If you forgot your password, please contact the IT help desk for password reset.",
    ),
    (
        "login",
        "Make sure you're using your Student ID (e.g., FCIT/M/001) to login, not your email.",
    ),
    (
        "contact",
        "For urgent matters, contact:\n- IT Help Desk: it-support@university.edu\n- Administration: admin@university.edu\n- Phone: +1 (555) 123-4567",
    ),
    (
        "hours",
        "University office hours:\nMonday-Friday: 8:00 AM - 6:00 PM\nSaturday: 9:00 AM - 1:00 PM",
    ),
    (
        "deadline",
        "Important deadlines:\n- Course registration: End of first week\n- Grade appeals: Within 7 days of posting\n- Fee payment: 15th of each month",
    ),
    (
        "help",
        "I can help with:\n- Grades and courses\n- Registration issues\n- Profile updates\n- University contacts\n- Office hours and deadlines",
    ),
];

pub const FALLBACK: &str = "I'm not sure I understand. Try asking about:\n- Grades\n- Course registration\n- Profile updates\n- Contact information\n- Office hours\nOr type 'help' for more options.";

pub fn reply(message: &str) -> &'static str {
    let message = message.to_lowercase();
    for (keyword, response) in RESPONSES {
        if message.contains(keyword) {
            return response;
        }
    }
    FALLBACK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_anywhere_in_message_matches() {
        assert_eq!(reply("how do I check my GRADES?"), RESPONSES[2].1);
        assert_eq!(reply("where is my profile page"), RESPONSES[5].1);
    }

    #[test]
    fn first_hit_in_table_wins() {
        // "registration" contains neither "grades" nor "courses", but a
        // message mentioning both courses and registration resolves to the
        // earlier "courses" entry.
        let both = reply("question about course registration and courses");
        assert_eq!(both, RESPONSES[3].1);
    }

    #[test]
    fn unmatched_input_gets_fallback() {
        assert_eq!(reply("what is the meaning of life"), FALLBACK);
        assert_eq!(reply(""), FALLBACK);
    }
}
