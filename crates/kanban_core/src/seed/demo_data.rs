//! Fixed demo records.

use crate::model::contact::Contact;
use crate::model::task::{Priority, Subtask, Task, TaskCategory, TaskStatus};
use crate::model::user::User;
use crate::model::Timestamp;
use chrono::{DateTime, NaiveDate, Utc};

pub const DEMO_PASSWORD: &str = "demo123";
pub const DEMO_CONTACT_COUNT: usize = 10;
pub const DEMO_TASK_COUNT: usize = 5;

const SEEDED_AT: &str = "2024-01-01T10:00:00.000Z";

// (id, name, email, phone, initials, color, created_by)
const CONTACTS: [(&str, &str, &str, &str, &str, &str, &str); DEMO_CONTACT_COUNT] = [
    ("contact_demo_1", "Sofia Müller", "sofia@gmail.com", "+49 1111 11 111", "SM", "#FF5EB3", "user_demo_1"),
    ("contact_demo_2", "Marcel Bauer", "marcel@gmail.com", "+49 2222 22 222", "MB", "#1FD7C1", "user_demo_1"),
    ("contact_demo_3", "Benedikt Ziegler", "benedikt@gmail.com", "+49 3333 33 333", "BZ", "#462F8A", "user_demo_2"),
    ("contact_demo_4", "Laura Schmidt", "laura@gmail.com", "+49 4444 44 444", "LS", "#FF7A00", "user_demo_1"),
    ("contact_demo_5", "Thomas Weber", "thomas@gmail.com", "+49 5555 55 555", "TW", "#9327FF", "user_demo_1"),
    ("contact_demo_6", "Nina Fischer", "nina@gmail.com", "+49 6666 66 666", "NF", "#7AE229", "user_demo_1"),
    ("contact_demo_7", "Felix Wagner", "felix@gmail.com", "+49 7777 77 777", "FW", "#FF3D00", "user_demo_2"),
    ("contact_demo_8", "Sarah Meyer", "sarah@gmail.com", "+49 8888 88 888", "SM", "#FFBB2B", "user_demo_2"),
    ("contact_demo_9", "Max Hoffmann", "max@gmail.com", "+49 9999 99 999", "MH", "#0038FF", "user_demo_2"),
    ("contact_demo_10", "Julia Becker", "julia@gmail.com", "+49 1010 10 101", "JB", "#FF5EB3", "user_demo_1"),
];

fn seeded_at() -> Timestamp {
    DateTime::parse_from_rfc3339(SEEDED_AT)
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_default()
}

fn due(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn subtasks(items: &[(&str, &str, bool)]) -> Vec<Subtask> {
    items
        .iter()
        .map(|(id, title, completed)| Subtask {
            id: id.to_string(),
            title: title.to_string(),
            completed: *completed,
        })
        .collect()
}

fn ids(items: &[&str]) -> Vec<String> {
    items.iter().map(|id| id.to_string()).collect()
}

pub fn demo_contacts() -> Vec<Contact> {
    let created_at = seeded_at();
    CONTACTS
        .iter()
        .map(|(id, name, email, phone, initials, color, created_by)| Contact {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            initials: initials.to_string(),
            color: color.to_string(),
            user_id: None,
            created_at,
            created_by: created_by.to_string(),
        })
        .collect()
}

pub fn demo_tasks() -> Vec<Task> {
    let at = seeded_at();
    let task = |id: &str,
                title: &str,
                description: &str,
                category: TaskCategory,
                due_date: NaiveDate,
                priority: Priority,
                status: TaskStatus,
                assigned_to: Vec<String>,
                subtasks: Vec<Subtask>,
                created_by: &str| Task {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category,
        due_date,
        priority,
        status,
        assigned_to,
        subtasks,
        created_at: at,
        created_by: created_by.to_string(),
        updated_at: at,
    };

    vec![
        task(
            "task_demo_1",
            "CSS Architecture Planning",
            "Define CSS naming conventions, create style guide, and establish component structure for scalable styling.",
            TaskCategory::TechnicalTask,
            due(2025, 12, 25),
            Priority::Medium,
            TaskStatus::InProgress,
            ids(&["contact_demo_1", "contact_demo_2"]),
            subtasks(&[
                ("subtask_1", "Research CSS methodologies", true),
                ("subtask_2", "Create style guide document", false),
                ("subtask_3", "Set up component library", false),
            ]),
            "user_demo_1",
        ),
        task(
            "task_demo_2",
            "User Registration Flow",
            "Implement complete user registration with validation, email verification, and welcome sequence.",
            TaskCategory::UserStory,
            due(2025, 12, 20),
            Priority::Urgent,
            TaskStatus::ToDo,
            ids(&["contact_demo_1"]),
            subtasks(&[
                ("subtask_4", "Design registration form", false),
                ("subtask_5", "Add form validation", false),
            ]),
            "user_demo_1",
        ),
        task(
            "task_demo_3",
            "Database Optimization",
            "Optimize database queries and implement caching for better performance.",
            TaskCategory::TechnicalTask,
            due(2025, 12, 30),
            Priority::Low,
            TaskStatus::AwaitFeedback,
            ids(&["contact_demo_2"]),
            Vec::new(),
            "user_demo_2",
        ),
        task(
            "task_demo_4",
            "Mobile App Testing",
            "Comprehensive testing of mobile app functionality across different devices and operating systems.",
            TaskCategory::UserStory,
            due(2025, 12, 15),
            Priority::Medium,
            TaskStatus::Done,
            ids(&["contact_demo_1", "contact_demo_2"]),
            subtasks(&[
                ("subtask_6", "iOS testing", true),
                ("subtask_7", "Android testing", true),
            ]),
            "user_demo_2",
        ),
        task(
            "task_demo_5",
            "API Documentation",
            "Create comprehensive API documentation with examples and best practices guide.",
            TaskCategory::TechnicalTask,
            due(2025, 12, 18),
            Priority::Urgent,
            TaskStatus::ToDo,
            ids(&["contact_demo_4", "contact_demo_5"]),
            subtasks(&[
                ("subtask_8", "Write endpoint descriptions", false),
                ("subtask_9", "Add code examples", false),
            ]),
            "user_demo_1",
        ),
    ]
}

/// The two demo accounts, both signing in with [`DEMO_PASSWORD`].
pub fn demo_users(now: Timestamp) -> Vec<User> {
    [
        ("user_demo_1", "Anton Mayer", "anton@gmail.com", "AM", "#FF7A00"),
        ("user_demo_2", "Anja Schulz", "anja@gmail.com", "AS", "#9327FF"),
    ]
    .into_iter()
    .map(|(id, name, email, initials, color)| User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: Some(DEMO_PASSWORD.to_string()),
        initials: initials.to_string(),
        color: color.to_string(),
        is_guest: false,
        created_at: now,
        last_login: None,
    })
    .collect()
}
