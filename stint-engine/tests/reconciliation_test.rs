//! Reconciliation integration tests
//!
//! Exercises the confirmed-write applier and the derived rules through
//! a signed-in controller:
//! - writes land in the mirror only after the backend confirms them
//! - a failed write leaves the mirror untouched
//! - badge rules fire exactly once, with their unlock notifications
//! - mark-all-read stays optimistic under a backend outage
//! - the supervisor approval flow unlocks sign-in

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use stint_engine::catalog::{BADGE_MEETINGS, BADGE_TASKS};
use stint_engine::entities::{LogStatus, NewUser, Role, TaskPriority, TaskStatus, UserStatus};
use stint_engine::mutation::{NewLog, NewMeeting, NewTask};
use stint_engine::{EngineConfig, EngineError, SessionController};
use stint_gateway::{MemoryGateway, RemoteGateway};

const STUDENT: &str = "auth-1";

fn seeded_gateway() -> Arc<MemoryGateway> {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.register_identity("amina@example.edu", "pw", STUDENT);
    gateway.seed(
        "users",
        json!({
            "id": STUDENT,
            "name": "Amina Diallo",
            "email": "amina@example.edu",
            "role": "STUDENT",
            "status": "ACTIVE",
        }),
    );
    gateway
}

async fn student_session(gateway: &Arc<MemoryGateway>) -> Arc<SessionController> {
    let controller = SessionController::new(
        Arc::clone(gateway) as Arc<dyn RemoteGateway>,
        EngineConfig::new(),
    );
    controller.login("amina@example.edu", "pw").await.unwrap();
    controller
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn new_task(n: usize) -> NewTask {
    NewTask {
        title: format!("Task {}", n),
        description: "Integration work".to_string(),
        assigned_to_id: STUDENT.to_string(),
        assigned_by_id: "sup-1".to_string(),
        priority: TaskPriority::Medium,
        due_date: None,
        linked_goal_id: None,
    }
}

// =============================================================================
// Confirmed-write-then-commit
// =============================================================================

#[tokio::test]
async fn test_log_approval_round_trip() {
    let gateway = seeded_gateway();
    let controller = student_session(&gateway).await;

    let entry = controller
        .mutations()
        .add_log(NewLog {
            student_id: STUDENT.to_string(),
            date: date(2),
            hours_worked: 6.5,
            activity_description: "Prototyped the intake form".to_string(),
            challenges: None,
        })
        .await
        .unwrap();

    assert_eq!(entry.status, LogStatus::Pending);
    assert_eq!(controller.mirror().logs.len(), 1);
    assert_eq!(gateway.row_count("logs"), 1);

    let approved = controller
        .mutations()
        .approve_log(&entry.id, true, Some("Good detail".to_string()))
        .await
        .unwrap();

    assert_eq!(approved.status, LogStatus::Approved);
    assert_eq!(
        controller.mirror().logs.get(&entry.id).unwrap().status,
        LogStatus::Approved
    );
    assert_eq!(gateway.rows("logs")[0]["status"], "APPROVED");
    // A single approved day is a streak of one; no badge fires.
    assert_eq!(gateway.row_count("user_badges"), 0);
}

#[tokio::test]
async fn test_failed_write_leaves_the_mirror_untouched() {
    let gateway = seeded_gateway();
    let controller = student_session(&gateway).await;

    gateway.fail_next_insert();
    let err = controller.mutations().add_task(new_task(1)).await.unwrap_err();
    assert!(matches!(err, EngineError::Gateway(_)));
    assert!(controller.mirror().tasks.is_empty());
    assert_eq!(gateway.row_count("tasks"), 0);

    // The next attempt goes through cleanly.
    controller.mutations().add_task(new_task(1)).await.unwrap();
    assert_eq!(controller.mirror().tasks.len(), 1);
}

// =============================================================================
// Derived rules
// =============================================================================

#[tokio::test]
async fn test_task_volume_badge_awarded_exactly_once() {
    let gateway = seeded_gateway();
    let controller = student_session(&gateway).await;

    let mut task_ids = Vec::new();
    for n in 0..10 {
        let task = controller.mutations().add_task(new_task(n)).await.unwrap();
        task_ids.push(task.id);
    }
    for id in &task_ids {
        controller
            .mutations()
            .update_task_status(id, TaskStatus::Completed)
            .await
            .unwrap();
    }

    let awards = controller
        .mirror()
        .user_badges
        .filter(|ub| ub.user_id == STUDENT && ub.badge_id == BADGE_TASKS);
    assert_eq!(awards.len(), 1);
    assert_eq!(gateway.row_count("user_badges"), 1);

    // The unlock notification names the badge and its points.
    let feed = controller.mirror().notifications_for(STUDENT);
    let unlock = feed
        .iter()
        .find(|n| n.title == "Badge Unlocked!")
        .expect("unlock notification");
    assert!(unlock.message.contains("Task Master"));
    assert!(unlock.message.contains("100 XP"));

    // An eleventh completion must not re-award.
    let extra = controller.mutations().add_task(new_task(11)).await.unwrap();
    controller
        .mutations()
        .update_task_status(&extra.id, TaskStatus::Completed)
        .await
        .unwrap();
    assert_eq!(gateway.row_count("user_badges"), 1);
}

#[tokio::test]
async fn test_meeting_badge_counts_attendance_per_person() {
    let gateway = seeded_gateway();
    let controller = student_session(&gateway).await;

    for n in 0..3 {
        let mut attendees = vec![STUDENT.to_string()];
        if n < 2 {
            attendees.push("sup-1".to_string());
        }
        controller
            .mutations()
            .schedule_meeting(NewMeeting {
                title: format!("Sync {}", n),
                organizer_id: "sup-1".to_string(),
                date: Some(date(10 + n as u32)),
                time: "10:00".to_string(),
                attendees,
                link: None,
            })
            .await
            .unwrap();
    }

    // Three meetings for the student, only two for the supervisor.
    let awards = controller.mirror().user_badges.all();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].user_id, STUDENT);
    assert_eq!(awards[0].badge_id, BADGE_MEETINGS);
}

// =============================================================================
// Optimistic exceptions
// =============================================================================

#[tokio::test]
async fn test_mark_all_read_is_optimistic_under_an_outage() {
    let gateway = seeded_gateway();
    gateway.seed(
        "notifications",
        json!({
            "id": "n-direct", "recipient_id": STUDENT, "sender_id": "sup-1",
            "title": "Direct", "message": "m", "read": false,
            "timestamp": "2026-03-01T08:00:00Z",
        }),
    );
    gateway.seed(
        "notifications",
        json!({
            "id": "n-all", "recipient_id": "ALL", "sender_id": "sup-1",
            "title": "Broadcast", "message": "m", "read": false,
            "timestamp": "2026-03-02T08:00:00Z",
        }),
    );
    gateway.seed(
        "notifications",
        json!({
            "id": "n-foreign", "recipient_id": "someone-else", "sender_id": "sup-1",
            "title": "Foreign", "message": "m", "read": false,
            "timestamp": "2026-03-03T08:00:00Z",
        }),
    );
    let controller = student_session(&gateway).await;
    assert_eq!(controller.mirror().unread_count(STUDENT), 2);

    gateway.set_offline(true);
    let flipped = controller.mutations().mark_all_notifications_read(STUDENT).await;

    assert_eq!(flipped, 2);
    assert_eq!(controller.mirror().unread_count(STUDENT), 0);
    // Rows not addressed to this account stay untouched.
    assert!(!controller.mirror().notifications.get("n-foreign").unwrap().read);
    // The remote pushes failed; backend rows still say unread.
    gateway.set_offline(false);
    for row in gateway.rows("notifications") {
        assert_eq!(row["read"], false);
    }
}

// =============================================================================
// Account administration
// =============================================================================

#[tokio::test]
async fn test_supervisor_approval_unlocks_sign_in() {
    let gateway = seeded_gateway();
    gateway.register_identity("osei@example.edu", "pw", "auth-5");
    gateway.seed(
        "users",
        json!({
            "id": "auth-5",
            "name": "Dr. Osei",
            "email": "osei@example.edu",
            "role": "SUPERVISOR",
            "status": "PENDING",
        }),
    );
    let controller = student_session(&gateway).await;

    let err = controller.login("osei@example.edu", "pw").await.unwrap_err();
    assert!(matches!(err, EngineError::PendingApproval));

    // Re-establish the admin-side session the failed login revoked.
    controller.login("amina@example.edu", "pw").await.unwrap();
    let approved = controller
        .mutations()
        .approve_user("auth-5", UserStatus::Active)
        .await
        .unwrap();
    assert_eq!(approved.status, UserStatus::Active);

    controller.logout().await;
    let profile = controller.login("osei@example.edu", "pw").await.unwrap();
    assert_eq!(profile.id, "auth-5");
    assert!(controller.is_authenticated());
}

#[tokio::test]
async fn test_admin_created_account_can_be_removed() {
    let gateway = seeded_gateway();
    let controller = student_session(&gateway).await;

    let profile = controller
        .mutations()
        .add_user(NewUser {
            name: "Temp Intern".to_string(),
            email: "temp@example.edu".to_string(),
            role: Role::Student,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(gateway.row_count("users"), 2);
    assert!(controller.mirror().users.contains(&profile.id));

    controller.mutations().delete_user(&profile.id).await.unwrap();
    assert_eq!(gateway.row_count("users"), 1);
    assert!(!controller.mirror().users.contains(&profile.id));
}
