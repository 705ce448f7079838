//! Derived-rule decisions: pure functions over mirror snapshots.
//!
//! The applier evaluates these after a commit and turns positive answers
//! into badge grants. Everything here is synchronous and side-effect
//! free, which is what keeps the rules testable without a gateway.

use chrono::NaiveDate;

use crate::entities::{LogEntry, Meeting, Task, TaskStatus};

/// Consecutive logged days needed for the streak badge.
pub const STREAK_TARGET: u32 = 5;

/// Completed tasks needed for the task-volume badge.
pub const COMPLETED_TASKS_TARGET: usize = 10;

/// Attended meetings needed for the collaboration badge.
pub const MEETINGS_TARGET: usize = 3;

/// Longest run of consecutive calendar days. Duplicate dates collapse
/// before counting, so two logs on one day never extend a run.
pub fn longest_daily_run(dates: &[NaiveDate]) -> u32 {
    let mut unique: Vec<NaiveDate> = dates.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for date in unique {
        run = match previous {
            Some(prev) if (date - prev).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }
    longest
}

/// Whether the student's logs, including any just-committed one, contain a
/// qualifying streak.
pub fn qualifies_for_streak_badge(logs: &[LogEntry], student_id: &str) -> bool {
    let dates: Vec<NaiveDate> = logs
        .iter()
        .filter(|log| log.student_id == student_id)
        .map(|log| log.date)
        .collect();
    longest_daily_run(&dates) >= STREAK_TARGET
}

/// COMPLETED tasks currently assigned to the student.
pub fn completed_task_count(tasks: &[Task], assignee_id: &str) -> usize {
    tasks
        .iter()
        .filter(|task| task.assigned_to_id == assignee_id && task.status == TaskStatus::Completed)
        .count()
}

/// Meetings that list the account as an attendee.
pub fn meeting_count(meetings: &[Meeting], attendee_id: &str) -> usize {
    meetings
        .iter()
        .filter(|meeting| meeting.attendees.iter().any(|a| a == attendee_id))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::MirrorEntity;
    use serde_json::json;

    fn date(text: &str) -> NaiveDate {
        text.parse().unwrap()
    }

    fn log(student: &str, day: &str) -> LogEntry {
        LogEntry::from_record(&json!({
            "id": format!("{student}-{day}"),
            "student_id": student,
            "date": day,
        }))
    }

    #[test]
    fn test_five_consecutive_days_qualify() {
        let logs: Vec<LogEntry> = (10..15)
            .map(|d| log("s-1", &format!("2026-03-{d}")))
            .collect();
        assert!(qualifies_for_streak_badge(&logs, "s-1"));
    }

    #[test]
    fn test_duplicate_days_do_not_extend_a_run() {
        let mut logs: Vec<LogEntry> = (10..14)
            .map(|d| log("s-1", &format!("2026-03-{d}")))
            .collect();
        logs.push(log("s-1", "2026-03-13"));
        assert_eq!(logs.len(), 5);
        assert!(!qualifies_for_streak_badge(&logs, "s-1"));
    }

    #[test]
    fn test_a_gap_resets_the_run() {
        let days = ["2026-03-01", "2026-03-02", "2026-03-03", "2026-03-05", "2026-03-06"];
        let logs: Vec<LogEntry> = days.iter().map(|d| log("s-1", d)).collect();
        assert!(!qualifies_for_streak_badge(&logs, "s-1"));
    }

    #[test]
    fn test_insertion_order_is_irrelevant() {
        let shuffled = ["2026-03-14", "2026-03-10", "2026-03-12", "2026-03-11", "2026-03-13"];
        let dates: Vec<NaiveDate> = shuffled.iter().map(|d| date(d)).collect();
        assert_eq!(longest_daily_run(&dates), 5);
    }

    #[test]
    fn test_other_students_logs_are_ignored() {
        let mut logs: Vec<LogEntry> = (10..15)
            .map(|d| log("s-2", &format!("2026-03-{d}")))
            .collect();
        logs.push(log("s-1", "2026-03-10"));
        assert!(!qualifies_for_streak_badge(&logs, "s-1"));
    }

    #[test]
    fn test_month_boundaries_still_count_as_consecutive() {
        let days = ["2026-01-29", "2026-01-30", "2026-01-31", "2026-02-01", "2026-02-02"];
        let dates: Vec<NaiveDate> = days.iter().map(|d| date(d)).collect();
        assert_eq!(longest_daily_run(&dates), 5);
    }

    #[test]
    fn test_task_count_filters_by_assignee_and_status() {
        let tasks = vec![
            Task::from_record(&json!({ "id": "t-1", "assigned_to_id": "s-1", "status": "COMPLETED" })),
            Task::from_record(&json!({ "id": "t-2", "assigned_to_id": "s-1", "status": "IN_PROGRESS" })),
            Task::from_record(&json!({ "id": "t-3", "assigned_to_id": "s-2", "status": "COMPLETED" })),
        ];
        assert_eq!(completed_task_count(&tasks, "s-1"), 1);
    }

    #[test]
    fn test_meeting_count_matches_attendee_lists() {
        let meetings = vec![
            Meeting::from_record(&json!({ "id": "m-1", "attendees": ["s-1", "s-2"] })),
            Meeting::from_record(&json!({ "id": "m-2", "attendees": ["s-2"] })),
        ];
        assert_eq!(meeting_count(&meetings, "s-1"), 1);
        assert_eq!(meeting_count(&meetings, "s-2"), 2);
    }
}
