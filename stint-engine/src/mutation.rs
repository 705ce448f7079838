//! Mutation applier: confirmed-write-then-commit for every collection.
//!
//! Each operation sends the remote write first and touches the mirror
//! only after the gateway confirms it, committing the record the server
//! returned rather than the payload that was sent. The two deliberate
//! optimistic exceptions (sign-out, mark-all-read) are called out where
//! they happen. Derived rules run after the commit; their failures are
//! logged and never rolled back against the triggering mutation.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use stint_gateway::{Filter, RemoteGateway};

use crate::catalog::{BADGE_MEETINGS, BADGE_PRAISE, BADGE_STREAK, BADGE_TASKS};
use crate::config::DEFAULT_HOURS_REQUIRED;
use crate::entities::{
    default_avatar, AttendanceException, AttendanceKind, Evaluation, EvaluationKind,
    EvaluationScore, Goal, GoalStatus, LeaveKind, LeaveRequest, LeaveStatus, LogEntry, LogStatus,
    Meeting, Message, NewUser, Notification, NotificationKind, Profile, Report, ReportKind,
    Resource, ResourceKind, Role, SiteVisit, Skill, SkillAssessment, SkillRating, Task,
    TaskDeliverable, TaskFeedback, TaskFeedbackKind, TaskPriority, TaskStatus, UserBadge,
    UserStatus, SYSTEM_SENDER,
};
use crate::error::Result;
use crate::mirror::{MirrorEntity, MirrorStore};
use crate::rules;

/// Work-log input.
#[derive(Clone, Debug)]
pub struct NewLog {
    pub student_id: String,
    pub date: NaiveDate,
    pub hours_worked: f64,
    pub activity_description: String,
    pub challenges: Option<String>,
}

/// Task input. Status and creation time are applier-assigned.
#[derive(Clone, Debug)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assigned_to_id: String,
    pub assigned_by_id: String,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub linked_goal_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewReport {
    pub student_id: String,
    pub kind: ReportKind,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub summary: String,
    pub key_learnings: String,
    pub next_steps: String,
}

#[derive(Clone, Debug)]
pub struct NewEvaluation {
    pub student_id: String,
    pub supervisor_id: String,
    pub kind: EvaluationKind,
    pub date: DateTime<Utc>,
    pub scores: Vec<EvaluationScore>,
    pub overall_feedback: String,
}

#[derive(Clone, Debug)]
pub struct NewMeeting {
    pub title: String,
    pub organizer_id: String,
    pub date: Option<NaiveDate>,
    pub time: String,
    pub attendees: Vec<String>,
    pub link: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewSkillAssessment {
    pub student_id: String,
    pub rater_id: String,
    pub rater_role: Role,
    pub date: DateTime<Utc>,
    pub ratings: Vec<SkillRating>,
}

#[derive(Clone, Debug)]
pub struct NewLeaveRequest {
    pub student_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kind: LeaveKind,
    pub reason: String,
}

#[derive(Clone, Debug)]
pub struct NewSiteVisit {
    pub student_id: String,
    pub visitor_id: String,
    pub date: Option<NaiveDate>,
    pub location: String,
    pub purpose: String,
    pub notes: String,
}

/// The mutation surface over one gateway/mirror pair.
pub struct Mutations {
    gateway: Arc<dyn RemoteGateway>,
    mirror: Arc<MirrorStore>,
}

impl Mutations {
    pub fn new(gateway: Arc<dyn RemoteGateway>, mirror: Arc<MirrorStore>) -> Self {
        Mutations { gateway, mirror }
    }

    // === Generic confirmed-write plumbing ===

    async fn create<T: MirrorEntity>(&self, payload: Value) -> Result<T> {
        let record = self.gateway.insert(T::COLLECTION.as_str(), payload).await?;
        Ok(T::slot(&self.mirror).commit_record(&record))
    }

    async fn patch<T: MirrorEntity>(&self, id: &str, patch: Value) -> Result<T> {
        let record = self
            .gateway
            .update(T::COLLECTION.as_str(), &Filter::by_id(id), patch)
            .await?;
        Ok(T::slot(&self.mirror).commit_record(&record))
    }

    async fn remove<T: MirrorEntity>(&self, id: &str) -> Result<()> {
        self.gateway.delete(T::COLLECTION.as_str(), id).await?;
        T::slot(&self.mirror).remove(id);
        Ok(())
    }

    // === Work logs ===

    /// Adds a PENDING log and evaluates the streak rule over the updated
    /// mirror.
    pub async fn add_log(&self, new_log: NewLog) -> Result<LogEntry> {
        let payload = json!({
            "student_id": new_log.student_id,
            "date": new_log.date,
            "hours_worked": new_log.hours_worked,
            "activity_description": new_log.activity_description,
            "challenges": new_log.challenges,
            "status": LogStatus::Pending.as_wire(),
        });
        let entry: LogEntry = self.create(payload).await?;

        let logs = self.mirror.logs.all();
        if rules::qualifies_for_streak_badge(&logs, &entry.student_id) {
            self.grant_if_due(&entry.student_id, BADGE_STREAK).await;
        }
        Ok(entry)
    }

    pub async fn approve_log(
        &self,
        log_id: &str,
        approved: bool,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        let status = if approved {
            LogStatus::Approved
        } else {
            LogStatus::Rejected
        };
        self.patch(
            log_id,
            json!({ "status": status.as_wire(), "supervisor_comment": comment }),
        )
        .await
    }

    // === Tasks ===

    pub async fn add_task(&self, new_task: NewTask) -> Result<Task> {
        let payload = json!({
            "title": new_task.title,
            "description": new_task.description,
            "assigned_to_id": new_task.assigned_to_id,
            "assigned_by_id": new_task.assigned_by_id,
            "status": TaskStatus::Todo.as_wire(),
            "priority": new_task.priority.as_wire(),
            "due_date": new_task.due_date,
            "linked_goal_id": new_task.linked_goal_id,
            "created_at": Utc::now().to_rfc3339(),
        });
        self.create(payload).await
    }

    /// Moves a task to a new status; completion feeds the task-volume rule.
    pub async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task> {
        let task: Task = self
            .patch(task_id, json!({ "status": status.as_wire() }))
            .await?;
        if task.status == TaskStatus::Completed {
            self.check_task_volume(&task.assigned_to_id).await;
        }
        Ok(task)
    }

    /// Attaches a deliverable and completes the task in one write.
    pub async fn submit_deliverable(
        &self,
        task_id: &str,
        deliverable: TaskDeliverable,
    ) -> Result<Task> {
        let task: Task = self
            .patch(
                task_id,
                json!({
                    "deliverable": deliverable.to_wire(),
                    "status": TaskStatus::Completed.as_wire(),
                }),
            )
            .await?;
        self.check_task_volume(&task.assigned_to_id).await;
        Ok(task)
    }

    /// Records supervisor feedback; praise feeds the recognition rule.
    pub async fn give_feedback(&self, task_id: &str, feedback: TaskFeedback) -> Result<Task> {
        let task: Task = self
            .patch(task_id, json!({ "feedback": feedback.to_wire() }))
            .await?;
        if feedback.kind == TaskFeedbackKind::Praise {
            self.grant_if_due(&task.assigned_to_id, BADGE_PRAISE).await;
        }
        Ok(task)
    }

    // === Reports ===

    pub async fn add_report(&self, new_report: NewReport) -> Result<Report> {
        let payload = json!({
            "student_id": new_report.student_id,
            "type": new_report.kind.as_wire(),
            "period_start": new_report.period_start,
            "period_end": new_report.period_end,
            "summary": new_report.summary,
            "key_learnings": new_report.key_learnings,
            "next_steps": new_report.next_steps,
            "submitted_at": Utc::now().to_rfc3339(),
        });
        self.create(payload).await
    }

    // === Goals ===

    pub async fn add_goal(
        &self,
        student_id: &str,
        description: &str,
        category: &str,
        alignment: &str,
    ) -> Result<Goal> {
        let payload = json!({
            "student_id": student_id,
            "description": description,
            "category": category,
            "alignment": alignment,
            "status": GoalStatus::NotStarted.as_wire(),
            "progress": 0,
        });
        self.create(payload).await
    }

    pub async fn update_goal(&self, goal: &Goal) -> Result<Goal> {
        self.patch(
            &goal.id,
            json!({
                "description": goal.description,
                "category": goal.category,
                "alignment": goal.alignment,
                "status": goal.status.as_wire(),
                "progress": goal.progress,
            }),
        )
        .await
    }

    pub async fn delete_goal(&self, goal_id: &str) -> Result<()> {
        self.remove::<Goal>(goal_id).await
    }

    // === Resources ===

    pub async fn add_resource(
        &self,
        title: &str,
        kind: ResourceKind,
        url: &str,
        uploaded_by: &str,
    ) -> Result<Resource> {
        let payload = json!({
            "title": title,
            "type": kind.as_wire(),
            "url": url,
            "uploaded_by": uploaded_by,
            "upload_date": Utc::now().to_rfc3339(),
        });
        self.create(payload).await
    }

    // === Evaluations ===

    pub async fn add_evaluation(&self, new_evaluation: NewEvaluation) -> Result<Evaluation> {
        let scores: Vec<Value> = new_evaluation.scores.iter().map(|s| s.to_wire()).collect();
        let payload = json!({
            "student_id": new_evaluation.student_id,
            "supervisor_id": new_evaluation.supervisor_id,
            "type": new_evaluation.kind.as_wire(),
            "date": new_evaluation.date.to_rfc3339(),
            "scores": scores,
            "overall_feedback": new_evaluation.overall_feedback,
        });
        self.create(payload).await
    }

    // === Messages ===

    pub async fn send_message(
        &self,
        sender_id: &str,
        content: &str,
        channel: &str,
        related_student_id: &str,
    ) -> Result<Message> {
        let payload = json!({
            "sender_id": sender_id,
            "content": content,
            "channel": channel,
            "related_student_id": related_student_id,
            "timestamp": Utc::now().to_rfc3339(),
        });
        self.create(payload).await
    }

    // === Meetings ===

    /// Schedules a meeting and evaluates the collaboration rule for every
    /// attendee, the new meeting included.
    pub async fn schedule_meeting(&self, new_meeting: NewMeeting) -> Result<Meeting> {
        let payload = json!({
            "title": new_meeting.title,
            "organizer_id": new_meeting.organizer_id,
            "date": new_meeting.date,
            "time": new_meeting.time,
            "attendees": new_meeting.attendees,
            "link": new_meeting.link,
        });
        let meeting: Meeting = self.create(payload).await?;

        let meetings = self.mirror.meetings.all();
        for attendee in &meeting.attendees {
            if rules::meeting_count(&meetings, attendee) >= rules::MEETINGS_TARGET {
                self.grant_if_due(attendee, BADGE_MEETINGS).await;
            }
        }
        Ok(meeting)
    }

    // === Notifications ===

    pub async fn send_notification(
        &self,
        recipient_id: &str,
        sender_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> Result<Notification> {
        let payload = json!({
            "recipient_id": recipient_id,
            "sender_id": sender_id,
            "title": title,
            "message": message,
            "type": kind.as_wire(),
            "timestamp": Utc::now().to_rfc3339(),
            "read": false,
        });
        self.create(payload).await
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<Notification> {
        self.patch(notification_id, json!({ "read": true })).await
    }

    /// Marks the whole feed read. Optimistic by design: the mirror flips
    /// immediately, then each row is pushed best-effort and failures are
    /// only logged. Returns how many rows were flipped.
    pub async fn mark_all_notifications_read(&self, profile_id: &str) -> usize {
        let unread = self
            .mirror
            .notifications
            .filter(|n| n.addresses(profile_id) && !n.read);

        for notification in &unread {
            let mut flipped = notification.clone();
            flipped.read = true;
            self.mirror.notifications.commit(flipped);
        }

        for notification in &unread {
            let result = self
                .gateway
                .update(
                    Notification::COLLECTION.as_str(),
                    &Filter::by_id(&notification.id),
                    json!({ "read": true }),
                )
                .await;
            if let Err(error) = result {
                warn!(
                    notification_id = %notification.id,
                    %error,
                    "read-state push failed, mirror keeps the optimistic value"
                );
            }
        }
        unread.len()
    }

    // === Skills ===

    pub async fn add_skill(&self, name: &str, category: &str) -> Result<Skill> {
        self.create(json!({ "name": name, "category": category }))
            .await
    }

    pub async fn add_skill_assessment(
        &self,
        new_assessment: NewSkillAssessment,
    ) -> Result<SkillAssessment> {
        let ratings: Vec<Value> = new_assessment.ratings.iter().map(|r| r.to_wire()).collect();
        let payload = json!({
            "student_id": new_assessment.student_id,
            "rater_id": new_assessment.rater_id,
            "role": new_assessment.rater_role.as_wire(),
            "date": new_assessment.date.to_rfc3339(),
            "ratings": ratings,
        });
        self.create(payload).await
    }

    // === Leave requests ===

    pub async fn add_leave_request(&self, new_request: NewLeaveRequest) -> Result<LeaveRequest> {
        let payload = json!({
            "student_id": new_request.student_id,
            "start_date": new_request.start_date,
            "end_date": new_request.end_date,
            "type": new_request.kind.as_wire(),
            "reason": new_request.reason,
            "status": LeaveStatus::Pending.as_wire(),
        });
        self.create(payload).await
    }

    pub async fn update_leave_status(
        &self,
        request_id: &str,
        status: LeaveStatus,
    ) -> Result<LeaveRequest> {
        self.patch(request_id, json!({ "status": status.as_wire() }))
            .await
    }

    // === Site visits ===

    pub async fn add_site_visit(&self, new_visit: NewSiteVisit) -> Result<SiteVisit> {
        let payload = json!({
            "student_id": new_visit.student_id,
            "visitor_id": new_visit.visitor_id,
            "date": new_visit.date,
            "location": new_visit.location,
            "purpose": new_visit.purpose,
            "notes": new_visit.notes,
        });
        self.create(payload).await
    }

    pub async fn update_site_visit(&self, visit: &SiteVisit) -> Result<SiteVisit> {
        self.patch(
            &visit.id,
            json!({
                "date": visit.date,
                "location": visit.location,
                "purpose": visit.purpose,
                "notes": visit.notes,
            }),
        )
        .await
    }

    pub async fn delete_site_visit(&self, visit_id: &str) -> Result<()> {
        self.remove::<SiteVisit>(visit_id).await
    }

    // === Attendance exceptions ===

    pub async fn add_attendance_exception(
        &self,
        student_id: &str,
        date: NaiveDate,
        reason: &str,
        kind: AttendanceKind,
    ) -> Result<AttendanceException> {
        let payload = json!({
            "student_id": student_id,
            "date": date,
            "reason": reason,
            "type": kind.as_wire(),
        });
        self.create(payload).await
    }

    pub async fn delete_attendance_exception(&self, exception_id: &str) -> Result<()> {
        self.remove::<AttendanceException>(exception_id).await
    }

    // === Accounts ===

    pub async fn approve_user(&self, user_id: &str, status: UserStatus) -> Result<Profile> {
        self.patch(user_id, json!({ "status": status.as_wire() }))
            .await
    }

    /// Supervisor-side profile edit, private notes included.
    pub async fn update_intern(&self, profile: &Profile) -> Result<Profile> {
        self.patch(
            &profile.id,
            json!({
                "name": profile.name,
                "phone": profile.phone,
                "institution": profile.institution,
                "department": profile.department,
                "bio": profile.bio,
                "hobbies": profile.hobbies,
                "profile_skills": profile.profile_skills,
                "achievements": profile.achievements,
                "future_goals": profile.future_goals,
                "role": profile.role.as_wire(),
                "status": profile.status.as_wire(),
                "supervisor_notes": profile.supervisor_notes,
            }),
        )
        .await
    }

    /// Self-service profile edit. Role, status, and supervisor notes are
    /// not the account owner's to change.
    pub async fn update_profile(&self, profile: &Profile) -> Result<Profile> {
        self.patch(
            &profile.id,
            json!({
                "name": profile.name,
                "phone": profile.phone,
                "institution": profile.institution,
                "department": profile.department,
                "bio": profile.bio,
                "hobbies": profile.hobbies,
                "profile_skills": profile.profile_skills,
                "achievements": profile.achievements,
                "future_goals": profile.future_goals,
            }),
        )
        .await
    }

    /// Admin-created account. Active immediately; the id is minted here
    /// because no identity exists to borrow one from.
    pub async fn add_user(&self, new_user: NewUser) -> Result<Profile> {
        let avatar = new_user
            .avatar
            .clone()
            .unwrap_or_else(|| default_avatar(&new_user.name));
        let payload = json!({
            "id": Uuid::new_v4().to_string(),
            "email": new_user.email,
            "name": new_user.name,
            "role": new_user.role.as_wire(),
            "status": UserStatus::Active.as_wire(),
            "avatar": avatar,
            "phone": new_user.phone,
            "institution": new_user.institution,
            "department": new_user.department,
            "bio": new_user.bio,
            "hobbies": new_user.hobbies,
            "profile_skills": new_user.profile_skills,
            "achievements": new_user.achievements,
            "future_goals": new_user.future_goals,
            "total_hours_required": new_user.total_hours_required.unwrap_or(DEFAULT_HOURS_REQUIRED),
            "internship_start_date": new_user.internship_start_date,
            "internship_end_date": new_user.internship_end_date,
            "assigned_supervisor_id": new_user.assigned_supervisor_id,
            "password": new_user.password.as_deref().unwrap_or("placeholder_password"),
        });
        self.create(payload).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.remove::<Profile>(user_id).await
    }

    // === Badges ===

    /// Grants a badge once. Held badges return silently; a successful
    /// grant emits the unlock notification when the catalog knows the
    /// badge.
    pub async fn award_badge(&self, user_id: &str, badge_id: &str) -> Result<()> {
        let held = self
            .mirror
            .user_badges
            .find(|ub| ub.user_id == user_id && ub.badge_id == badge_id);
        if held.is_some() {
            debug!(user_id, badge_id, "badge already held");
            return Ok(());
        }

        let badge = self.mirror.badges.get(badge_id);
        let _grant: UserBadge = self
            .create(json!({
                "user_id": user_id,
                "badge_id": badge_id,
                "earned_at": Utc::now().to_rfc3339(),
            }))
            .await?;

        if let Some(badge) = badge {
            self.send_notification(
                user_id,
                SYSTEM_SENDER,
                "Badge Unlocked!",
                &format!(
                    "Congratulations! You've earned the \"{}\" badge and {} XP!",
                    badge.name, badge.points
                ),
                NotificationKind::Info,
            )
            .await?;
        }
        Ok(())
    }

    async fn grant_if_due(&self, user_id: &str, badge_id: &str) {
        if let Err(error) = self.award_badge(user_id, badge_id).await {
            warn!(user_id, badge_id, %error, "badge grant failed");
        }
    }

    async fn check_task_volume(&self, assignee_id: &str) {
        let tasks = self.mirror.tasks.all();
        if rules::completed_task_count(&tasks, assignee_id) >= rules::COMPLETED_TASKS_TARGET {
            self.grant_if_due(assignee_id, BADGE_TASKS).await;
        }
    }
}
