//! Typed domain entities and their record mappers.
//!
//! Remote rows arrive as loosely-typed JSON objects. Each entity here
//! implements [`MirrorEntity`](crate::mirror::MirrorEntity), whose
//! `from_record` mapper is total: a missing or malformed field takes its
//! documented default instead of failing, so a single bad row can never
//! poison a hydration pass.

use std::fmt;

pub(crate) mod raw;

mod attendance;
mod badge;
mod evaluation;
mod goal;
mod leave_request;
mod log_entry;
mod meeting;
mod message;
mod notification;
mod profile;
mod report;
mod resource;
mod site_visit;
mod skill;
mod task;

pub use attendance::{AttendanceException, AttendanceKind};
pub use badge::{Badge, UserBadge};
pub use evaluation::{Evaluation, EvaluationKind, EvaluationScore};
pub use goal::{Goal, GoalStatus};
pub use leave_request::{LeaveKind, LeaveRequest, LeaveStatus};
pub use log_entry::{LogEntry, LogStatus};
pub use meeting::Meeting;
pub use message::Message;
pub use notification::{Notification, NotificationKind, BROADCAST_RECIPIENT, SYSTEM_SENDER};
pub use profile::{default_avatar, NewUser, Profile, Registration, Role, UserStatus};
pub use report::{Report, ReportKind};
pub use resource::{Resource, ResourceKind};
pub use site_visit::SiteVisit;
pub use skill::{Skill, SkillAssessment, SkillRating};
pub use task::{Task, TaskDeliverable, TaskFeedback, TaskFeedbackKind, TaskPriority, TaskStatus};

/// Remote collections mirrored by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Logs,
    Tasks,
    Reports,
    Goals,
    Resources,
    Evaluations,
    Messages,
    Meetings,
    Notifications,
    Skills,
    SkillAssessments,
    Badges,
    UserBadges,
    LeaveRequests,
    SiteVisits,
    AttendanceExceptions,
}

impl Collection {
    /// Wire name of the backing table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Logs => "logs",
            Collection::Tasks => "tasks",
            Collection::Reports => "reports",
            Collection::Goals => "goals",
            Collection::Resources => "resources",
            Collection::Evaluations => "evaluations",
            Collection::Messages => "messages",
            Collection::Meetings => "meetings",
            Collection::Notifications => "notifications",
            Collection::Skills => "skills",
            Collection::SkillAssessments => "skill_assessments",
            Collection::Badges => "badges",
            Collection::UserBadges => "user_badges",
            Collection::LeaveRequests => "leave_requests",
            Collection::SiteVisits => "site_visits",
            Collection::AttendanceExceptions => "attendance_exceptions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
