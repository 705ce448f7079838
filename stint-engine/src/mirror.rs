//! In-memory mirror of the remote collections.
//!
//! The mirror is the single read model: every accessor returns
//! point-in-time clones, so callers never hold locks across their own
//! logic. Writes land here only after the corresponding remote write was
//! confirmed, with the two documented optimistic exceptions (sign-out and
//! mark-all-read).

use dashmap::DashMap;
use serde_json::Value;

use crate::entities::{
    AttendanceException, Badge, Collection, Evaluation, Goal, LeaveRequest, LogEntry, Meeting,
    Message, Notification, Profile, Report, Resource, SiteVisit, Skill, SkillAssessment, Task,
    UserBadge,
};

/// A typed entity backed by one remote collection.
pub trait MirrorEntity: Clone + Send + Sync + 'static {
    /// Backing collection.
    const COLLECTION: Collection;

    /// Row id.
    fn id(&self) -> &str;

    /// Maps a raw remote record into the typed entity. Total: missing or
    /// malformed fields take their documented defaults.
    fn from_record(record: &Value) -> Self;

    /// The store slot holding this entity type.
    fn slot(store: &MirrorStore) -> &MirrorCollection<Self>;
}

/// One mirrored collection, keyed by row id.
pub struct MirrorCollection<T> {
    rows: DashMap<String, T>,
}

impl<T: MirrorEntity> MirrorCollection<T> {
    fn new() -> Self {
        MirrorCollection {
            rows: DashMap::new(),
        }
    }

    /// Inserts or replaces the entity under its own id.
    pub fn commit(&self, entity: T) {
        self.rows.insert(entity.id().to_string(), entity);
    }

    /// Maps a confirmed remote record and commits it, returning the entity.
    pub fn commit_record(&self, record: &Value) -> T {
        let entity = T::from_record(record);
        self.commit(entity.clone());
        entity
    }

    pub fn remove(&self, id: &str) -> Option<T> {
        self.rows.remove(id).map(|(_, entity)| entity)
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.rows.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Snapshot of every row.
    pub fn all(&self) -> Vec<T> {
        self.rows.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Snapshot of the rows matching `keep`.
    pub fn filter(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn find(&self, matches: impl Fn(&T) -> bool) -> Option<T> {
        self.rows
            .iter()
            .find(|entry| matches(entry.value()))
            .map(|entry| entry.value().clone())
    }

    /// Replaces the whole collection, used by hydration.
    pub fn replace_all(&self, entities: Vec<T>) {
        self.rows.clear();
        for entity in entities {
            self.commit(entity);
        }
    }

    pub fn clear(&self) {
        self.rows.clear();
    }
}

/// All mirrored collections.
#[derive(Default)]
pub struct MirrorStore {
    pub users: MirrorCollection<Profile>,
    pub logs: MirrorCollection<LogEntry>,
    pub tasks: MirrorCollection<Task>,
    pub reports: MirrorCollection<Report>,
    pub goals: MirrorCollection<Goal>,
    pub resources: MirrorCollection<Resource>,
    pub evaluations: MirrorCollection<Evaluation>,
    pub messages: MirrorCollection<Message>,
    pub meetings: MirrorCollection<Meeting>,
    pub notifications: MirrorCollection<Notification>,
    pub skills: MirrorCollection<Skill>,
    pub skill_assessments: MirrorCollection<SkillAssessment>,
    pub badges: MirrorCollection<Badge>,
    pub user_badges: MirrorCollection<UserBadge>,
    pub leave_requests: MirrorCollection<LeaveRequest>,
    pub site_visits: MirrorCollection<SiteVisit>,
    pub attendance_exceptions: MirrorCollection<AttendanceException>,
}

impl<T: MirrorEntity> Default for MirrorCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every mirrored row. Run on sign-out so no data outlives the
    /// session that loaded it.
    pub fn clear(&self) {
        self.users.clear();
        self.logs.clear();
        self.tasks.clear();
        self.reports.clear();
        self.goals.clear();
        self.resources.clear();
        self.evaluations.clear();
        self.messages.clear();
        self.meetings.clear();
        self.notifications.clear();
        self.skills.clear();
        self.skill_assessments.clear();
        self.badges.clear();
        self.user_badges.clear();
        self.leave_requests.clear();
        self.site_visits.clear();
        self.attendance_exceptions.clear();
    }

    /// The notification feed for one account: direct plus broadcast rows,
    /// newest first.
    pub fn notifications_for(&self, profile_id: &str) -> Vec<Notification> {
        let mut feed = self
            .notifications
            .filter(|n| n.addresses(profile_id));
        feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        feed
    }

    pub fn unread_count(&self, profile_id: &str) -> usize {
        self.notifications
            .filter(|n| n.addresses(profile_id) && !n.read)
            .len()
    }
}
