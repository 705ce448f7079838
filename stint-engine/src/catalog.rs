//! Built-in badge and skill catalogs.
//!
//! The derived rules reference badges by these fixed ids. When the remote
//! catalog comes back empty at hydration, the mirror is seeded with the
//! built-ins so a rule-emitted notification can always name its badge.

use crate::entities::{Badge, Skill};

/// 5-day logging streak.
pub const BADGE_STREAK: &str = "b1";
/// 10 completed tasks.
pub const BADGE_TASKS: &str = "b2";
/// 3 attended meetings.
pub const BADGE_MEETINGS: &str = "b3";
/// Praise feedback from a supervisor.
pub const BADGE_PRAISE: &str = "b4";

fn badge(id: &str, name: &str, description: &str, icon: &str, color: &str, points: u32) -> Badge {
    Badge {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        points,
    }
}

pub fn builtin_badges() -> Vec<Badge> {
    vec![
        badge(
            BADGE_STREAK,
            "Early Bird",
            "Logged work five days in a row",
            "Sunrise",
            "bg-orange-100",
            50,
        ),
        badge(
            BADGE_TASKS,
            "Task Master",
            "Completed ten tasks",
            "CheckCircle",
            "bg-emerald-100",
            100,
        ),
        badge(
            BADGE_MEETINGS,
            "Team Player",
            "Attended three meetings",
            "Users",
            "bg-sky-100",
            30,
        ),
        badge(
            BADGE_PRAISE,
            "Star Performer",
            "Earned praise from a supervisor",
            "Star",
            "bg-amber-100",
            75,
        ),
    ]
}

fn skill(id: &str, name: &str, category: &str) -> Skill {
    Skill {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
    }
}

pub fn builtin_skills() -> Vec<Skill> {
    vec![
        skill("sk-1", "Communication", "Soft Skills"),
        skill("sk-2", "Problem Solving", "Technical"),
        skill("sk-3", "Time Management", "Soft Skills"),
        skill("sk-4", "Teamwork", "Soft Skills"),
        skill("sk-5", "Technical Writing", "Technical"),
    ]
}
