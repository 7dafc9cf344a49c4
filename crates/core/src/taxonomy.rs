//! The fixed notification taxonomy: five categories and the subcategories
//! each one owns.
//!
//! Membership is a static table ([`SUBCATEGORIES`]) rather than a runtime
//! registry; the set of notification kinds is known at compile time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Top-level grouping of notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotificationCategory {
    Progress,
    Course,
    Assessment,
    Community,
    System,
}

impl NotificationCategory {
    pub const ALL: [NotificationCategory; 5] = [
        NotificationCategory::Progress,
        NotificationCategory::Course,
        NotificationCategory::Assessment,
        NotificationCategory::Community,
        NotificationCategory::System,
    ];

    /// Lowercase identifier used in logs and event payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationCategory::Progress => "progress",
            NotificationCategory::Course => "course",
            NotificationCategory::Assessment => "assessment",
            NotificationCategory::Community => "community",
            NotificationCategory::System => "system",
        }
    }

    /// Name of the category switch in the preferences document.
    pub fn field_name(self) -> &'static str {
        match self {
            NotificationCategory::Progress => "EnableProgressUpdates",
            NotificationCategory::Course => "EnableCourseUpdates",
            NotificationCategory::Assessment => "EnableAssessmentUpdates",
            NotificationCategory::Community => "EnableCommunityUpdates",
            NotificationCategory::System => "EnableSystemAlerts",
        }
    }

    /// Short alias accepted for the category switch on input.
    pub fn field_alias(self) -> &'static str {
        match self {
            NotificationCategory::Progress => "EnableProgress",
            NotificationCategory::Course => "EnableCourse",
            NotificationCategory::Assessment => "EnableAssessment",
            NotificationCategory::Community => "EnableCommunity",
            NotificationCategory::System => "EnableSystem",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NotificationCategory::Progress => "Progress Updates",
            NotificationCategory::Course => "Course Updates",
            NotificationCategory::Assessment => "Assessment Updates",
            NotificationCategory::Community => "Community Updates",
            NotificationCategory::System => "System Alerts",
        }
    }

    /// Subcategories owned by this category, in table order.
    pub fn subcategories(self) -> impl Iterator<Item = NotificationSubcategory> {
        SUBCATEGORIES
            .iter()
            .filter(move |info| info.category == self)
            .map(|info| info.subcategory)
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Subcategory
// ---------------------------------------------------------------------------

/// A specific notification kind, nested under exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotificationSubcategory {
    // Progress
    LessonCompletion,
    VideoCompletion,
    StudentMilestone,
    ProgressSummary,
    // Course
    CourseEnrollment,
    NewLessons,
    LiveSessions,
    CoursePublished,
    InstructorAnnouncements,
    // Assessment
    AssessmentSubmitted,
    AssessmentGraded,
    NewAssessment,
    #[serde(alias = "AssessmentDue")]
    AssessmentDueReminder,
    SubmissionToGrade,
    // Community
    #[serde(alias = "Comments")]
    NewComments,
    Replies,
    Mentions,
    DirectMessages,
    GroupInvites,
    OfficeHours,
    // System
    SecurityAlerts,
    RiskAlerts,
    Payment,
    Certificates,
    ProfileUpdates,
}

/// Static metadata for one subcategory.
#[derive(Debug)]
pub struct SubcategoryInfo {
    pub subcategory: NotificationSubcategory,
    /// Rust-side name, also the canonical serialized form.
    pub name: &'static str,
    pub category: NotificationCategory,
    /// Suffix of the `Enable<wire>` / `Email<wire>` preference fields.
    pub wire_name: &'static str,
    pub label: &'static str,
    /// Delivered on every channel regardless of stored preferences.
    pub forced_delivery: bool,
}

macro_rules! entry {
    ($sub:ident, $cat:ident, $wire:literal, $label:literal) => {
        entry!($sub, $cat, $wire, $label, false)
    };
    ($sub:ident, $cat:ident, $wire:literal, $label:literal, $forced:literal) => {
        SubcategoryInfo {
            subcategory: NotificationSubcategory::$sub,
            name: stringify!($sub),
            category: NotificationCategory::$cat,
            wire_name: $wire,
            label: $label,
            forced_delivery: $forced,
        }
    };
}

/// Category membership for every subcategory.
pub const SUBCATEGORIES: &[SubcategoryInfo] = &[
    entry!(LessonCompletion, Progress, "LessonCompletion", "Lesson Completion"),
    entry!(VideoCompletion, Progress, "VideoCompletion", "Video Completion"),
    entry!(StudentMilestone, Progress, "StudentMilestone", "Student Milestones"),
    entry!(ProgressSummary, Progress, "ProgressSummary", "Weekly Progress Summary"),
    entry!(CourseEnrollment, Course, "CourseEnrollment", "Course Enrollment"),
    entry!(NewLessons, Course, "NewLessons", "New Lessons"),
    entry!(LiveSessions, Course, "LiveSessions", "Live Sessions"),
    entry!(CoursePublished, Course, "CoursePublished", "Course Published"),
    entry!(InstructorAnnouncements, Course, "InstructorAnnouncements", "Instructor Announcements"),
    entry!(AssessmentSubmitted, Assessment, "AssessmentSubmitted", "Assessment Submitted"),
    entry!(AssessmentGraded, Assessment, "AssessmentGraded", "Assessment Graded"),
    entry!(NewAssessment, Assessment, "NewAssessment", "New Assessment"),
    entry!(AssessmentDueReminder, Assessment, "AssessmentDue", "Assessment Due Reminders"),
    entry!(SubmissionToGrade, Assessment, "SubmissionToGrade", "Submissions To Grade"),
    entry!(NewComments, Community, "Comments", "New Comments"),
    entry!(Replies, Community, "Replies", "Replies"),
    entry!(Mentions, Community, "Mentions", "Mentions"),
    entry!(DirectMessages, Community, "DirectMessages", "Direct Messages"),
    entry!(GroupInvites, Community, "GroupInvites", "Study Group Invites"),
    entry!(OfficeHours, Community, "OfficeHours", "Office Hours"),
    entry!(SecurityAlerts, System, "SecurityAlerts", "Security Alerts", true),
    entry!(RiskAlerts, System, "RiskAlerts", "At-Risk Student Alerts"),
    entry!(Payment, System, "Payment", "Payments"),
    entry!(Certificates, System, "Certificates", "Certificates"),
    entry!(ProfileUpdates, System, "ProfileUpdates", "Profile Updates"),
];

impl NotificationSubcategory {
    /// Every subcategory, in table order.
    pub fn all() -> impl Iterator<Item = NotificationSubcategory> {
        SUBCATEGORIES.iter().map(|info| info.subcategory)
    }

    /// Static metadata for this subcategory.
    ///
    /// # Panics
    ///
    /// Panics if the subcategory is missing from [`SUBCATEGORIES`]. That is a
    /// configuration bug: silently defaulting would misroute notifications.
    pub fn info(self) -> &'static SubcategoryInfo {
        SUBCATEGORIES
            .iter()
            .find(|info| info.subcategory == self)
            .unwrap_or_else(|| panic!("subcategory {self:?} is not mapped to a category"))
    }

    /// The category that owns this subcategory.
    pub fn category(self) -> NotificationCategory {
        self.info().category
    }

    pub fn wire_name(self) -> &'static str {
        self.info().wire_name
    }

    pub fn forces_delivery(self) -> bool {
        self.info().forced_delivery
    }
}

impl fmt::Display for NotificationSubcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

impl FromStr for NotificationSubcategory {
    type Err = CoreError;

    /// Accepts either the canonical name (`AssessmentDueReminder`) or the
    /// preference wire name (`AssessmentDue`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SUBCATEGORIES
            .iter()
            .find(|info| info.name == s || info.wire_name == s)
            .map(|info| info.subcategory)
            .ok_or_else(|| CoreError::Validation(format!("Unknown notification subcategory '{s}'")))
    }
}
