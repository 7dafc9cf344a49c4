//! Notification templates for the platform's feature flows.
//!
//! Each builder turns a domain fact (an assessment coming due, a student
//! flagged at risk, a comment posted, a week of activity) into zero or more
//! [`NotificationDraft`]s. Builders are pure; recipients' preferences are
//! applied later by the delivery gate.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::notification::{NotificationDraft, NotificationType, Priority, RelatedEntityType};
use crate::taxonomy::NotificationSubcategory;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Assessment due reminders
// ---------------------------------------------------------------------------

/// Reminders are sent for assessments due within this many days.
pub const DUE_REMINDER_DAYS_AHEAD: i64 = 2;

/// An assessment assigned to one enrolled student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueAssessment {
    pub assessment_id: DbId,
    pub assessment_title: String,
    pub due_date: Timestamp,
    pub course_id: DbId,
    pub lesson_id: DbId,
    pub user_id: DbId,
    /// Students who already submitted are not reminded.
    #[serde(default)]
    pub submitted: bool,
}

/// Whether the assessment is unsubmitted and due inside the reminder window.
pub fn is_due_for_reminder(assessment: &DueAssessment, now: Timestamp) -> bool {
    let Some(window_end) = now.checked_add_signed(Duration::days(DUE_REMINDER_DAYS_AHEAD)) else {
        return false;
    };
    !assessment.submitted && assessment.due_date > now && assessment.due_date <= window_end
}

/// Whole days until `due`, rounded up.
fn days_until(due: Timestamp, now: Timestamp) -> i64 {
    let secs = (due - now).num_seconds().max(0);
    (secs + 86_399) / 86_400
}

fn plural(count: i64, singular: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {singular}s")
    }
}

pub fn assessment_due_reminder(assessment: &DueAssessment, now: Timestamp) -> NotificationDraft {
    let days = days_until(assessment.due_date, now);
    let message = format!(
        "\"{}\" is due in {} ({})",
        assessment.assessment_title,
        plural(days, "day"),
        assessment.due_date.format("%b %d, %Y"),
    );

    NotificationDraft::new(
        assessment.user_id,
        NotificationSubcategory::AssessmentDueReminder,
        NotificationType::Assignment,
        "Assignment Due Soon!",
        message,
    )
    .with_priority(Priority::Urgent)
    .with_action(
        format!(
            "/courses/{}/lessons/{}",
            assessment.course_id, assessment.lesson_id
        ),
        "Work on Assignment",
    )
    .with_related(RelatedEntityType::Assessment, assessment.assessment_id)
}

/// Reminders for every assessment that is due inside the window.
pub fn assessment_due_reminders(
    assessments: &[DueAssessment],
    now: Timestamp,
) -> Vec<NotificationDraft> {
    assessments
        .iter()
        .filter(|a| is_due_for_reminder(a, now))
        .map(|a| assessment_due_reminder(a, now))
        .collect()
}

// ---------------------------------------------------------------------------
// At-risk student alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Only high and critical assessments raise alerts.
    pub fn raises_alert(self) -> bool {
        self >= RiskLevel::High
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskStudent {
    pub student_id: DbId,
    pub student_name: String,
    pub course_id: DbId,
    pub course_name: String,
    pub instructor_id: Option<DbId>,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

/// One alert for the student and, when known, one for the instructor.
pub fn at_risk_alerts(student: &AtRiskStudent) -> Vec<NotificationDraft> {
    if !student.risk_level.raises_alert() {
        return Vec::new();
    }

    let priority = if student.risk_level == RiskLevel::Critical {
        Priority::Urgent
    } else {
        Priority::High
    };
    let data = serde_json::json!({
        "courseId": student.course_id,
        "courseName": student.course_name,
        "riskLevel": student.risk_level,
        "riskScore": student.risk_score,
        "riskFactors": student.risk_factors,
    });

    let mut drafts = vec![NotificationDraft::new(
        student.student_id,
        NotificationSubcategory::RiskAlerts,
        NotificationType::Risk,
        "Learning Progress Alert",
        format!(
            "You're showing signs of difficulty in {}. We've identified some areas where you might need support.",
            student.course_name
        ),
    )
    .with_priority(priority)
    .with_action(format!("/courses/{}/preview", student.course_id), "View Course")
    .with_related(RelatedEntityType::Course, student.course_id)
    .with_data(data.clone())];

    if let Some(instructor_id) = student.instructor_id {
        drafts.push(
            NotificationDraft::new(
                instructor_id,
                NotificationSubcategory::RiskAlerts,
                NotificationType::Intervention,
                "Student Needs Intervention",
                format!(
                    "{} is at {} risk in {}",
                    student.student_name,
                    student.risk_level.as_str(),
                    student.course_name
                ),
            )
            .with_priority(priority)
            .with_action(
                format!(
                    "/instructor/student-analytics?studentId={}&courseId={}",
                    student.student_id, student.course_id
                ),
                "View Student Analytics",
            )
            .with_related(RelatedEntityType::Student, student.student_id)
            .with_data(data),
        );
    }

    drafts
}

// ---------------------------------------------------------------------------
// New comments
// ---------------------------------------------------------------------------

/// Comment previews longer than this are truncated.
pub const COMMENT_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentPosted {
    pub comment_id: DbId,
    pub author_id: DbId,
    pub author_name: String,
    pub content: String,
    /// Title of the lesson or course the comment was posted on.
    pub entity_title: String,
    pub action_url: String,
    /// Instructor of the course the comment belongs to.
    pub instructor_id: Option<DbId>,
    /// Author of the comment being replied to, for replies.
    pub parent_author_id: Option<DbId>,
}

fn preview(content: &str) -> String {
    if content.chars().count() > COMMENT_PREVIEW_CHARS {
        let head: String = content.chars().take(COMMENT_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

/// Alerts for a new comment.
///
/// The parent comment's author gets a reply notification; the course
/// instructor gets a new-comment notification. Nobody is notified twice and
/// the comment's author is never notified about their own comment.
pub fn new_comment_alerts(comment: &CommentPosted) -> Vec<NotificationDraft> {
    let body = preview(&comment.content);
    let mut drafts = Vec::new();

    if let Some(parent_author) = comment.parent_author_id {
        if parent_author != comment.author_id {
            drafts.push(
                NotificationDraft::new(
                    parent_author,
                    NotificationSubcategory::Replies,
                    NotificationType::Community,
                    format!("{} replied to your comment", comment.author_name),
                    body.clone(),
                )
                .with_action(comment.action_url.clone(), "View Reply")
                .with_related(RelatedEntityType::Comment, comment.comment_id),
            );
        }
    }

    if let Some(instructor) = comment.instructor_id {
        let already_notified = drafts.iter().any(|d| d.user_id == instructor);
        if instructor != comment.author_id && !already_notified {
            drafts.push(
                NotificationDraft::new(
                    instructor,
                    NotificationSubcategory::NewComments,
                    NotificationType::Community,
                    format!("New comment on {}", comment.entity_title),
                    format!("{}: {}", comment.author_name, body),
                )
                .with_action(comment.action_url.clone(), "View Comment")
                .with_related(RelatedEntityType::Comment, comment.comment_id),
            );
        }
    }

    drafts
}

// ---------------------------------------------------------------------------
// Weekly progress summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyActivity {
    pub user_id: DbId,
    pub lessons_completed: u32,
    pub videos_watched: u32,
    pub assessments_submitted: u32,
    pub minutes_spent: u32,
    pub courses_active: u32,
}

impl WeeklyActivity {
    pub fn is_empty(&self) -> bool {
        self.lessons_completed == 0
            && self.videos_watched == 0
            && self.assessments_submitted == 0
            && self.minutes_spent == 0
    }
}

/// Summary of a user's week; `None` when there was no activity.
pub fn weekly_progress_summary(activity: &WeeklyActivity) -> Option<NotificationDraft> {
    if activity.is_empty() {
        return None;
    }

    let message = format!(
        "This week you completed {}, watched {} and submitted {}, spending {} across {}. Keep up the great work!",
        plural(activity.lessons_completed.into(), "lesson"),
        plural(activity.videos_watched.into(), "video"),
        plural(activity.assessments_submitted.into(), "assessment"),
        plural(activity.minutes_spent.into(), "minute"),
        plural(activity.courses_active.into(), "course"),
    );

    Some(
        NotificationDraft::new(
            activity.user_id,
            NotificationSubcategory::ProgressSummary,
            NotificationType::Progress,
            "Your Weekly Progress Summary",
            message,
        )
        .with_priority(Priority::Normal)
        .with_action("/my-learning", "View My Learning")
        .with_data(serde_json::json!({
            "lessonsCompleted": activity.lessons_completed,
            "videosWatched": activity.videos_watched,
            "assessmentsSubmitted": activity.assessments_submitted,
            "minutesSpent": activity.minutes_spent,
            "coursesActive": activity.courses_active,
        })),
    )
}
