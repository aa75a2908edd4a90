use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TrackerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeItem {
    pub id: Uuid,
    pub course_id: Uuid,
    pub item_type: String,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGradeItem {
    pub item_type: String,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
}

/// Partial edit of a grade item; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct GradeItemPatch {
    pub item_type: Option<String>,
    pub title: Option<String>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub weight: Option<f64>,
}

impl GradeItemPatch {
    pub fn apply(&self, item: &mut GradeItem) {
        if let Some(item_type) = &self.item_type {
            item.item_type = item_type.clone();
        }
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(score) = self.score {
            item.score = score;
        }
        if let Some(max_score) = self.max_score {
            item.max_score = max_score;
        }
        if let Some(weight) = self.weight {
            item.weight = weight;
        }
    }
}

/// A student's enrollment in one course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_code: String,
    pub course_name: String,
    pub credit_hours: i32,
    pub current_mark: Option<f64>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub passed: Option<bool>,
}

impl Course {
    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcademicRecord {
    pub student_id: Uuid,
    pub cgpa: f64,
    pub cumulative_percent: f64,
    pub total_credits_completed: f64,
    pub total_credits_carried: f64,
}

impl AcademicRecord {
    pub fn empty(student_id: Uuid) -> Self {
        Self {
            student_id,
            cgpa: 0.0,
            cumulative_percent: 0.0,
            total_credits_completed: 0.0,
            total_credits_carried: 0.0,
        }
    }
}

/// App-authored note. `course_id` is `None` for the general note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryNote {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Option<Uuid>,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSource {
    Student,
    App,
}

impl TaskSource {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskSource::Student => "student",
            TaskSource::App => "app",
        }
    }
}

impl FromStr for TaskSource {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "student" => Ok(TaskSource::Student),
            "app" => Ok(TaskSource::App),
            other => Err(TrackerError::InvalidInput(format!(
                "unknown task source '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannerTask {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub due_date: NaiveDate,
    pub priority: i32,
    pub completed: bool,
    pub source: TaskSource,
    pub sort_order: i32,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub course_id: Option<Uuid>,
    pub title: String,
    pub due_date: NaiveDate,
    pub priority: i32,
    pub source: TaskSource,
}

fn title_or(title: &str, fallback: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        fallback.to_string()
    } else {
        title.to_string()
    }
}

impl NewTask {
    pub const MIN_PRIORITY: i32 = 1;
    pub const MAX_PRIORITY: i32 = 5;

    /// Builds a task draft, clamping priority into `1..=5` and defaulting a blank title.
    pub fn new(
        course_id: Option<Uuid>,
        title: &str,
        due_date: NaiveDate,
        priority: i32,
        source: TaskSource,
    ) -> Self {
        Self {
            course_id,
            title: title_or(title, "Task"),
            due_date,
            priority: priority.clamp(Self::MIN_PRIORITY, Self::MAX_PRIORITY),
            source,
        }
    }
}

/// Edit of a planner task. `course_id: Some(None)` detaches the task from its course.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub course_id: Option<Option<Uuid>>,
    pub title: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<i32>,
}

impl TaskPatch {
    pub fn apply(&self, task: &mut PlannerTask) {
        if let Some(course_id) = self.course_id {
            task.course_id = course_id;
        }
        if let Some(title) = &self.title {
            task.title = title_or(title, "Task");
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority.clamp(NewTask::MIN_PRIORITY, NewTask::MAX_PRIORITY);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Exam,
    Study,
    Project,
    Other,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Exam => "exam",
            EventType::Study => "study",
            EventType::Project => "project",
            EventType::Other => "other",
        }
    }
}

impl FromStr for EventType {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "exam" => Ok(EventType::Exam),
            "study" => Ok(EventType::Study),
            "project" => Ok(EventType::Project),
            "other" => Ok(EventType::Other),
            other => Err(TrackerError::InvalidInput(format!(
                "unknown event type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannerEvent {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub event_type: EventType,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub course_id: Option<Uuid>,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub event_type: EventType,
}

#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub course_id: Option<Option<Uuid>>,
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub event_type: Option<EventType>,
}

impl EventPatch {
    pub fn apply(&self, event: &mut PlannerEvent) {
        if let Some(course_id) = self.course_id {
            event.course_id = course_id;
        }
        if let Some(title) = &self.title {
            event.title = title_or(title, "Event");
        }
        if let Some(start_date) = self.start_date {
            event.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            event.end_date = end_date;
        }
        if let Some(start_time) = self.start_time {
            event.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            event.end_time = end_time;
        }
        if let Some(event_type) = self.event_type {
            event.event_type = event_type;
        }
    }
}
