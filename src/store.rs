//! Repository traits the command handlers run against.
//!
//! Every method takes `&mut self`: an implementation is one unit of work (a
//! database transaction in production), and nothing it does is visible until
//! the caller commits it.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::TrackerResult;
use crate::models::{
    AcademicRecord, AdvisoryNote, Course, GradeItem, NewEvent, NewGradeItem, NewTask,
    PlannerEvent, PlannerTask,
};

#[async_trait]
pub trait CourseStore {
    /// Locks the student row for the rest of the unit of work.
    /// Returns `false` when the student does not exist.
    async fn lock_student(&mut self, student_id: Uuid) -> TrackerResult<bool>;

    async fn list_courses(&mut self, student_id: Uuid) -> TrackerResult<Vec<Course>>;

    /// Loads one of the student's courses and locks it against concurrent mutation.
    async fn lock_course(&mut self, student_id: Uuid, course_id: Uuid) -> TrackerResult<Option<Course>>;

    async fn course_by_code(&mut self, student_id: Uuid, course_code: &str) -> TrackerResult<Option<Course>>;

    async fn set_current_mark(&mut self, course_id: Uuid, mark: Option<f64>) -> TrackerResult<()>;

    /// Records the terminal outcome. Returns `false` if the course was already finalized.
    async fn mark_finalized(
        &mut self,
        course_id: Uuid,
        finalized_at: DateTime<Utc>,
        passed: bool,
    ) -> TrackerResult<bool>;
}

#[async_trait]
pub trait GradeStore {
    async fn grade_items(&mut self, course_id: Uuid) -> TrackerResult<Vec<GradeItem>>;

    /// Looks an item up through its course so other students' items stay invisible.
    async fn grade_item(&mut self, student_id: Uuid, item_id: Uuid) -> TrackerResult<Option<GradeItem>>;

    async fn insert_grade_item(&mut self, course_id: Uuid, item: &NewGradeItem) -> TrackerResult<GradeItem>;

    async fn update_grade_item(&mut self, item: &GradeItem) -> TrackerResult<()>;

    async fn delete_grade_item(&mut self, item_id: Uuid) -> TrackerResult<()>;
}

#[async_trait]
pub trait RecordStore {
    async fn lock_record(&mut self, student_id: Uuid) -> TrackerResult<Option<AcademicRecord>>;

    async fn save_record(&mut self, record: &AcademicRecord) -> TrackerResult<()>;
}

#[async_trait]
pub trait NoteStore {
    async fn app_notes(&mut self, student_id: Uuid) -> TrackerResult<Vec<AdvisoryNote>>;

    async fn upsert_app_note(
        &mut self,
        student_id: Uuid,
        course_id: Option<Uuid>,
        content: &str,
    ) -> TrackerResult<()>;

    async fn delete_app_note(&mut self, student_id: Uuid, course_id: Option<Uuid>) -> TrackerResult<()>;
}

#[async_trait]
pub trait PlannerStore {
    async fn tasks_on(&mut self, student_id: Uuid, date: NaiveDate) -> TrackerResult<Vec<PlannerTask>>;

    async fn task(&mut self, student_id: Uuid, task_id: Uuid) -> TrackerResult<Option<PlannerTask>>;

    /// Inserts a task after every existing task of the student in `sort_order`.
    async fn insert_task(&mut self, student_id: Uuid, task: &NewTask) -> TrackerResult<PlannerTask>;

    async fn set_task_completed(&mut self, task_id: Uuid, completed: bool) -> TrackerResult<()>;

    /// Writes the task's course, title, due date and priority.
    async fn update_task(&mut self, task: &PlannerTask) -> TrackerResult<()>;

    /// Returns `false` when no task with that id belongs to the student.
    async fn delete_task(&mut self, student_id: Uuid, task_id: Uuid) -> TrackerResult<bool>;

    /// Events overlapping any day in `from..=to`.
    async fn events_between(
        &mut self,
        student_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TrackerResult<Vec<PlannerEvent>>;

    /// Exam events starting on or after `from`.
    async fn exams_from(&mut self, student_id: Uuid, from: NaiveDate) -> TrackerResult<Vec<PlannerEvent>>;

    async fn insert_event(&mut self, student_id: Uuid, event: &NewEvent) -> TrackerResult<PlannerEvent>;

    async fn event(&mut self, student_id: Uuid, event_id: Uuid) -> TrackerResult<Option<PlannerEvent>>;

    async fn update_event(&mut self, event: &PlannerEvent) -> TrackerResult<()>;

    /// Returns `false` when no event with that id belongs to the student.
    async fn delete_event(&mut self, student_id: Uuid, event_id: Uuid) -> TrackerResult<bool>;
}

pub trait Store: CourseStore + GradeStore + RecordStore + NoteStore + PlannerStore + Send {}

impl<T> Store for T where T: CourseStore + GradeStore + RecordStore + NoteStore + PlannerStore + Send {}
