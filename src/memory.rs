use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::TrackerResult;
use crate::models::{
    AcademicRecord, AdvisoryNote, Course, EventType, GradeItem, NewEvent, NewGradeItem, NewTask,
    PlannerEvent, PlannerTask,
};
use crate::store::{CourseStore, GradeStore, NoteStore, PlannerStore, RecordStore};

/// Store kept entirely in memory, for handler tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub students: Vec<Uuid>,
    pub courses: Vec<Course>,
    pub items: Vec<GradeItem>,
    pub records: HashMap<Uuid, AcademicRecord>,
    pub notes: Vec<AdvisoryNote>,
    pub tasks: Vec<PlannerTask>,
    pub events: Vec<PlannerEvent>,
    pub record_writes: usize,
    pub student_locks: Vec<Uuid>,
}

impl MemoryStore {
    pub fn with_student() -> (Self, Uuid) {
        let student_id = Uuid::new_v4();
        let store = Self {
            students: vec![student_id],
            ..Self::default()
        };
        (store, student_id)
    }

    pub fn add_course(&mut self, student_id: Uuid, name: &str, credit_hours: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.courses.push(Course {
            id,
            student_id,
            course_code: name.to_uppercase(),
            course_name: name.to_string(),
            credit_hours,
            current_mark: None,
            finalized_at: None,
            passed: None,
        });
        id
    }

    pub fn course(&self, course_id: Uuid) -> &Course {
        self.courses
            .iter()
            .find(|course| course.id == course_id)
            .expect("course exists")
    }

    fn course_mut(&mut self, course_id: Uuid) -> Option<&mut Course> {
        self.courses.iter_mut().find(|course| course.id == course_id)
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    async fn lock_student(&mut self, student_id: Uuid) -> TrackerResult<bool> {
        self.student_locks.push(student_id);
        Ok(self.students.contains(&student_id))
    }

    async fn list_courses(&mut self, student_id: Uuid) -> TrackerResult<Vec<Course>> {
        Ok(self
            .courses
            .iter()
            .filter(|course| course.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn lock_course(&mut self, student_id: Uuid, course_id: Uuid) -> TrackerResult<Option<Course>> {
        Ok(self
            .courses
            .iter()
            .find(|course| course.id == course_id && course.student_id == student_id)
            .cloned())
    }

    async fn course_by_code(&mut self, student_id: Uuid, course_code: &str) -> TrackerResult<Option<Course>> {
        Ok(self
            .courses
            .iter()
            .find(|course| course.student_id == student_id && course.course_code == course_code)
            .cloned())
    }

    async fn set_current_mark(&mut self, course_id: Uuid, mark: Option<f64>) -> TrackerResult<()> {
        if let Some(course) = self.course_mut(course_id) {
            course.current_mark = mark;
        }
        Ok(())
    }

    async fn mark_finalized(
        &mut self,
        course_id: Uuid,
        finalized_at: DateTime<Utc>,
        passed: bool,
    ) -> TrackerResult<bool> {
        match self.course_mut(course_id) {
            Some(course) if course.finalized_at.is_none() => {
                course.finalized_at = Some(finalized_at);
                course.passed = Some(passed);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl GradeStore for MemoryStore {
    async fn grade_items(&mut self, course_id: Uuid) -> TrackerResult<Vec<GradeItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| item.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn grade_item(&mut self, student_id: Uuid, item_id: Uuid) -> TrackerResult<Option<GradeItem>> {
        let item = self.items.iter().find(|item| item.id == item_id).cloned();
        Ok(item.filter(|item| {
            self.courses
                .iter()
                .any(|course| course.id == item.course_id && course.student_id == student_id)
        }))
    }

    async fn insert_grade_item(&mut self, course_id: Uuid, item: &NewGradeItem) -> TrackerResult<GradeItem> {
        let stored = GradeItem {
            id: Uuid::new_v4(),
            course_id,
            item_type: item.item_type.clone(),
            title: item.title.clone(),
            score: item.score,
            max_score: item.max_score,
            weight: item.weight,
        };
        self.items.push(stored.clone());
        Ok(stored)
    }

    async fn update_grade_item(&mut self, item: &GradeItem) -> TrackerResult<()> {
        if let Some(stored) = self.items.iter_mut().find(|stored| stored.id == item.id) {
            *stored = item.clone();
        }
        Ok(())
    }

    async fn delete_grade_item(&mut self, item_id: Uuid) -> TrackerResult<()> {
        self.items.retain(|item| item.id != item_id);
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn lock_record(&mut self, student_id: Uuid) -> TrackerResult<Option<AcademicRecord>> {
        Ok(self.records.get(&student_id).cloned())
    }

    async fn save_record(&mut self, record: &AcademicRecord) -> TrackerResult<()> {
        self.records.insert(record.student_id, record.clone());
        self.record_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn app_notes(&mut self, student_id: Uuid) -> TrackerResult<Vec<AdvisoryNote>> {
        Ok(self
            .notes
            .iter()
            .filter(|note| note.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn upsert_app_note(
        &mut self,
        student_id: Uuid,
        course_id: Option<Uuid>,
        content: &str,
    ) -> TrackerResult<()> {
        let now = Utc::now();
        match self
            .notes
            .iter_mut()
            .find(|note| note.student_id == student_id && note.course_id == course_id)
        {
            Some(note) => {
                note.content = content.to_string();
                note.updated_at = now;
            }
            None => self.notes.push(AdvisoryNote {
                id: Uuid::new_v4(),
                student_id,
                course_id,
                content: content.to_string(),
                updated_at: now,
            }),
        }
        Ok(())
    }

    async fn delete_app_note(&mut self, student_id: Uuid, course_id: Option<Uuid>) -> TrackerResult<()> {
        self.notes
            .retain(|note| !(note.student_id == student_id && note.course_id == course_id));
        Ok(())
    }
}

#[async_trait]
impl PlannerStore for MemoryStore {
    async fn tasks_on(&mut self, student_id: Uuid, date: NaiveDate) -> TrackerResult<Vec<PlannerTask>> {
        Ok(self
            .tasks
            .iter()
            .filter(|task| task.student_id == student_id && task.due_date == date)
            .cloned()
            .collect())
    }

    async fn task(&mut self, student_id: Uuid, task_id: Uuid) -> TrackerResult<Option<PlannerTask>> {
        Ok(self
            .tasks
            .iter()
            .find(|task| task.id == task_id && task.student_id == student_id)
            .cloned())
    }

    async fn insert_task(&mut self, student_id: Uuid, task: &NewTask) -> TrackerResult<PlannerTask> {
        let sort_order = self
            .tasks
            .iter()
            .filter(|existing| existing.student_id == student_id)
            .map(|existing| existing.sort_order)
            .max()
            .unwrap_or(0)
            + 1;
        let stored = PlannerTask {
            id: Uuid::new_v4(),
            student_id,
            course_id: task.course_id,
            title: task.title.clone(),
            due_date: task.due_date,
            priority: task.priority,
            completed: false,
            source: task.source,
            sort_order,
        };
        self.tasks.push(stored.clone());
        Ok(stored)
    }

    async fn set_task_completed(&mut self, task_id: Uuid, completed: bool) -> TrackerResult<()> {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == task_id) {
            task.completed = completed;
        }
        Ok(())
    }

    async fn update_task(&mut self, task: &PlannerTask) -> TrackerResult<()> {
        if let Some(stored) = self.tasks.iter_mut().find(|stored| stored.id == task.id) {
            stored.course_id = task.course_id;
            stored.title = task.title.clone();
            stored.due_date = task.due_date;
            stored.priority = task.priority;
        }
        Ok(())
    }

    async fn delete_task(&mut self, student_id: Uuid, task_id: Uuid) -> TrackerResult<bool> {
        let before = self.tasks.len();
        self.tasks
            .retain(|task| !(task.id == task_id && task.student_id == student_id));
        Ok(self.tasks.len() < before)
    }

    async fn events_between(
        &mut self,
        student_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TrackerResult<Vec<PlannerEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|event| {
                event.student_id == student_id && event.start_date <= to && event.end_date >= from
            })
            .cloned()
            .collect())
    }

    async fn exams_from(&mut self, student_id: Uuid, from: NaiveDate) -> TrackerResult<Vec<PlannerEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|event| {
                event.student_id == student_id
                    && event.event_type == EventType::Exam
                    && event.start_date >= from
            })
            .cloned()
            .collect())
    }

    async fn insert_event(&mut self, student_id: Uuid, event: &NewEvent) -> TrackerResult<PlannerEvent> {
        let stored = PlannerEvent {
            id: Uuid::new_v4(),
            student_id,
            course_id: event.course_id,
            title: event.title.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
            start_time: event.start_time,
            end_time: event.end_time,
            event_type: event.event_type,
        };
        self.events.push(stored.clone());
        Ok(stored)
    }

    async fn event(&mut self, student_id: Uuid, event_id: Uuid) -> TrackerResult<Option<PlannerEvent>> {
        Ok(self
            .events
            .iter()
            .find(|event| event.id == event_id && event.student_id == student_id)
            .cloned())
    }

    async fn update_event(&mut self, event: &PlannerEvent) -> TrackerResult<()> {
        if let Some(stored) = self.events.iter_mut().find(|stored| stored.id == event.id) {
            *stored = event.clone();
        }
        Ok(())
    }

    async fn delete_event(&mut self, student_id: Uuid, event_id: Uuid) -> TrackerResult<bool> {
        let before = self.events.len();
        self.events
            .retain(|event| !(event.id == event_id && event.student_id == student_id));
        Ok(self.events.len() < before)
    }
}
