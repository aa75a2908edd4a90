use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::advisory::{self, NoteChange};
use crate::error::{TrackerError, TrackerResult};
use crate::feedback::{self, DayContext, PlanComparison, PlanFeedback};
use crate::finalize::{self, Decision, FinalizeOutcome, Trigger};
use crate::grades;
use crate::models::{
    AcademicRecord, AdvisoryNote, Course, EventPatch, EventType, GradeItem, GradeItemPatch,
    NewEvent, NewGradeItem, NewTask, PlannerEvent, PlannerTask, TaskPatch,
};
use crate::planner::{self, DailyView, ExamInRange, GeneratedPlan, SuggestedTask};
use crate::record::{self, Standing};
use crate::risk;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct GradeChange {
    pub item: Option<GradeItem>,
    pub mark: Option<f64>,
    pub finalized: Option<FinalizeOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskCompletion {
    pub task: PlannerTask,
    pub suggested: Option<SuggestedTask>,
}

/// Locks the student row. Every handler that can reach the academic record takes
/// this lock first, so record updates for one student never interleave.
async fn require_student<S: Store>(store: &mut S, student_id: Uuid) -> TrackerResult<()> {
    if store.lock_student(student_id).await? {
        Ok(())
    } else {
        Err(TrackerError::NotFound("student"))
    }
}

async fn require_open_course<S: Store>(
    store: &mut S,
    student_id: Uuid,
    course_id: Uuid,
) -> TrackerResult<Course> {
    let course = store
        .lock_course(student_id, course_id)
        .await?
        .ok_or(TrackerError::NotFound("course"))?;
    if course.is_finalized() {
        warn!(course_id = %course.id, "grade change rejected on finalized course");
        return Err(TrackerError::InvalidState(format!(
            "{} is finalized; its grades can no longer change.",
            course.course_name
        )));
    }
    Ok(course)
}

fn validate_scores(score: f64, max_score: f64, weight: f64) -> TrackerResult<()> {
    if !score.is_finite() || !max_score.is_finite() || !weight.is_finite() {
        return Err(TrackerError::InvalidInput(
            "score, max score and weight must be finite numbers".to_string(),
        ));
    }
    if max_score <= 0.0 {
        return Err(TrackerError::InvalidInput(
            "max score must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Recomputes the stored mark from the ledger, returning the refreshed course.
async fn refresh_mark<S: Store>(
    store: &mut S,
    mut course: Course,
) -> TrackerResult<(Course, Vec<GradeItem>)> {
    let items = store.grade_items(course.id).await?;
    let mark = grades::compute_mark(&items);
    if mark != course.current_mark {
        store.set_current_mark(course.id, mark).await?;
        debug!(course_id = %course.id, ?mark, "course mark recomputed");
    }
    course.current_mark = mark;
    Ok((course, items))
}

/// Moves `course` to its terminal state and credits the academic record once.
async fn apply_finalize<S: Store>(
    store: &mut S,
    course: &Course,
    mark: f64,
    passed: bool,
    trigger: Trigger,
) -> TrackerResult<FinalizeOutcome> {
    if !store.mark_finalized(course.id, Utc::now(), passed).await? {
        return Ok(FinalizeOutcome {
            course_id: course.id,
            finalized: true,
            already: true,
            passed: course.passed,
            mark: course.current_mark,
        });
    }

    if course.credit_hours > 0 {
        let prior = store
            .lock_record(course.student_id)
            .await?
            .unwrap_or_else(|| AcademicRecord::empty(course.student_id));
        let next = record::apply_finalized(&prior, course.credit_hours, mark, passed);
        store.save_record(&next).await?;
        info!(
            student_id = %course.student_id,
            cgpa = next.cgpa,
            completed = next.total_credits_completed,
            carried = next.total_credits_carried,
            "academic record updated"
        );
    }

    info!(course_id = %course.id, mark, passed, ?trigger, "course finalized");
    Ok(FinalizeOutcome {
        course_id: course.id,
        finalized: true,
        already: false,
        passed: Some(passed),
        mark: Some(mark),
    })
}

/// Mark recompute, automatic finalize check, and note reconciliation, in that order.
async fn cascade<S: Store>(store: &mut S, course: Course) -> TrackerResult<GradeChange> {
    let (course, items) = refresh_mark(store, course).await?;

    let finalized = match finalize::evaluate(&course, &items, Trigger::Automatic)? {
        Decision::Finalize { mark, passed } => {
            Some(apply_finalize(store, &course, mark, passed, Trigger::Automatic).await?)
        }
        Decision::AlreadyFinalized { .. } | Decision::NotReady => None,
    };

    sync_notes(store, course.student_id).await?;

    Ok(GradeChange {
        item: None,
        mark: course.current_mark,
        finalized,
    })
}

pub async fn add_grade<S: Store>(
    store: &mut S,
    student_id: Uuid,
    course_id: Uuid,
    mut item: NewGradeItem,
) -> TrackerResult<GradeChange> {
    validate_scores(item.score, item.max_score, item.weight)?;
    if item.title.trim().is_empty() {
        item.title = "Grade".to_string();
    }
    if item.item_type.trim().is_empty() {
        item.item_type = "quiz".to_string();
    }

    require_student(store, student_id).await?;
    let course = require_open_course(store, student_id, course_id).await?;
    let inserted = store.insert_grade_item(course.id, &item).await?;
    let mut change = cascade(store, course).await?;
    change.item = Some(inserted);
    Ok(change)
}

pub async fn update_grade<S: Store>(
    store: &mut S,
    student_id: Uuid,
    item_id: Uuid,
    patch: &GradeItemPatch,
) -> TrackerResult<GradeChange> {
    require_student(store, student_id).await?;
    let mut item = store
        .grade_item(student_id, item_id)
        .await?
        .ok_or(TrackerError::NotFound("grade"))?;
    let course = require_open_course(store, student_id, item.course_id).await?;

    patch.apply(&mut item);
    validate_scores(item.score, item.max_score, item.weight)?;
    store.update_grade_item(&item).await?;

    let mut change = cascade(store, course).await?;
    change.item = Some(item);
    Ok(change)
}

pub async fn delete_grade<S: Store>(
    store: &mut S,
    student_id: Uuid,
    item_id: Uuid,
) -> TrackerResult<GradeChange> {
    require_student(store, student_id).await?;
    let item = store
        .grade_item(student_id, item_id)
        .await?
        .ok_or(TrackerError::NotFound("grade"))?;
    let course = require_open_course(store, student_id, item.course_id).await?;

    store.delete_grade_item(item.id).await?;
    cascade(store, course).await
}

pub async fn finalize_course<S: Store>(
    store: &mut S,
    student_id: Uuid,
    course_id: Uuid,
) -> TrackerResult<FinalizeOutcome> {
    require_student(store, student_id).await?;
    let course = store
        .lock_course(student_id, course_id)
        .await?
        .ok_or(TrackerError::NotFound("course"))?;

    if course.is_finalized() {
        return Ok(FinalizeOutcome {
            course_id: course.id,
            finalized: true,
            already: true,
            passed: course.passed,
            mark: course.current_mark,
        });
    }

    let (course, items) = refresh_mark(store, course).await?;
    let outcome = match finalize::evaluate(&course, &items, Trigger::Manual)? {
        Decision::Finalize { mark, passed } => {
            apply_finalize(store, &course, mark, passed, Trigger::Manual).await?
        }
        Decision::AlreadyFinalized { passed } => FinalizeOutcome {
            course_id: course.id,
            finalized: true,
            already: true,
            passed: Some(passed),
            mark: course.current_mark,
        },
        Decision::NotReady => {
            return Err(TrackerError::InvalidState(format!(
                "{} is not ready to finalize.",
                course.course_name
            )))
        }
    };

    sync_notes(store, student_id).await?;
    Ok(outcome)
}

/// Brings the student's app notes in line with their current marks.
pub async fn sync_notes<S: Store>(store: &mut S, student_id: Uuid) -> TrackerResult<Vec<NoteChange>> {
    let courses = store.list_courses(student_id).await?;
    let existing = store.app_notes(student_id).await?;
    let changes = advisory::reconcile(&courses, &existing);

    for change in &changes {
        match change {
            NoteChange::Upsert { course_id, content } => {
                store.upsert_app_note(student_id, *course_id, content).await?;
            }
            NoteChange::Delete { course_id } => {
                store.delete_app_note(student_id, *course_id).await?;
            }
        }
    }

    if !changes.is_empty() {
        debug!(%student_id, changes = changes.len(), "advisory notes reconciled");
    }
    Ok(changes)
}

pub async fn list_notes<S: Store>(store: &mut S, student_id: Uuid) -> TrackerResult<Vec<AdvisoryNote>> {
    require_student(store, student_id).await?;
    sync_notes(store, student_id).await?;
    store.app_notes(student_id).await
}

pub async fn standing<S: Store>(store: &mut S, student_id: Uuid) -> TrackerResult<Standing> {
    require_student(store, student_id).await?;
    let courses = store.list_courses(student_id).await?;
    let record = store
        .lock_record(student_id)
        .await?
        .unwrap_or_else(|| AcademicRecord::empty(student_id));
    Ok(record::standing(record, &courses))
}

async fn open_courses<S: Store>(store: &mut S, student_id: Uuid) -> TrackerResult<Vec<Course>> {
    let courses = store.list_courses(student_id).await?;
    Ok(courses
        .into_iter()
        .filter(|course| !course.is_finalized())
        .collect())
}

pub async fn generate_plan<S: Store>(
    store: &mut S,
    student_id: Uuid,
    from: NaiveDate,
    to: Option<NaiveDate>,
) -> TrackerResult<GeneratedPlan> {
    let to = to.unwrap_or(from);
    if to < from {
        return Err(TrackerError::InvalidInput(format!(
            "plan range ends ({to}) before it starts ({from})"
        )));
    }
    require_student(store, student_id).await?;

    let courses = open_courses(store, student_id).await?;
    let upcoming = store.exams_from(student_id, from).await?;
    let in_range: Vec<ExamInRange> = store
        .events_between(student_id, from, to)
        .await?
        .into_iter()
        .filter(|event| event.event_type == EventType::Exam)
        .filter_map(|event| {
            event.course_id.map(|course_id| ExamInRange {
                course_id,
                date: event.start_date,
            })
        })
        .collect();

    let exams = risk::nearest_exams(&upcoming);
    let ranked = risk::rank_courses(&courses, &exams);
    let existing = store.tasks_on(student_id, from).await?;

    let mut generated = Vec::new();
    for draft in planner::plan_drafts(&ranked, &existing, from) {
        generated.push(store.insert_task(student_id, &draft).await?);
    }

    info!(%student_id, date = %from, generated = generated.len(), "study plan generated");
    Ok(GeneratedPlan {
        date: from,
        generated,
        exams: in_range,
    })
}

pub async fn suggest_next<S: Store>(
    store: &mut S,
    student_id: Uuid,
    date: NaiveDate,
) -> TrackerResult<Option<SuggestedTask>> {
    require_student(store, student_id).await?;

    let courses = open_courses(store, student_id).await?;
    let exams = risk::nearest_exams(&store.exams_from(student_id, date).await?);
    let ranked = risk::rank_courses(&courses, &exams);
    let tasks = store.tasks_on(student_id, date).await?;

    let Some(suggestion) = planner::next_suggestion(&ranked, &tasks, date) else {
        debug!(%student_id, %date, "no task to suggest");
        return Ok(None);
    };

    let task = store.insert_task(student_id, &suggestion.task).await?;
    info!(%student_id, task_id = %task.id, kind = ?suggestion.kind, "next task suggested");
    Ok(Some(SuggestedTask {
        kind: suggestion.kind,
        task,
    }))
}

pub async fn add_task<S: Store>(store: &mut S, student_id: Uuid, task: NewTask) -> TrackerResult<PlannerTask> {
    require_student(store, student_id).await?;
    require_owned_course(store, student_id, task.course_id).await?;
    store.insert_task(student_id, &task).await
}

/// Sets a task's completion flag; completing a task asks for the next suggestion
/// on the task's due date.
pub async fn complete_task<S: Store>(
    store: &mut S,
    student_id: Uuid,
    task_id: Uuid,
    completed: bool,
) -> TrackerResult<TaskCompletion> {
    require_student(store, student_id).await?;
    let mut task = store
        .task(student_id, task_id)
        .await?
        .ok_or(TrackerError::NotFound("task"))?;

    store.set_task_completed(task.id, completed).await?;
    task.completed = completed;

    let suggested = if completed {
        suggest_next(store, student_id, task.due_date).await?
    } else {
        None
    };

    Ok(TaskCompletion { task, suggested })
}

pub async fn add_event<S: Store>(store: &mut S, student_id: Uuid, event: NewEvent) -> TrackerResult<PlannerEvent> {
    if event.end_date < event.start_date {
        return Err(TrackerError::InvalidInput(
            "event ends before it starts".to_string(),
        ));
    }
    require_student(store, student_id).await?;
    require_owned_course(store, student_id, event.course_id).await?;
    store.insert_event(student_id, &event).await
}

async fn require_owned_course<S: Store>(
    store: &mut S,
    student_id: Uuid,
    course_id: Option<Uuid>,
) -> TrackerResult<()> {
    if let Some(course_id) = course_id {
        store
            .lock_course(student_id, course_id)
            .await?
            .ok_or(TrackerError::NotFound("course"))?;
    }
    Ok(())
}

pub async fn update_task<S: Store>(
    store: &mut S,
    student_id: Uuid,
    task_id: Uuid,
    patch: &TaskPatch,
) -> TrackerResult<PlannerTask> {
    require_student(store, student_id).await?;
    let mut task = store
        .task(student_id, task_id)
        .await?
        .ok_or(TrackerError::NotFound("task"))?;

    patch.apply(&mut task);
    require_owned_course(store, student_id, task.course_id).await?;
    store.update_task(&task).await?;
    Ok(task)
}

pub async fn delete_task<S: Store>(store: &mut S, student_id: Uuid, task_id: Uuid) -> TrackerResult<()> {
    require_student(store, student_id).await?;
    if !store.delete_task(student_id, task_id).await? {
        return Err(TrackerError::NotFound("task"));
    }
    debug!(%student_id, %task_id, "task deleted");
    Ok(())
}

pub async fn update_event<S: Store>(
    store: &mut S,
    student_id: Uuid,
    event_id: Uuid,
    patch: &EventPatch,
) -> TrackerResult<PlannerEvent> {
    require_student(store, student_id).await?;
    let mut event = store
        .event(student_id, event_id)
        .await?
        .ok_or(TrackerError::NotFound("event"))?;

    patch.apply(&mut event);
    if event.end_date < event.start_date {
        return Err(TrackerError::InvalidInput(
            "event ends before it starts".to_string(),
        ));
    }
    require_owned_course(store, student_id, event.course_id).await?;
    store.update_event(&event).await?;
    Ok(event)
}

pub async fn delete_event<S: Store>(store: &mut S, student_id: Uuid, event_id: Uuid) -> TrackerResult<()> {
    require_student(store, student_id).await?;
    if !store.delete_event(student_id, event_id).await? {
        return Err(TrackerError::NotFound("event"));
    }
    debug!(%student_id, %event_id, "event deleted");
    Ok(())
}

/// Events overlapping `date` and the tasks due on it.
pub async fn daily_view<S: Store>(store: &mut S, student_id: Uuid, date: NaiveDate) -> TrackerResult<DailyView> {
    require_student(store, student_id).await?;
    let events = store.events_between(student_id, date, date).await?;
    let tasks = store.tasks_on(student_id, date).await?;
    Ok(DailyView { date, events, tasks })
}

pub async fn compare_plans<S: Store>(
    store: &mut S,
    student_id: Uuid,
    date: NaiveDate,
) -> TrackerResult<PlanComparison> {
    require_student(store, student_id).await?;
    let tasks = store.tasks_on(student_id, date).await?;
    Ok(feedback::compare(date, &tasks))
}

pub async fn plan_feedback<S: Store>(
    store: &mut S,
    student_id: Uuid,
    date: NaiveDate,
) -> TrackerResult<PlanFeedback> {
    require_student(store, student_id).await?;

    let courses = open_courses(store, student_id).await?;
    let events = store.events_between(student_id, date, date).await?;
    let upcoming_exams = store.exams_from(student_id, date).await?;
    let tasks = store.tasks_on(student_id, date).await?;

    Ok(feedback::review(DayContext {
        date,
        courses: &courses,
        events: &events,
        upcoming_exams: &upcoming_exams,
        tasks: &tasks,
    }))
}
