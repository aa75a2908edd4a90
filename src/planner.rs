use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Course, NewTask, PlannerEvent, PlannerTask, TaskSource};
use crate::risk::{self, RankedCourse};

pub fn review_title(course: &Course) -> String {
    format!("Review: {}", course.course_name)
}

pub fn practice_title(course: &Course) -> String {
    format!("Extra practice: {}", course.course_name)
}

fn app_tasks_by_course(tasks: &[PlannerTask], date: NaiveDate) -> HashMap<Uuid, Vec<&PlannerTask>> {
    let mut grouped: HashMap<Uuid, Vec<&PlannerTask>> = HashMap::new();
    for task in tasks
        .iter()
        .filter(|task| task.source == TaskSource::App && task.due_date == date)
    {
        if let Some(course_id) = task.course_id {
            grouped.entry(course_id).or_default().push(task);
        }
    }
    grouped
}

/// Review tasks to add for `date`, one per ranked course that has no app task yet.
pub fn plan_drafts(ranked: &[RankedCourse<'_>], tasks: &[PlannerTask], date: NaiveDate) -> Vec<NewTask> {
    let existing = app_tasks_by_course(tasks, date);

    ranked
        .iter()
        .filter(|entry| !existing.contains_key(&entry.course.id))
        .map(|entry| {
            NewTask::new(
                Some(entry.course.id),
                &review_title(entry.course),
                date,
                risk::priority_for(entry.risk),
                TaskSource::App,
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Review,
    ExtraPractice,
}

#[derive(Debug, Clone)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub task: NewTask,
}

/// The single task to propose next for `date`, walking courses in ranked order.
///
/// The first course with no app task gets a review task; the first course whose
/// app tasks are all done gets an extra-practice task. Whichever comes first wins.
pub fn next_suggestion(
    ranked: &[RankedCourse<'_>],
    tasks: &[PlannerTask],
    date: NaiveDate,
) -> Option<Suggestion> {
    let existing = app_tasks_by_course(tasks, date);

    for entry in ranked {
        let kind = match existing.get(&entry.course.id) {
            None => SuggestionKind::Review,
            Some(app_tasks) if app_tasks.iter().all(|task| task.completed) => {
                SuggestionKind::ExtraPractice
            }
            Some(_) => continue,
        };
        let title = match kind {
            SuggestionKind::Review => review_title(entry.course),
            SuggestionKind::ExtraPractice => practice_title(entry.course),
        };
        return Some(Suggestion {
            kind,
            task: NewTask::new(
                Some(entry.course.id),
                &title,
                date,
                risk::priority_for(entry.risk),
                TaskSource::App,
            ),
        });
    }

    None
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamInRange {
    pub course_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPlan {
    pub date: NaiveDate,
    pub generated: Vec<PlannerTask>,
    /// Exams found in the requested range; not yet used to shape the tasks.
    pub exams: Vec<ExamInRange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyView {
    pub date: NaiveDate,
    pub events: Vec<PlannerEvent>,
    pub tasks: Vec<PlannerTask>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestedTask {
    pub kind: SuggestionKind,
    pub task: PlannerTask,
}
