use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Course, PlannerEvent, PlannerTask, TaskSource};
use crate::risk::{self, RankedCourse};

/// Everything the engine looks at for one date.
#[derive(Debug, Clone, Copy)]
pub struct DayContext<'a> {
    pub date: NaiveDate,
    pub courses: &'a [Course],
    /// Events overlapping `date`.
    pub events: &'a [PlannerEvent],
    /// Exam events starting on or after `date`.
    pub upcoming_exams: &'a [PlannerEvent],
    /// Tasks due on `date`, any source.
    pub tasks: &'a [PlannerTask],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedbackItem {
    Priority {
        course_name: String,
        reason: String,
        recommendation: String,
    },
    Exam {
        recommendation: String,
    },
}

impl FeedbackItem {
    pub fn recommendation(&self) -> &str {
        match self {
            FeedbackItem::Priority { recommendation, .. } => recommendation,
            FeedbackItem::Exam { recommendation } => recommendation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackDetail {
    pub title: &'static str,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskCourse {
    pub course_id: Uuid,
    pub course_name: String,
    pub mark: Option<f64>,
    pub risk: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanFeedback {
    pub date: NaiveDate,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub completion_ratio: Option<f64>,
    pub at_risk: Vec<AtRiskCourse>,
    pub recommended_order: Vec<Uuid>,
    pub student_order: Vec<Uuid>,
    pub feedback: Vec<FeedbackItem>,
    pub details: Vec<FeedbackDetail>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanComparison {
    pub date: NaiveDate,
    pub app_plan: Vec<PlannerTask>,
    pub student_plan: Vec<PlannerTask>,
}

/// Tasks in display order: insertion sequence, then higher priority first.
pub fn display_order(tasks: &[PlannerTask], source: TaskSource) -> Vec<PlannerTask> {
    let mut selected: Vec<PlannerTask> = tasks
        .iter()
        .filter(|task| task.source == source)
        .cloned()
        .collect();
    selected.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| b.priority.cmp(&a.priority))
    });
    selected
}

pub fn compare(date: NaiveDate, tasks: &[PlannerTask]) -> PlanComparison {
    PlanComparison {
        date,
        app_plan: display_order(tasks, TaskSource::App),
        student_plan: display_order(tasks, TaskSource::Student),
    }
}

fn format_mark(mark: Option<f64>) -> String {
    mark.map(|mark| format!("{mark:.2}%"))
        .unwrap_or_else(|| "not set".to_string())
}

fn progress_detail(completed: usize, total: usize) -> FeedbackDetail {
    let percent = (completed as f64 / total as f64 * 100.0).round();
    let tail = if completed >= total {
        " Well done! Day plan is complete.".to_string()
    } else {
        format!(" {} tasks remaining.", total - completed)
    };
    FeedbackDetail {
        title: "Task progress",
        body: format!("You completed {completed} of {total} tasks for this day ({percent}%).{tail}"),
    }
}

/// Why `first` should lead over `current`, if there is a concrete reason.
fn reorder_reason(first: &RankedCourse<'_>, current: &RankedCourse<'_>) -> Option<(String, &'static str)> {
    let name = &first.course.course_name;
    if first.risk > current.risk {
        return Some((
            format!("\"{name}\" is in a more critical state (low or missing mark)."),
            "lower grade or not set",
        ));
    }
    match (first.next_exam, current.next_exam) {
        (Some(a), Some(b)) if a < b => {}
        (Some(_), None) => {}
        _ => return None,
    }
    Some((
        format!("The exam for \"{name}\" is sooner than the others."),
        "exam date is soonest",
    ))
}

pub fn review(ctx: DayContext<'_>) -> PlanFeedback {
    let total = ctx.tasks.len();
    let completed = ctx.tasks.iter().filter(|task| task.completed).count();
    let exams = risk::nearest_exams(ctx.upcoming_exams);
    let student_tasks = display_order(ctx.tasks, TaskSource::Student);

    let mut feedback = Vec::new();
    let mut details = Vec::new();

    if total > 0 {
        details.push(progress_detail(completed, total));
    }

    let at_risk: Vec<AtRiskCourse> = ctx
        .courses
        .iter()
        .map(|course| (course, risk::risk_score(course.current_mark)))
        .filter(|(_, risk)| *risk >= 2)
        .map(|(course, risk)| AtRiskCourse {
            course_id: course.id,
            course_name: course.course_name.clone(),
            mark: course.current_mark,
            risk,
        })
        .collect();
    if !at_risk.is_empty() {
        let body = at_risk
            .iter()
            .map(|course| {
                format!(
                    "\"{}\" (current mark: {}, {}).",
                    course.course_name,
                    format_mark(course.mark),
                    risk::risk_label(course.risk)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        details.push(FeedbackDetail {
            title: "Courses that need focus",
            body,
        });
    }

    let mut student_order: Vec<Uuid> = Vec::new();
    for course_id in student_tasks.iter().filter_map(|task| task.course_id) {
        if !student_order.contains(&course_id) {
            student_order.push(course_id);
        }
    }
    let planned: Vec<Course> = ctx
        .courses
        .iter()
        .filter(|course| student_order.contains(&course.id))
        .cloned()
        .collect();
    let recommended = risk::rank_courses(&planned, &exams);
    let recommended_order: Vec<Uuid> = recommended.iter().map(|entry| entry.course.id).collect();

    if recommended.len() >= 2 {
        let first = &recommended[0];
        // First course the student planned that is still open.
        let current = student_order
            .iter()
            .find_map(|id| recommended.iter().find(|entry| entry.course.id == *id));
        let reason = match current {
            Some(current) if current.course.id != first.course.id => reorder_reason(first, current),
            _ => None,
        };

        match reason {
            Some((reason, why)) => {
                let name = first.course.course_name.clone();
                details.push(FeedbackDetail {
                    title: "Priority order",
                    body: format!(
                        "\"{name}\" should come first ({why}). We recommend starting with this course."
                    ),
                });
                feedback.push(FeedbackItem::Priority {
                    recommendation: format!("Start with \"{name}\" first."),
                    course_name: name,
                    reason,
                });
            }
            None => details.push(FeedbackDetail {
                title: "Priority order",
                body: "Your order makes sense: you started with the highest-priority course. Keep it up."
                    .to_string(),
            }),
        }
    }

    let mut exam_list: Vec<(&Course, NaiveDate)> = ctx
        .courses
        .iter()
        .filter_map(|course| exams.get(&course.id).map(|date| (course, *date)))
        .collect();
    exam_list.sort_by_key(|(_, date)| *date);
    if !exam_list.is_empty() {
        let names = exam_list
            .iter()
            .map(|(course, date)| format!("{} ({})", course.course_name, date))
            .collect::<Vec<_>>()
            .join(", ");
        feedback.push(FeedbackItem::Exam {
            recommendation: format!(
                "You have upcoming exams: {names}. Focus your preparation by how close each date is."
            ),
        });
        details.push(FeedbackDetail {
            title: "Upcoming exams",
            body: format!("You have exams on: {names}. Allocate review time before each date."),
        });
    }

    if !ctx.events.is_empty() {
        details.push(FeedbackDetail {
            title: "Today's events",
            body: format!(
                "You have {} event(s) today. Make sure to balance time between events and tasks.",
                ctx.events.len()
            ),
        });
    }

    let nothing_planned = total == 0 && ctx.events.is_empty();
    if nothing_planned {
        details.push(FeedbackDetail {
            title: "No tasks for this day",
            body: "No tasks or events for this day. Add an event or generate a smart plan to get started."
                .to_string(),
        });
    }

    let summary = if !feedback.is_empty() {
        feedback
            .iter()
            .map(FeedbackItem::recommendation)
            .collect::<Vec<_>>()
            .join(" ")
    } else if total > 0 && completed >= total {
        "Well done! Today's tasks are complete. Ask for extra tasks once the suggested ones are done."
            .to_string()
    } else if total > 0 {
        "Your order is good. Focus on finishing tasks by priority.".to_string()
    } else if nothing_planned {
        "No tasks or events planned for this day. Generate a plan to get started.".to_string()
    } else {
        "Your schedule makes sense. Keep organizing around your priorities.".to_string()
    };

    PlanFeedback {
        date: ctx.date,
        completed_tasks: completed,
        total_tasks: total,
        completion_ratio: (total > 0).then(|| completed as f64 / total as f64),
        at_risk,
        recommended_order,
        student_order,
        feedback,
        details,
        summary,
    }
}

/// Course lookup used when rendering feedback for a terminal.
pub fn course_names(courses: &[Course]) -> HashMap<Uuid, &str> {
    courses
        .iter()
        .map(|course| (course.id, course.course_name.as_str()))
        .collect()
}
