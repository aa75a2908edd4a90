use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Course, EventType, PlannerEvent};

pub fn risk_score(mark: Option<f64>) -> u8 {
    match mark {
        None => 2,
        Some(mark) if mark >= 80.0 => 0,
        Some(mark) if mark >= 70.0 => 1,
        Some(mark) if mark >= 60.0 => 2,
        Some(_) => 3,
    }
}

pub fn risk_label(risk: u8) -> &'static str {
    match risk {
        0 => "excellent",
        1 => "good",
        2 => "needs focus",
        _ => "at risk",
    }
}

/// Task priority for a course: riskier courses get higher priority, kept in `1..=5`.
pub fn priority_for(risk: u8) -> i32 {
    (5 - i32::from(risk)).clamp(1, 5)
}

#[derive(Debug, Clone)]
pub struct RankedCourse<'a> {
    pub course: &'a Course,
    pub risk: u8,
    pub next_exam: Option<NaiveDate>,
}

/// Earliest exam date per course among `events`, ignoring events without a course.
pub fn nearest_exams(events: &[PlannerEvent]) -> HashMap<Uuid, NaiveDate> {
    let mut exams: HashMap<Uuid, NaiveDate> = HashMap::new();

    for event in events.iter().filter(|event| event.event_type == EventType::Exam) {
        let Some(course_id) = event.course_id else {
            continue;
        };
        exams
            .entry(course_id)
            .and_modify(|date| *date = (*date).min(event.start_date))
            .or_insert(event.start_date);
    }

    exams
}

/// Courses in study order: riskiest first, then the soonest exam (courses without
/// a known exam last), then input order.
pub fn rank_courses<'a>(
    courses: &'a [Course],
    exams: &HashMap<Uuid, NaiveDate>,
) -> Vec<RankedCourse<'a>> {
    let mut ranked: Vec<RankedCourse<'a>> = courses
        .iter()
        .map(|course| RankedCourse {
            course,
            risk: risk_score(course.current_mark),
            next_exam: exams.get(&course.id).copied(),
        })
        .collect();

    ranked.sort_by(compare_ranked);
    ranked
}

pub fn compare_ranked(a: &RankedCourse<'_>, b: &RankedCourse<'_>) -> Ordering {
    b.risk
        .cmp(&a.risk)
        .then_with(|| match (a.next_exam, b.next_exam) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}
