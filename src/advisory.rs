use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::grades;
use crate::models::{AdvisoryNote, Course};

/// Number of courses at risk or worse that triggers the general note.
pub const GENERAL_NOTE_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    Undefined,
    Safe,
    Normal,
    AtRisk,
    HighRisk,
}

impl GradeStatus {
    pub fn label(self) -> &'static str {
        match self {
            GradeStatus::Undefined => "not graded",
            GradeStatus::Safe => "safe",
            GradeStatus::Normal => "normal",
            GradeStatus::AtRisk => "at risk",
            GradeStatus::HighRisk => "high risk",
        }
    }

    pub fn needs_attention(self) -> bool {
        matches!(self, GradeStatus::AtRisk | GradeStatus::HighRisk)
    }

    fn recommendation(self) -> Option<&'static str> {
        match self {
            GradeStatus::HighRisk => Some(
                "Recommendation: your mark in this course is very low. Review the material, \
                 add study hours, and ask your instructor or use extra references.",
            ),
            GradeStatus::AtRisk => Some(
                "Recommendation: your mark needs improvement. Revisit the lessons and focus \
                 on your weak points to raise it.",
            ),
            _ => None,
        }
    }

    fn encouragement(self) -> &'static str {
        match self {
            GradeStatus::Safe => {
                "Encouragement: excellent work. Keep up this discipline, you are on the right track."
            }
            GradeStatus::AtRisk => {
                "Encouragement: don't give up. Every improvement starts with one step; focus on \
                 what to fix and you will see the difference."
            }
            GradeStatus::HighRisk => {
                "Encouragement: feeling discouraged is normal, but you are stronger than it. \
                 Take it step by step, we are with you."
            }
            GradeStatus::Normal | GradeStatus::Undefined => {
                "Encouragement: good performance. Keep reviewing and persevering to hold and grow your progress."
            }
        }
    }
}

pub fn grade_status(mark: Option<f64>) -> GradeStatus {
    match mark {
        None => GradeStatus::Undefined,
        Some(mark) if mark >= 80.0 => GradeStatus::Safe,
        Some(mark) if mark >= 70.0 => GradeStatus::Normal,
        Some(mark) if mark >= 60.0 => GradeStatus::AtRisk,
        Some(_) => GradeStatus::HighRisk,
    }
}

pub fn course_note(course: &Course) -> String {
    let Some(mark) = course.current_mark else {
        return format!("Course: {}. No grades entered yet.", course.course_name);
    };

    let status = grade_status(Some(mark));
    let mut content = format!(
        "Course: {}. Mark: {:.2}, grade: {}. Status: {}.",
        course.course_name,
        mark,
        grades::letter_grade(mark),
        status.label()
    );
    if let Some(recommendation) = status.recommendation() {
        content.push_str("\n\n");
        content.push_str(recommendation);
    }
    content.push_str("\n\n");
    content.push_str(status.encouragement());
    content
}

pub fn general_note() -> String {
    format!(
        "More than one of your courses needs attention. Prioritize your review and add \
         study hours for the critical courses.\n\n{}",
        GradeStatus::HighRisk.encouragement()
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoteChange {
    Upsert {
        course_id: Option<Uuid>,
        content: String,
    },
    Delete {
        course_id: Option<Uuid>,
    },
}

/// Notes every student should have given their current courses, keyed by course
/// (`None` for the general note).
pub fn desired_notes(courses: &[Course]) -> HashMap<Option<Uuid>, String> {
    let mut desired: HashMap<Option<Uuid>, String> = courses
        .iter()
        .map(|course| (Some(course.id), course_note(course)))
        .collect();

    let attention = courses
        .iter()
        .filter(|course| grade_status(course.current_mark).needs_attention())
        .count();
    if attention >= GENERAL_NOTE_THRESHOLD {
        desired.insert(None, general_note());
    }

    desired
}

/// Changes that bring `existing` in line with the notes `courses` call for.
///
/// Notes whose text already matches are left alone; course notes whose course is
/// no longer listed are left to the storage cascade.
pub fn reconcile(courses: &[Course], existing: &[AdvisoryNote]) -> Vec<NoteChange> {
    let desired = desired_notes(courses);
    let stored: HashMap<Option<Uuid>, &str> = existing
        .iter()
        .map(|note| (note.course_id, note.content.as_str()))
        .collect();

    let mut changes: Vec<NoteChange> = courses
        .iter()
        .map(|course| Some(course.id))
        .chain(std::iter::once(None))
        .filter_map(|key| {
            let content = desired.get(&key)?;
            (stored.get(&key) != Some(&content.as_str())).then(|| NoteChange::Upsert {
                course_id: key,
                content: content.clone(),
            })
        })
        .collect();

    if !desired.contains_key(&None) && stored.contains_key(&None) {
        changes.push(NoteChange::Delete { course_id: None });
    }

    changes
}
