use serde::Serialize;

use crate::error::TrackerError;
use crate::grades;
use crate::models::{Course, GradeItem};

/// Total item weight at which a course is considered fully graded.
/// Slightly under 100 so rounded weights such as 33.3 x 3 still count.
pub const COMPLETE_WEIGHT: f64 = 99.5;

pub const PASS_MARK: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseState {
    InProgress,
    FinalizedPassed,
    FinalizedFailed,
}

impl CourseState {
    pub fn of(course: &Course) -> Self {
        match (course.finalized_at, course.passed) {
            (None, _) => CourseState::InProgress,
            (Some(_), Some(true)) => CourseState::FinalizedPassed,
            (Some(_), _) => CourseState::FinalizedFailed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CourseState::InProgress => "in progress",
            CourseState::FinalizedPassed => "passed",
            CourseState::FinalizedFailed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Re-evaluation after a grade item mutation.
    Automatic,
    /// Explicit request from the student.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Finalize { mark: f64, passed: bool },
    AlreadyFinalized { passed: bool },
    NotReady,
}

pub fn passes(mark: f64) -> bool {
    mark >= PASS_MARK
}

/// Decides whether `course` should move to a terminal state.
///
/// `course.current_mark` must already reflect `items`. Manual requests skip the
/// weight requirement but fail when there is no mark to finalize.
pub fn evaluate(
    course: &Course,
    items: &[GradeItem],
    trigger: Trigger,
) -> Result<Decision, TrackerError> {
    if course.is_finalized() {
        return Ok(Decision::AlreadyFinalized {
            passed: course.passed.unwrap_or(false),
        });
    }

    let Some(mark) = course.current_mark else {
        return match trigger {
            Trigger::Automatic => Ok(Decision::NotReady),
            Trigger::Manual => Err(TrackerError::InvalidState(
                "Enter at least one grade before marking the course as finished.".to_string(),
            )),
        };
    };

    if trigger == Trigger::Automatic && grades::total_weight(items) < COMPLETE_WEIGHT {
        return Ok(Decision::NotReady);
    }

    Ok(Decision::Finalize {
        mark,
        passed: passes(mark),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizeOutcome {
    pub course_id: uuid::Uuid,
    pub finalized: bool,
    pub already: bool,
    pub passed: Option<bool>,
    pub mark: Option<f64>,
}
