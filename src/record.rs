use serde::Serialize;
use uuid::Uuid;

use crate::advisory::{self, GradeStatus};
use crate::finalize::CourseState;
use crate::grades;
use crate::models::{AcademicRecord, Course};

/// Running mean of `current` over `current_weight` after adding `value` at `weight`.
pub fn incremental_mean(current: f64, current_weight: f64, value: f64, weight: f64) -> f64 {
    let total = current_weight + weight;
    if total <= 0.0 {
        return current;
    }
    (current * current_weight + value * weight) / total
}

/// Folds one finalized course into the prior record.
///
/// Passed courses move `cgpa`, `cumulative_percent` and completed credits. Failed
/// courses only add to carried credits and stay out of both means. Courses with no
/// credit hours leave the record untouched.
pub fn apply_finalized(
    record: &AcademicRecord,
    credit_hours: i32,
    mark: f64,
    passed: bool,
) -> AcademicRecord {
    let mut next = record.clone();
    if credit_hours <= 0 {
        return next;
    }
    let hours = f64::from(credit_hours);

    if passed {
        let completed = record.total_credits_completed;
        next.cgpa = incremental_mean(record.cgpa, completed, grades::grade_points(mark), hours);
        next.cumulative_percent =
            incremental_mean(record.cumulative_percent, completed, mark, hours);
        next.total_credits_completed = completed + hours;
    } else {
        next.total_credits_carried = record.total_credits_carried + hours;
    }

    next
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseStatus {
    pub course_id: Uuid,
    pub course_code: String,
    pub course_name: String,
    pub credit_hours: i32,
    pub mark: Option<f64>,
    pub letter: Option<&'static str>,
    pub grade_points: Option<f64>,
    pub status: GradeStatus,
    pub state: CourseState,
}

impl CourseStatus {
    pub fn of(course: &Course) -> Self {
        Self {
            course_id: course.id,
            course_code: course.course_code.clone(),
            course_name: course.course_name.clone(),
            credit_hours: course.credit_hours,
            mark: course.current_mark,
            letter: course.current_mark.map(grades::letter_grade),
            grade_points: course.current_mark.map(grades::grade_points),
            status: advisory::grade_status(course.current_mark),
            state: CourseState::of(course),
        }
    }
}

/// Credit-weighted view of the courses still in progress, and the cumulative
/// figures the record would show if they finished at their current marks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemesterProjection {
    pub semester_gpa: f64,
    pub semester_percent: f64,
    pub credits_current: f64,
    pub projected_cgpa: f64,
    pub projected_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    pub record: AcademicRecord,
    pub courses: Vec<CourseStatus>,
    pub semester: Option<SemesterProjection>,
}

pub fn project_semester(record: &AcademicRecord, courses: &[Course]) -> Option<SemesterProjection> {
    let mut credits = 0.0;
    let mut points_sum = 0.0;
    let mut percent_sum = 0.0;

    for course in courses.iter().filter(|course| !course.is_finalized()) {
        let Some(mark) = course.current_mark else {
            continue;
        };
        if course.credit_hours <= 0 {
            continue;
        }
        let hours = f64::from(course.credit_hours);
        credits += hours;
        points_sum += grades::grade_points(mark) * hours;
        percent_sum += mark * hours;
    }

    if credits <= 0.0 {
        return None;
    }

    let semester_gpa = points_sum / credits;
    let semester_percent = percent_sum / credits;
    let completed = record.total_credits_completed;
    Some(SemesterProjection {
        semester_gpa,
        semester_percent,
        credits_current: credits,
        projected_cgpa: incremental_mean(record.cgpa, completed, semester_gpa, credits),
        projected_percent: incremental_mean(
            record.cumulative_percent,
            completed,
            semester_percent,
            credits,
        ),
    })
}

pub fn standing(record: AcademicRecord, courses: &[Course]) -> Standing {
    let semester = project_semester(&record, courses);
    Standing {
        courses: courses.iter().map(CourseStatus::of).collect(),
        record,
        semester,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_pass_sets_the_mean() {
        let start = AcademicRecord::empty(Uuid::new_v4());
        let next = apply_finalized(&start, 3, 87.0, true);
        assert!(close(next.cgpa, 3.7));
        assert!(close(next.cumulative_percent, 87.0));
        assert!(close(next.total_credits_completed, 3.0));
        assert!(close(next.total_credits_carried, 0.0));
    }

    #[test]
    fn second_pass_is_credit_weighted() {
        let start = AcademicRecord::empty(Uuid::new_v4());
        let first = apply_finalized(&start, 3, 87.0, true);
        let second = apply_finalized(&first, 3, 62.0, true);
        assert!(close(second.cgpa, 2.85));
        assert!(close(second.cumulative_percent, 74.5));
        assert!(close(second.total_credits_completed, 6.0));

        let heavier = apply_finalized(&first, 1, 62.0, true);
        assert!(close(heavier.cgpa, (3.7 * 3.0 + 2.0) / 4.0));
    }

    #[test]
    fn failure_only_adds_carried_credits() {
        let start = AcademicRecord::empty(Uuid::new_v4());
        let passed = apply_finalized(&start, 3, 91.0, true);
        let failed = apply_finalized(&passed, 4, 31.0, false);
        assert!(close(failed.cgpa, passed.cgpa));
        assert!(close(failed.cumulative_percent, passed.cumulative_percent));
        assert!(close(failed.total_credits_completed, 3.0));
        assert!(close(failed.total_credits_carried, 4.0));
    }

    #[test]
    fn zero_credit_courses_are_skipped() {
        let start = AcademicRecord::empty(Uuid::new_v4());
        assert_eq!(apply_finalized(&start, 0, 95.0, true), start);
    }

    #[test]
    fn projection_covers_in_progress_courses_only() {
        let student_id = Uuid::new_v4();
        let record = apply_finalized(&AcademicRecord::empty(student_id), 3, 92.0, true);
        let open = Course {
            id: Uuid::new_v4(),
            student_id,
            course_code: "PHY110".to_string(),
            course_name: "Physics".to_string(),
            credit_hours: 3,
            current_mark: Some(61.0),
            finalized_at: None,
            passed: None,
        };
        let mut closed = open.clone();
        closed.id = Uuid::new_v4();
        closed.current_mark = Some(92.0);
        closed.finalized_at = Some(chrono::Utc::now());
        closed.passed = Some(true);

        let projection = project_semester(&record, &[open, closed]).unwrap();
        assert!(close(projection.semester_gpa, 2.0));
        assert!(close(projection.credits_current, 3.0));
        assert!(close(projection.projected_cgpa, 3.0));
        assert!(close(projection.projected_percent, 76.5));
    }

    #[test]
    fn projection_is_empty_without_marks() {
        let record = AcademicRecord::empty(Uuid::new_v4());
        assert_eq!(project_semester(&record, &[]), None);
    }
}
