use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::AdvisoryNote;
use crate::record::{CourseStatus, Standing};

fn mark_cell(status: &CourseStatus) -> String {
    match (status.mark, status.letter) {
        (Some(mark), Some(letter)) => format!("{mark:.2} ({letter})"),
        _ => "no grades".to_string(),
    }
}

pub fn build_report(
    student_label: &str,
    generated_on: NaiveDate,
    standing: &Standing,
    notes: &[AdvisoryNote],
) -> String {
    let mut output = String::new();
    let record = &standing.record;

    let _ = writeln!(output, "# Academic Standing Report");
    let _ = writeln!(output, "Generated for {} on {}", student_label, generated_on);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Academic Record");
    let _ = writeln!(
        output,
        "- CGPA {:.2}, cumulative {:.2}%",
        record.cgpa, record.cumulative_percent
    );
    let _ = writeln!(
        output,
        "- Credits completed {:.0}, carried {:.0}",
        record.total_credits_completed, record.total_credits_carried
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## This Semester");

    match &standing.semester {
        Some(semester) => {
            let _ = writeln!(
                output,
                "- GPA {:.2} ({:.2}%) across {:.0} credit hours in progress",
                semester.semester_gpa, semester.semester_percent, semester.credits_current
            );
            let _ = writeln!(
                output,
                "- Projected CGPA {:.2}, projected cumulative {:.2}%",
                semester.projected_cgpa, semester.projected_percent
            );
        }
        None => {
            let _ = writeln!(output, "No graded courses in progress.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Courses");

    if standing.courses.is_empty() {
        let _ = writeln!(output, "No courses on record.");
    } else {
        for status in &standing.courses {
            let _ = writeln!(
                output,
                "- {} {}: {}, {}, {}",
                status.course_code,
                status.course_name,
                mark_cell(status),
                status.status.label(),
                status.state.label()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Advisory Notes");

    if notes.is_empty() {
        let _ = writeln!(output, "No advisory notes.");
    } else {
        let mut ordered: Vec<&AdvisoryNote> = notes.iter().collect();
        // General note first, then per-course notes in course order.
        ordered.sort_by_key(|note| {
            note.course_id.map(|course_id| {
                standing
                    .courses
                    .iter()
                    .position(|status| status.course_id == course_id)
                    .unwrap_or(usize::MAX)
            })
        });
        for note in ordered {
            let _ = writeln!(output);
            for line in note.content.lines() {
                if line.is_empty() {
                    let _ = writeln!(output, ">");
                } else {
                    let _ = writeln!(output, "> {line}");
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AcademicRecord, Course};
    use crate::record;
    use chrono::Utc;
    use uuid::Uuid;

    fn course(code: &str, mark: Option<f64>) -> Course {
        Course {
            id: Uuid::new_v4(),
            student_id: Uuid::nil(),
            course_code: code.to_string(),
            course_name: format!("{code} course"),
            credit_hours: 3,
            current_mark: mark,
            finalized_at: None,
            passed: None,
        }
    }

    #[test]
    fn report_lists_courses_and_projection() {
        let courses = vec![course("MATH201", Some(82.0)), course("HIST120", None)];
        let standing = record::standing(AcademicRecord::empty(Uuid::nil()), &courses);

        let report = build_report("Avery Lee", NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), &standing, &[]);

        assert!(report.starts_with("# Academic Standing Report"));
        assert!(report.contains("Generated for Avery Lee on 2026-03-02"));
        assert!(report.contains("- MATH201 MATH201 course: 82.00 (B+), safe, in progress"));
        assert!(report.contains("- HIST120 HIST120 course: no grades"));
        assert!(report.contains("Projected CGPA 3.30"));
        assert!(report.contains("No advisory notes."));
    }

    #[test]
    fn report_puts_general_note_first() {
        let courses = vec![course("CHEM110", Some(40.0))];
        let standing = record::standing(AcademicRecord::empty(Uuid::nil()), &courses);
        let notes = vec![
            AdvisoryNote {
                id: Uuid::new_v4(),
                student_id: Uuid::nil(),
                course_id: Some(courses[0].id),
                content: "Course note".to_string(),
                updated_at: Utc::now(),
            },
            AdvisoryNote {
                id: Uuid::new_v4(),
                student_id: Uuid::nil(),
                course_id: None,
                content: "General note".to_string(),
                updated_at: Utc::now(),
            },
        ];

        let report = build_report("student", NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), &standing, &notes);

        let general = report.find("> General note").unwrap();
        let specific = report.find("> Course note").unwrap();
        assert!(general < specific);
    }
}
