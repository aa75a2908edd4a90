use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::models::{
    AcademicRecord, AdvisoryNote, Course, EventType, GradeItem, NewEvent, NewGradeItem, NewTask,
    PlannerEvent, PlannerTask,
};
use crate::service;
use crate::store::{CourseStore, GradeStore, NoteStore, PlannerStore, RecordStore};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// One command's worth of database work. Dropping it without `commit` rolls back.
pub struct PgStore {
    tx: Transaction<'static, Postgres>,
}

impl PgStore {
    pub async fn begin(pool: &PgPool) -> anyhow::Result<Self> {
        let tx = pool.begin().await.context("failed to open transaction")?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> anyhow::Result<()> {
        self.tx.commit().await.context("failed to commit transaction")?;
        Ok(())
    }
}

const COURSE_COLUMNS: &str = "id, student_id, course_code, course_name, credit_hours, \
     current_mark, finalized_at, passed";

const TASK_COLUMNS: &str =
    "id, student_id, course_id, title, due_date, priority, completed, source, sort_order";

const EVENT_COLUMNS: &str = "id, student_id, course_id, title, start_date, end_date, \
     start_time, end_time, event_type";

fn course_from_row(row: &PgRow) -> TrackerResult<Course> {
    Ok(Course {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        course_code: row.try_get("course_code")?,
        course_name: row.try_get("course_name")?,
        credit_hours: row.try_get("credit_hours")?,
        current_mark: row.try_get("current_mark")?,
        finalized_at: row.try_get("finalized_at")?,
        passed: row.try_get("passed")?,
    })
}

fn grade_from_row(row: &PgRow) -> TrackerResult<GradeItem> {
    Ok(GradeItem {
        id: row.try_get("id")?,
        course_id: row.try_get("course_id")?,
        item_type: row.try_get("item_type")?,
        title: row.try_get("title")?,
        score: row.try_get("score")?,
        max_score: row.try_get("max_score")?,
        weight: row.try_get("weight")?,
    })
}

fn record_from_row(row: &PgRow) -> TrackerResult<AcademicRecord> {
    Ok(AcademicRecord {
        student_id: row.try_get("student_id")?,
        cgpa: row.try_get("cgpa")?,
        cumulative_percent: row.try_get("cumulative_percent")?,
        total_credits_completed: row.try_get("total_credits_completed")?,
        total_credits_carried: row.try_get("total_credits_carried")?,
    })
}

fn note_from_row(row: &PgRow) -> TrackerResult<AdvisoryNote> {
    Ok(AdvisoryNote {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        course_id: row.try_get("course_id")?,
        content: row.try_get("content")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn task_from_row(row: &PgRow) -> TrackerResult<PlannerTask> {
    let source: String = row.try_get("source")?;
    Ok(PlannerTask {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        course_id: row.try_get("course_id")?,
        title: row.try_get("title")?,
        due_date: row.try_get("due_date")?,
        priority: row.try_get("priority")?,
        completed: row.try_get("completed")?,
        source: source.parse()?,
        sort_order: row.try_get("sort_order")?,
    })
}

fn event_from_row(row: &PgRow) -> TrackerResult<PlannerEvent> {
    let event_type: String = row.try_get("event_type")?;
    Ok(PlannerEvent {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        course_id: row.try_get("course_id")?,
        title: row.try_get("title")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        event_type: event_type.parse()?,
    })
}

#[async_trait]
impl CourseStore for PgStore {
    async fn lock_student(&mut self, student_id: Uuid) -> TrackerResult<bool> {
        let row = sqlx::query("SELECT id FROM academic_standing.students WHERE id = $1 FOR UPDATE")
            .bind(student_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.is_some())
    }

    async fn list_courses(&mut self, student_id: Uuid) -> TrackerResult<Vec<Course>> {
        let query = format!(
            "SELECT {COURSE_COLUMNS} FROM academic_standing.courses \
             WHERE student_id = $1 ORDER BY created_at, course_code"
        );
        let rows = sqlx::query(&query)
            .bind(student_id)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(course_from_row).collect()
    }

    async fn lock_course(&mut self, student_id: Uuid, course_id: Uuid) -> TrackerResult<Option<Course>> {
        let query = format!(
            "SELECT {COURSE_COLUMNS} FROM academic_standing.courses \
             WHERE id = $1 AND student_id = $2 FOR UPDATE"
        );
        let row = sqlx::query(&query)
            .bind(course_id)
            .bind(student_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn course_by_code(&mut self, student_id: Uuid, course_code: &str) -> TrackerResult<Option<Course>> {
        let query = format!(
            "SELECT {COURSE_COLUMNS} FROM academic_standing.courses \
             WHERE student_id = $1 AND course_code = $2"
        );
        let row = sqlx::query(&query)
            .bind(student_id)
            .bind(course_code)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn set_current_mark(&mut self, course_id: Uuid, mark: Option<f64>) -> TrackerResult<()> {
        sqlx::query("UPDATE academic_standing.courses SET current_mark = $1 WHERE id = $2")
            .bind(mark)
            .bind(course_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn mark_finalized(
        &mut self,
        course_id: Uuid,
        finalized_at: DateTime<Utc>,
        passed: bool,
    ) -> TrackerResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE academic_standing.courses
            SET finalized_at = $1, passed = $2
            WHERE id = $3 AND finalized_at IS NULL
            "#,
        )
        .bind(finalized_at)
        .bind(passed)
        .bind(course_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl GradeStore for PgStore {
    async fn grade_items(&mut self, course_id: Uuid) -> TrackerResult<Vec<GradeItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, course_id, item_type, title, score, max_score, weight
            FROM academic_standing.grade_items
            WHERE course_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(course_id)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(grade_from_row).collect()
    }

    async fn grade_item(&mut self, student_id: Uuid, item_id: Uuid) -> TrackerResult<Option<GradeItem>> {
        let row = sqlx::query(
            r#"
            SELECT g.id, g.course_id, g.item_type, g.title, g.score, g.max_score, g.weight
            FROM academic_standing.grade_items g
            JOIN academic_standing.courses c ON c.id = g.course_id
            WHERE g.id = $1 AND c.student_id = $2
            "#,
        )
        .bind(item_id)
        .bind(student_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(grade_from_row).transpose()
    }

    async fn insert_grade_item(&mut self, course_id: Uuid, item: &NewGradeItem) -> TrackerResult<GradeItem> {
        let row = sqlx::query(
            r#"
            INSERT INTO academic_standing.grade_items
            (id, course_id, item_type, title, score, max_score, weight)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, course_id, item_type, title, score, max_score, weight
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(&item.item_type)
        .bind(&item.title)
        .bind(item.score)
        .bind(item.max_score)
        .bind(item.weight)
        .fetch_one(&mut *self.tx)
        .await?;
        grade_from_row(&row)
    }

    async fn update_grade_item(&mut self, item: &GradeItem) -> TrackerResult<()> {
        sqlx::query(
            r#"
            UPDATE academic_standing.grade_items
            SET item_type = $1, title = $2, score = $3, max_score = $4, weight = $5
            WHERE id = $6
            "#,
        )
        .bind(&item.item_type)
        .bind(&item.title)
        .bind(item.score)
        .bind(item.max_score)
        .bind(item.weight)
        .bind(item.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_grade_item(&mut self, item_id: Uuid) -> TrackerResult<()> {
        sqlx::query("DELETE FROM academic_standing.grade_items WHERE id = $1")
            .bind(item_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn lock_record(&mut self, student_id: Uuid) -> TrackerResult<Option<AcademicRecord>> {
        let row = sqlx::query(
            r#"
            SELECT student_id, cgpa, cumulative_percent, total_credits_completed, total_credits_carried
            FROM academic_standing.academic_records
            WHERE student_id = $1
            FOR UPDATE
            "#,
        )
        .bind(student_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn save_record(&mut self, record: &AcademicRecord) -> TrackerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO academic_standing.academic_records
            (student_id, cgpa, cumulative_percent, total_credits_completed, total_credits_carried)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_id) DO UPDATE
            SET cgpa = EXCLUDED.cgpa,
                cumulative_percent = EXCLUDED.cumulative_percent,
                total_credits_completed = EXCLUDED.total_credits_completed,
                total_credits_carried = EXCLUDED.total_credits_carried,
                updated_at = now()
            "#,
        )
        .bind(record.student_id)
        .bind(record.cgpa)
        .bind(record.cumulative_percent)
        .bind(record.total_credits_completed)
        .bind(record.total_credits_carried)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl NoteStore for PgStore {
    async fn app_notes(&mut self, student_id: Uuid) -> TrackerResult<Vec<AdvisoryNote>> {
        let rows = sqlx::query(
            r#"
            SELECT id, student_id, course_id, content, updated_at
            FROM academic_standing.advisory_notes
            WHERE student_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(note_from_row).collect()
    }

    async fn upsert_app_note(
        &mut self,
        student_id: Uuid,
        course_id: Option<Uuid>,
        content: &str,
    ) -> TrackerResult<()> {
        let query = match course_id {
            Some(_) => {
                r#"
                INSERT INTO academic_standing.advisory_notes (id, student_id, course_id, content)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (student_id, course_id) WHERE course_id IS NOT NULL DO UPDATE
                SET content = EXCLUDED.content, updated_at = now()
                "#
            }
            None => {
                r#"
                INSERT INTO academic_standing.advisory_notes (id, student_id, course_id, content)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (student_id) WHERE course_id IS NULL DO UPDATE
                SET content = EXCLUDED.content, updated_at = now()
                "#
            }
        };

        sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(student_id)
            .bind(course_id)
            .bind(content)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_app_note(&mut self, student_id: Uuid, course_id: Option<Uuid>) -> TrackerResult<()> {
        sqlx::query(
            r#"
            DELETE FROM academic_standing.advisory_notes
            WHERE student_id = $1 AND course_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PlannerStore for PgStore {
    async fn tasks_on(&mut self, student_id: Uuid, date: NaiveDate) -> TrackerResult<Vec<PlannerTask>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM academic_standing.planner_tasks \
             WHERE student_id = $1 AND due_date = $2 \
             ORDER BY sort_order, priority DESC"
        );
        let rows = sqlx::query(&query)
            .bind(student_id)
            .bind(date)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(task_from_row).collect()
    }

    async fn task(&mut self, student_id: Uuid, task_id: Uuid) -> TrackerResult<Option<PlannerTask>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM academic_standing.planner_tasks \
             WHERE id = $1 AND student_id = $2 FOR UPDATE"
        );
        let row = sqlx::query(&query)
            .bind(task_id)
            .bind(student_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(task_from_row).transpose()
    }

    async fn insert_task(&mut self, student_id: Uuid, task: &NewTask) -> TrackerResult<PlannerTask> {
        let query = format!(
            r#"
            INSERT INTO academic_standing.planner_tasks
            (id, student_id, course_id, title, due_date, priority, completed, source, sort_order)
            SELECT $1, $2, $3, $4, $5, $6, FALSE, $7, COALESCE(MAX(sort_order), 0) + 1
            FROM academic_standing.planner_tasks
            WHERE student_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(student_id)
            .bind(task.course_id)
            .bind(&task.title)
            .bind(task.due_date)
            .bind(task.priority)
            .bind(task.source.as_str())
            .fetch_one(&mut *self.tx)
            .await?;
        task_from_row(&row)
    }

    async fn set_task_completed(&mut self, task_id: Uuid, completed: bool) -> TrackerResult<()> {
        sqlx::query("UPDATE academic_standing.planner_tasks SET completed = $1 WHERE id = $2")
            .bind(completed)
            .bind(task_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_task(&mut self, task: &PlannerTask) -> TrackerResult<()> {
        sqlx::query(
            r#"
            UPDATE academic_standing.planner_tasks
            SET course_id = $1, title = $2, due_date = $3, priority = $4
            WHERE id = $5
            "#,
        )
        .bind(task.course_id)
        .bind(&task.title)
        .bind(task.due_date)
        .bind(task.priority)
        .bind(task.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_task(&mut self, student_id: Uuid, task_id: Uuid) -> TrackerResult<bool> {
        let result = sqlx::query(
            "DELETE FROM academic_standing.planner_tasks WHERE id = $1 AND student_id = $2",
        )
        .bind(task_id)
        .bind(student_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn events_between(
        &mut self,
        student_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TrackerResult<Vec<PlannerEvent>> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM academic_standing.planner_events \
             WHERE student_id = $1 AND start_date <= $3 AND end_date >= $2 \
             ORDER BY start_date, start_time"
        );
        let rows = sqlx::query(&query)
            .bind(student_id)
            .bind(from)
            .bind(to)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(event_from_row).collect()
    }

    async fn exams_from(&mut self, student_id: Uuid, from: NaiveDate) -> TrackerResult<Vec<PlannerEvent>> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM academic_standing.planner_events \
             WHERE student_id = $1 AND event_type = 'exam' AND start_date >= $2 \
             ORDER BY start_date, start_time"
        );
        let rows = sqlx::query(&query)
            .bind(student_id)
            .bind(from)
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(event_from_row).collect()
    }

    async fn insert_event(&mut self, student_id: Uuid, event: &NewEvent) -> TrackerResult<PlannerEvent> {
        let query = format!(
            r#"
            INSERT INTO academic_standing.planner_events
            (id, student_id, course_id, title, start_date, end_date, start_time, end_time, event_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(student_id)
            .bind(event.course_id)
            .bind(&event.title)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(event.start_time)
            .bind(event.end_time)
            .bind(event.event_type.as_str())
            .fetch_one(&mut *self.tx)
            .await?;
        event_from_row(&row)
    }

    async fn event(&mut self, student_id: Uuid, event_id: Uuid) -> TrackerResult<Option<PlannerEvent>> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM academic_standing.planner_events \
             WHERE id = $1 AND student_id = $2 FOR UPDATE"
        );
        let row = sqlx::query(&query)
            .bind(event_id)
            .bind(student_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn update_event(&mut self, event: &PlannerEvent) -> TrackerResult<()> {
        sqlx::query(
            r#"
            UPDATE academic_standing.planner_events
            SET course_id = $1, title = $2, start_date = $3, end_date = $4,
                start_time = $5, end_time = $6, event_type = $7
            WHERE id = $8
            "#,
        )
        .bind(event.course_id)
        .bind(&event.title)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(event.event_type.as_str())
        .bind(event.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_event(&mut self, student_id: Uuid, event_id: Uuid) -> TrackerResult<bool> {
        let result = sqlx::query(
            "DELETE FROM academic_standing.planner_events WHERE id = $1 AND student_id = $2",
        )
        .bind(event_id)
        .bind(student_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Demo student used by `seed`.
pub const SEED_STUDENT_ID: &str = "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2";

pub async fn seed(pool: &PgPool) -> anyhow::Result<Uuid> {
    let student_id = Uuid::parse_str(SEED_STUDENT_ID)?;
    let mut store = PgStore::begin(pool).await?;

    sqlx::query(
        r#"
        INSERT INTO academic_standing.students (id, full_name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
        "#,
    )
    .bind(student_id)
    .bind("Avery Lee")
    .bind("avery.lee@groupscholar.com")
    .execute(&mut *store.tx)
    .await?;

    let courses = vec![
        ("MATH201", "Linear Algebra", 3),
        ("CHEM110", "General Chemistry", 4),
        ("HIST120", "World History", 3),
    ];

    for (code, name, credit_hours) in courses {
        sqlx::query(
            r#"
            INSERT INTO academic_standing.courses (id, student_id, course_code, course_name, credit_hours)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_id, course_code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(code)
        .bind(name)
        .bind(credit_hours)
        .execute(&mut *store.tx)
        .await?;
    }

    let grades = vec![
        ("MATH201", "quiz", "Quiz 1", 18.0, 20.0, 10.0),
        ("MATH201", "midterm", "Midterm", 71.0, 100.0, 30.0),
        ("CHEM110", "lab", "Lab report", 12.0, 20.0, 15.0),
        ("CHEM110", "midterm", "Midterm", 55.0, 100.0, 35.0),
        ("HIST120", "essay", "Essay", 41.0, 50.0, 25.0),
    ];

    for (code, item_type, title, score, max_score, weight) in grades {
        let course = store
            .course_by_code(student_id, code)
            .await?
            .with_context(|| format!("seed course {code} missing"))?;
        let already_seeded = store
            .grade_items(course.id)
            .await?
            .iter()
            .any(|item| item.title == title);
        if already_seeded {
            continue;
        }
        service::add_grade(
            &mut store,
            student_id,
            course.id,
            NewGradeItem {
                item_type: item_type.to_string(),
                title: title.to_string(),
                score,
                max_score,
                weight,
            },
        )
        .await?;
    }

    let chemistry = store
        .course_by_code(student_id, "CHEM110")
        .await?
        .context("seed course CHEM110 missing")?;
    let exam_date = Utc::now().date_naive() + chrono::Duration::days(5);
    let has_exam = !store.exams_from(student_id, Utc::now().date_naive()).await?.is_empty();
    if !has_exam {
        service::add_event(
            &mut store,
            student_id,
            NewEvent {
                course_id: Some(chemistry.id),
                title: "Chemistry final".to_string(),
                start_date: exam_date,
                end_date: exam_date,
                start_time: NaiveTime::from_hms_opt(9, 0, 0).context("invalid time")?,
                end_time: NaiveTime::from_hms_opt(11, 0, 0).context("invalid time")?,
                event_type: EventType::Exam,
            },
        )
        .await?;
    }

    store.commit().await?;
    Ok(student_id)
}

/// Imports grade items for one student. Each row goes through the regular grade
/// command, so marks, finalization and notes cascade as they would interactively.
pub async fn import_csv(
    pool: &PgPool,
    student_id: Uuid,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        course_code: String,
        item_type: String,
        title: String,
        score: f64,
        max_score: f64,
        weight: f64,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut store = PgStore::begin(pool).await?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed row {}", line + 1))?;
        let course = store
            .course_by_code(student_id, &row.course_code)
            .await?
            .ok_or(TrackerError::NotFound("course"))
            .with_context(|| format!("row {}: course {}", line + 1, row.course_code))?;

        service::add_grade(
            &mut store,
            student_id,
            course.id,
            NewGradeItem {
                item_type: row.item_type,
                title: row.title,
                score: row.score,
                max_score: row.max_score,
                weight: row.weight,
            },
        )
        .await
        .with_context(|| format!("row {}: {}", line + 1, row.course_code))?;
        inserted += 1;
    }

    store.commit().await?;
    Ok(inserted)
}

/// Display names for a student, used by the markdown report.
pub async fn student_name(pool: &PgPool, student_id: Uuid) -> anyhow::Result<Option<String>> {
    let row = sqlx::query("SELECT full_name FROM academic_standing.students WHERE id = $1")
        .bind(student_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| row.get("full_name")))
}
