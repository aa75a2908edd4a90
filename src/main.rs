use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod advisory;
mod config;
mod db;
mod error;
mod feedback;
mod finalize;
mod grades;
#[cfg(test)]
mod memory;
mod models;
mod planner;
mod record;
mod report;
mod risk;
mod service;
mod store;

use crate::config::Config;
use crate::db::PgStore;
use crate::models::{
    EventPatch, EventType, GradeItemPatch, NewEvent, NewGradeItem, NewTask, PlannerTask, TaskPatch,
    TaskSource,
};
use crate::store::CourseStore;

#[derive(Parser)]
#[command(name = "academic-standing")]
#[command(about = "Grade, standing and study planner tracker for Group Scholar students", long_about = None)]
struct Cli {
    /// Student the command acts for
    #[arg(long, global = true)]
    student: Option<Uuid>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo student with courses, grades and an exam
    Seed,
    /// Import grade items from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Add, edit or delete grade items
    #[command(subcommand)]
    Grade(GradeCommand),
    /// Mark a course as finished
    Finalize {
        #[arg(long)]
        course: Uuid,
    },
    /// Show the academic record, course statuses and semester projection
    Standing,
    /// Refresh and list advisory notes
    Notes,
    #[command(subcommand)]
    Task(TaskCommand),
    #[command(subcommand)]
    Event(EventCommand),
    /// Study plan generation and review
    #[command(subcommand)]
    Plan(PlanCommand),
    /// Generate a markdown standing report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum GradeCommand {
    Add {
        #[arg(long)]
        course: Uuid,
        #[arg(long, default_value = "quiz")]
        item_type: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        score: f64,
        #[arg(long)]
        max_score: f64,
        #[arg(long)]
        weight: f64,
    },
    #[command(group(
        ArgGroup::new("fields")
            .args(["item_type", "title", "score", "max_score", "weight"])
            .multiple(true)
            .required(true)
    ))]
    Edit {
        #[arg(long)]
        item: Uuid,
        #[arg(long)]
        item_type: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        score: Option<f64>,
        #[arg(long)]
        max_score: Option<f64>,
        #[arg(long)]
        weight: Option<f64>,
    },
    Delete {
        #[arg(long)]
        item: Uuid,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Add a student-authored task
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long, default_value_t = 3)]
        priority: i32,
        #[arg(long)]
        course: Option<Uuid>,
    },
    /// Complete a task (or reopen it with --undo)
    Complete {
        #[arg(long)]
        task: Uuid,
        #[arg(long)]
        undo: bool,
    },
    #[command(group(ArgGroup::new("course_choice").args(["course", "no_course"])))]
    Edit {
        #[arg(long)]
        task: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        priority: Option<i32>,
        #[arg(long)]
        course: Option<Uuid>,
        /// Detach the task from its course
        #[arg(long)]
        no_course: bool,
    },
    Delete {
        #[arg(long)]
        task: Uuid,
    },
}

#[derive(Subcommand)]
enum EventCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value = "09:00:00")]
        start_time: NaiveTime,
        #[arg(long, default_value = "10:00:00")]
        end_time: NaiveTime,
        #[arg(long = "type", default_value = "other")]
        event_type: EventType,
        #[arg(long)]
        course: Option<Uuid>,
    },
    #[command(group(ArgGroup::new("course_choice").args(["course", "no_course"])))]
    Edit {
        #[arg(long)]
        event: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        start_time: Option<NaiveTime>,
        #[arg(long)]
        end_time: Option<NaiveTime>,
        #[arg(long = "type")]
        event_type: Option<EventType>,
        #[arg(long)]
        course: Option<Uuid>,
        /// Detach the event from its course
        #[arg(long)]
        no_course: bool,
    },
    Delete {
        #[arg(long)]
        event: Uuid,
    },
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Generate review tasks for every in-progress course
    Generate {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Add the single most useful next task
    Suggest {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show app and student plans side by side
    Compare {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Critique the student's plan for a day
    Feedback {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Events and tasks for one day
    Day {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn course_change(course: Option<Uuid>, no_course: bool) -> Option<Option<Uuid>> {
    if no_course {
        Some(None)
    } else {
        course.map(Some)
    }
}

fn require_student(student: Option<Uuid>) -> anyhow::Result<Uuid> {
    student.context("--student <uuid> is required for this command")
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_mark(mark: Option<f64>) -> String {
    mark.map_or_else(|| "no mark".to_string(), |mark| format!("{mark:.2}"))
}

fn print_tasks(label: &str, tasks: &[PlannerTask], names: &HashMap<Uuid, &str>) {
    println!("{label}:");
    if tasks.is_empty() {
        println!("  (none)");
    }
    for task in tasks {
        let course = task
            .course_id
            .and_then(|id| names.get(&id).copied())
            .unwrap_or("general");
        let check = if task.completed { "x" } else { " " };
        println!(
            "  [{check}] {} ({course}, priority {}) {}",
            task.title, task.priority, task.id
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let student_id = db::seed(&pool).await?;
            println!("Seed data inserted for student {student_id}.");
        }
        Commands::Import { csv } => {
            let student_id = require_student(cli.student)?;
            let inserted = db::import_csv(&pool, student_id, &csv).await?;
            info!(%student_id, inserted, "grade import finished");
            println!("Inserted {inserted} grade items from {}.", csv.display());
        }
        Commands::Grade(command) => {
            let student_id = require_student(cli.student)?;
            let mut store = PgStore::begin(&pool).await?;
            let change = match command {
                GradeCommand::Add {
                    course,
                    item_type,
                    title,
                    score,
                    max_score,
                    weight,
                } => {
                    let item = NewGradeItem {
                        item_type,
                        title,
                        score,
                        max_score,
                        weight,
                    };
                    service::add_grade(&mut store, student_id, course, item).await?
                }
                GradeCommand::Edit {
                    item,
                    item_type,
                    title,
                    score,
                    max_score,
                    weight,
                } => {
                    let patch = GradeItemPatch {
                        item_type,
                        title,
                        score,
                        max_score,
                        weight,
                    };
                    service::update_grade(&mut store, student_id, item, &patch).await?
                }
                GradeCommand::Delete { item } => {
                    service::delete_grade(&mut store, student_id, item).await?
                }
            };
            store.commit().await?;

            if cli.json {
                print_json(&change)?;
            } else {
                if let Some(item) = &change.item {
                    println!("Saved grade item {} ({}).", item.title, item.id);
                }
                println!("Course mark: {}.", format_mark(change.mark));
                if let Some(outcome) = &change.finalized {
                    let verdict = if outcome.passed == Some(true) { "passed" } else { "failed" };
                    println!("Course complete and finalized: {verdict}.");
                }
            }
        }
        Commands::Finalize { course } => {
            let student_id = require_student(cli.student)?;
            let mut store = PgStore::begin(&pool).await?;
            let outcome = service::finalize_course(&mut store, student_id, course).await?;
            store.commit().await?;

            if cli.json {
                print_json(&outcome)?;
            } else if outcome.already {
                println!("Course was already finalized.");
            } else {
                let verdict = if outcome.passed == Some(true) { "passed" } else { "failed" };
                println!(
                    "Course finalized at {}: {verdict}.",
                    format_mark(outcome.mark)
                );
            }
        }
        Commands::Standing => {
            let student_id = require_student(cli.student)?;
            let mut store = PgStore::begin(&pool).await?;
            let standing = service::standing(&mut store, student_id).await?;
            store.commit().await?;

            if cli.json {
                print_json(&standing)?;
            } else {
                let record = &standing.record;
                println!(
                    "CGPA {:.2} ({:.2}%), {:.0} credits completed, {:.0} carried.",
                    record.cgpa,
                    record.cumulative_percent,
                    record.total_credits_completed,
                    record.total_credits_carried
                );
                if let Some(semester) = &standing.semester {
                    println!(
                        "Semester GPA {:.2}, projected CGPA {:.2}.",
                        semester.semester_gpa, semester.projected_cgpa
                    );
                }
                for status in &standing.courses {
                    println!(
                        "- {} {}: {} {} ({}, {})",
                        status.course_code,
                        status.course_name,
                        format_mark(status.mark),
                        status.letter.unwrap_or("-"),
                        status.status.label(),
                        status.state.label()
                    );
                }
            }
        }
        Commands::Notes => {
            let student_id = require_student(cli.student)?;
            let mut store = PgStore::begin(&pool).await?;
            let notes = service::list_notes(&mut store, student_id).await?;
            store.commit().await?;

            if cli.json {
                print_json(&notes)?;
            } else if notes.is_empty() {
                println!("No advisory notes.");
            } else {
                for note in &notes {
                    println!("{}\n", note.content);
                }
            }
        }
        Commands::Task(command) => {
            let student_id = require_student(cli.student)?;
            let mut store = PgStore::begin(&pool).await?;
            match command {
                TaskCommand::Add {
                    title,
                    due,
                    priority,
                    course,
                } => {
                    let draft = NewTask::new(
                        course,
                        &title,
                        due.unwrap_or_else(today),
                        priority,
                        TaskSource::Student,
                    );
                    let task = service::add_task(&mut store, student_id, draft).await?;
                    store.commit().await?;

                    if cli.json {
                        print_json(&task)?;
                    } else {
                        println!("Added task {} due {} ({}).", task.title, task.due_date, task.id);
                    }
                }
                TaskCommand::Edit {
                    task,
                    title,
                    due,
                    priority,
                    course,
                    no_course,
                } => {
                    let patch = TaskPatch {
                        course_id: course_change(course, no_course),
                        title,
                        due_date: due,
                        priority,
                    };
                    let task = service::update_task(&mut store, student_id, task, &patch).await?;
                    store.commit().await?;

                    if cli.json {
                        print_json(&task)?;
                    } else {
                        println!("Updated task {} due {} (priority {}).", task.title, task.due_date, task.priority);
                    }
                }
                TaskCommand::Delete { task } => {
                    service::delete_task(&mut store, student_id, task).await?;
                    store.commit().await?;
                    println!("Task {task} deleted.");
                }
                TaskCommand::Complete { task, undo } => {
                    let completion =
                        service::complete_task(&mut store, student_id, task, !undo).await?;
                    store.commit().await?;

                    if cli.json {
                        print_json(&completion)?;
                    } else {
                        let state = if completion.task.completed { "completed" } else { "reopened" };
                        println!("Task {} {state}.", completion.task.title);
                        if let Some(next) = &completion.suggested {
                            println!("Next up: {} (priority {}).", next.task.title, next.task.priority);
                        }
                    }
                }
            }
        }
        Commands::Event(EventCommand::Edit {
            event,
            title,
            start,
            end,
            start_time,
            end_time,
            event_type,
            course,
            no_course,
        }) => {
            let student_id = require_student(cli.student)?;
            let mut store = PgStore::begin(&pool).await?;
            let patch = EventPatch {
                course_id: course_change(course, no_course),
                title,
                start_date: start,
                end_date: end,
                start_time,
                end_time,
                event_type,
            };
            let event = service::update_event(&mut store, student_id, event, &patch).await?;
            store.commit().await?;

            if cli.json {
                print_json(&event)?;
            } else {
                println!(
                    "Updated {} event {} on {}.",
                    event.event_type, event.title, event.start_date
                );
            }
        }
        Commands::Event(EventCommand::Delete { event }) => {
            let student_id = require_student(cli.student)?;
            let mut store = PgStore::begin(&pool).await?;
            service::delete_event(&mut store, student_id, event).await?;
            store.commit().await?;
            println!("Event {event} deleted.");
        }
        Commands::Event(EventCommand::Add {
            title,
            start,
            end,
            start_time,
            end_time,
            event_type,
            course,
        }) => {
            let student_id = require_student(cli.student)?;
            let mut store = PgStore::begin(&pool).await?;
            let event = NewEvent {
                course_id: course,
                title,
                start_date: start,
                end_date: end.unwrap_or(start),
                start_time,
                end_time,
                event_type,
            };
            let event = service::add_event(&mut store, student_id, event).await?;
            store.commit().await?;

            if cli.json {
                print_json(&event)?;
            } else {
                println!(
                    "Added {} event {} on {} ({}).",
                    event.event_type, event.title, event.start_date, event.id
                );
            }
        }
        Commands::Plan(command) => {
            let student_id = require_student(cli.student)?;
            let mut store = PgStore::begin(&pool).await?;
            match command {
                PlanCommand::Generate { from, to } => {
                    let plan = service::generate_plan(
                        &mut store,
                        student_id,
                        from.unwrap_or_else(today),
                        to,
                    )
                    .await?;
                    let courses = store.list_courses(student_id).await?;
                    store.commit().await?;

                    if cli.json {
                        print_json(&plan)?;
                    } else {
                        let names = feedback::course_names(&courses);
                        println!("Generated {} tasks for {}.", plan.generated.len(), plan.date);
                        print_tasks("New tasks", &plan.generated, &names);
                        for exam in &plan.exams {
                            let course = names.get(&exam.course_id).copied().unwrap_or("course");
                            println!("Exam in range: {course} on {}.", exam.date);
                        }
                    }
                }
                PlanCommand::Suggest { date } => {
                    let suggestion =
                        service::suggest_next(&mut store, student_id, date.unwrap_or_else(today))
                            .await?;
                    store.commit().await?;

                    if cli.json {
                        print_json(&suggestion)?;
                    } else {
                        match suggestion {
                            Some(next) => println!(
                                "Suggested {} (priority {}, {:?}).",
                                next.task.title, next.task.priority, next.kind
                            ),
                            None => println!("Nothing new to suggest for this day."),
                        }
                    }
                }
                PlanCommand::Compare { date } => {
                    let comparison =
                        service::compare_plans(&mut store, student_id, date.unwrap_or_else(today))
                            .await?;
                    let courses = store.list_courses(student_id).await?;
                    store.commit().await?;

                    if cli.json {
                        print_json(&comparison)?;
                    } else {
                        let names = feedback::course_names(&courses);
                        println!("Plans for {}:", comparison.date);
                        print_tasks("App plan", &comparison.app_plan, &names);
                        print_tasks("Your plan", &comparison.student_plan, &names);
                    }
                }
                PlanCommand::Day { date } => {
                    let view =
                        service::daily_view(&mut store, student_id, date.unwrap_or_else(today))
                            .await?;
                    let courses = store.list_courses(student_id).await?;
                    store.commit().await?;

                    if cli.json {
                        print_json(&view)?;
                    } else {
                        let names = feedback::course_names(&courses);
                        println!("Day {}:", view.date);
                        println!("Events:");
                        if view.events.is_empty() {
                            println!("  (none)");
                        }
                        for event in &view.events {
                            println!(
                                "  {}-{} {} [{}] {}",
                                event.start_time.format("%H:%M"),
                                event.end_time.format("%H:%M"),
                                event.title,
                                event.event_type,
                                event.id
                            );
                        }
                        print_tasks("Tasks", &view.tasks, &names);
                    }
                }
                PlanCommand::Feedback { date } => {
                    let review =
                        service::plan_feedback(&mut store, student_id, date.unwrap_or_else(today))
                            .await?;
                    let courses = store.list_courses(student_id).await?;
                    store.commit().await?;

                    if cli.json {
                        print_json(&review)?;
                    } else {
                        let names = feedback::course_names(&courses);
                        let order: Vec<&str> = review
                            .recommended_order
                            .iter()
                            .filter_map(|id| names.get(id).copied())
                            .collect();
                        println!("Feedback for {}:", review.date);
                        println!("{}", review.summary);
                        if !order.is_empty() {
                            println!("Recommended order: {}.", order.join(", "));
                        }
                        for detail in &review.details {
                            println!("\n{}\n{}", detail.title, detail.body);
                        }
                    }
                }
            }
        }
        Commands::Report { out } => {
            let student_id = require_student(cli.student)?;
            let mut store = PgStore::begin(&pool).await?;
            let notes = service::list_notes(&mut store, student_id).await?;
            let standing = service::standing(&mut store, student_id).await?;
            store.commit().await?;

            let label = db::student_name(&pool, student_id)
                .await?
                .unwrap_or_else(|| student_id.to_string());
            let report = report::build_report(&label, today(), &standing, &notes);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
