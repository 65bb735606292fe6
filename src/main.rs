use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod aggregate;
mod approval;
mod certificate;
mod db;
mod honors;
mod models;
mod report;

use models::{AcademicLevel, ReviewerRole};

#[derive(Parser)]
#[command(name = "honor-roll")]
#[command(about = "Honor qualification tracker for school registrars", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load honor types and realistic sample data
    Seed,
    /// Import grade rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Aggregate grades, match honor thresholds, and record pending results
    Evaluate {
        #[arg(long, value_enum)]
        level: AcademicLevel,
        #[arg(long)]
        school_year: String,
        /// Restrict to a single student by email
        #[arg(long)]
        student: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Approve a pending honor result
    Approve {
        #[arg(long)]
        result: Uuid,
        #[arg(long, value_enum)]
        role: ReviewerRole,
    },
    /// Return a pending honor result with a reason
    Return {
        #[arg(long)]
        result: Uuid,
        #[arg(long, value_enum)]
        role: ReviewerRole,
        #[arg(long)]
        reason: String,
    },
    /// Issue certificates for approved results that lack one
    Certificates {
        #[arg(long)]
        school_year: String,
        /// Mark newly issued certificates as signed
        #[arg(long, default_value_t = false)]
        sign: bool,
    },
    /// Generate a markdown honor-roll report
    Report {
        #[arg(long)]
        school_year: String,
        #[arg(long, value_enum)]
        level: Option<AcademicLevel>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} grade rows from {}.", csv.display());
        }
        Commands::Evaluate {
            level,
            school_year,
            student,
            json,
            limit,
        } => {
            let grades =
                db::fetch_grades(&pool, level, &school_year, student.as_deref()).await?;

            if grades.is_empty() {
                if let Some(email) = student {
                    println!("{email}: not qualified, reason: no grades.");
                } else {
                    println!(
                        "No grades recorded for {} in {}.",
                        level.as_str(),
                        school_year
                    );
                }
                return Ok(());
            }

            let aggregates = aggregate::aggregate_grades(&grades);
            let honor_types = db::fetch_honor_types(&pool, level).await?;
            let evaluations = honors::evaluate_students(&aggregates, &honor_types);
            let recorded = db::record_results(&pool, level, &evaluations).await?;
            tracing::info!(
                recorded,
                students = evaluations.len(),
                level = level.as_str(),
                "evaluation complete"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&evaluations)?);
                return Ok(());
            }

            println!(
                "Evaluated {} students by {} for {} ({} new pending results):",
                evaluations.len(),
                level.period_unit().label().to_lowercase(),
                school_year,
                recorded
            );
            for evaluation in evaluations.iter().take(limit) {
                match evaluation.best_honor() {
                    Some(honor) => println!(
                        "- {} ({}) GPA {:.2}, lowest {:.2}: {}",
                        evaluation.student_name,
                        evaluation.student_email,
                        evaluation.gpa,
                        evaluation.min_grade,
                        honor.honor_name
                    ),
                    None => println!(
                        "- {} ({}) GPA {:.2}: not qualified ({})",
                        evaluation.student_name,
                        evaluation.student_email,
                        evaluation.gpa,
                        evaluation.reasons.join("; ")
                    ),
                }
            }
        }
        Commands::Approve { result, role } => {
            let next =
                db::decide_result(&pool, result, &approval::ReviewAction::Approve, role).await?;
            println!("Result {result} is now {}.", next.as_str());
        }
        Commands::Return {
            result,
            role,
            reason,
        } => {
            let next = db::decide_result(
                &pool,
                result,
                &approval::ReviewAction::Return { reason },
                role,
            )
            .await?;
            println!("Result {result} is now {}.", next.as_str());
        }
        Commands::Certificates { school_year, sign } => {
            let issued = db::issue_certificates(&pool, &school_year, sign).await?;
            if issued.is_empty() {
                println!("No approved results waiting for certificates.");
            } else {
                println!("Issued {} certificates:", issued.len());
                for cert in issued.iter() {
                    println!(
                        "- {} — {} for {} ({})",
                        cert.serial_no,
                        cert.honor_name,
                        cert.student_name,
                        if cert.signed { "signed" } else { "draft" }
                    );
                }
            }
        }
        Commands::Report {
            school_year,
            level,
            out,
        } => {
            let results = db::fetch_results(&pool, &school_year, level).await?;
            let certificates = db::fetch_certificates(&pool, &school_year).await?;
            let report = report::build_report(level, &school_year, &results, &certificates);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
