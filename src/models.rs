use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::Serialize;
use uuid::Uuid;

/// Academic levels each carry their own grading-period structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicLevel {
    Elementary,
    JuniorHigh,
    SeniorHigh,
    College,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Quarter,
    Semester,
    Term,
}

impl AcademicLevel {
    pub fn period_unit(self) -> PeriodUnit {
        match self {
            AcademicLevel::Elementary | AcademicLevel::JuniorHigh => PeriodUnit::Quarter,
            AcademicLevel::SeniorHigh => PeriodUnit::Semester,
            AcademicLevel::College => PeriodUnit::Term,
        }
    }

    pub fn periods_per_year(self) -> i32 {
        match self.period_unit() {
            PeriodUnit::Quarter => 4,
            PeriodUnit::Semester => 2,
            PeriodUnit::Term => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AcademicLevel::Elementary => "elementary",
            AcademicLevel::JuniorHigh => "junior_high",
            AcademicLevel::SeniorHigh => "senior_high",
            AcademicLevel::College => "college",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "elementary" => Ok(AcademicLevel::Elementary),
            "junior_high" => Ok(AcademicLevel::JuniorHigh),
            "senior_high" => Ok(AcademicLevel::SeniorHigh),
            "college" => Ok(AcademicLevel::College),
            other => anyhow::bail!("unknown academic level '{other}'"),
        }
    }
}

impl PeriodUnit {
    pub fn label(self) -> &'static str {
        match self {
            PeriodUnit::Quarter => "Quarter",
            PeriodUnit::Semester => "Semester",
            PeriodUnit::Term => "Term",
        }
    }
}

/// One recorded score for a student in a subject and grading period.
#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub level: AcademicLevel,
    pub school_year: String,
    pub subject: String,
    pub period: i32,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodAggregate {
    pub period: i32,
    pub mean: f64,
    pub grade_count: usize,
}

/// Mean/min/max over a student's grade rows for one (level, school year).
#[derive(Debug, Clone, Serialize)]
pub struct GradeAggregate {
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub level: AcademicLevel,
    pub school_year: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub grade_count: usize,
    pub periods: Vec<PeriodAggregate>,
}

/// A named distinction with its qualification thresholds, scoped to a level.
#[derive(Debug, Clone)]
pub struct HonorType {
    pub id: Uuid,
    pub name: String,
    pub level: AcademicLevel,
    pub min_average: f64,
    pub grade_floor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Pending,
    Approved,
    Returned,
}

impl ApprovalState {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalState::Pending => "pending",
            ApprovalState::Approved => "approved",
            ApprovalState::Returned => "returned",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "pending" => Ok(ApprovalState::Pending),
            "approved" => Ok(ApprovalState::Approved),
            "returned" => Ok(ApprovalState::Returned),
            other => anyhow::bail!("unknown approval state '{other}'"),
        }
    }
}

/// Roles allowed to decide a pending honor result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReviewerRole {
    Chairperson,
    Principal,
}

impl ReviewerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewerRole::Chairperson => "chairperson",
            ReviewerRole::Principal => "principal",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HonorResult {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub honor_type_id: Uuid,
    pub honor_name: String,
    pub level: AcademicLevel,
    pub school_year: String,
    pub gpa: f64,
    pub state: ApprovalState,
    pub decided_by: Option<String>,
    pub decision_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub decided_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct Certificate {
    pub id: Uuid,
    pub honor_result_id: Uuid,
    pub student_name: String,
    pub honor_name: String,
    pub serial_no: String,
    pub signed: bool,
    pub issued_on: NaiveDate,
}
