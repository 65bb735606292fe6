use anyhow::Context;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::approval::ReviewAction;
use crate::certificate;
use crate::honors::StudentEvaluation;
use crate::models::{
    AcademicLevel, ApprovalState, Certificate, GradeRecord, HonorResult, HonorType, ReviewerRole,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let honor_types = vec![
        ("With Highest Honors", AcademicLevel::Elementary, 98.0, 93.0),
        ("With High Honors", AcademicLevel::Elementary, 95.0, 90.0),
        ("With Honors", AcademicLevel::Elementary, 90.0, 85.0),
        ("With Highest Honors", AcademicLevel::JuniorHigh, 98.0, 93.0),
        ("With High Honors", AcademicLevel::JuniorHigh, 95.0, 90.0),
        ("With Honors", AcademicLevel::JuniorHigh, 90.0, 85.0),
        ("With Highest Honors", AcademicLevel::SeniorHigh, 98.0, 93.0),
        ("With High Honors", AcademicLevel::SeniorHigh, 95.0, 90.0),
        ("With Honors", AcademicLevel::SeniorHigh, 90.0, 85.0),
        ("Summa Cum Laude", AcademicLevel::College, 97.0, 92.0),
        ("Magna Cum Laude", AcademicLevel::College, 94.0, 88.0),
        ("Cum Laude", AcademicLevel::College, 91.0, 85.0),
    ];

    for (name, level, min_average, grade_floor) in honor_types {
        sqlx::query(
            r#"
            INSERT INTO honor_roll.honor_types (id, name, level, min_average, grade_floor)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name, level) DO UPDATE
            SET min_average = EXCLUDED.min_average, grade_floor = EXCLUDED.grade_floor
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(level.as_str())
        .bind(min_average)
        .bind(grade_floor)
        .execute(pool)
        .await?;
    }

    let students = vec![
        (
            Uuid::parse_str("7a1f0c7e-55d4-4b8a-9f6a-1f2d3c4b5a69")?,
            "Mara Santos",
            "mara.santos@example.edu",
            AcademicLevel::JuniorHigh,
            "Sampaguita",
        ),
        (
            Uuid::parse_str("2b9e4d11-8c3f-4f5a-b6d7-0e1f2a3b4c5d")?,
            "Ben Reyes",
            "ben.reyes@example.edu",
            AcademicLevel::JuniorHigh,
            "Sampaguita",
        ),
        (
            Uuid::parse_str("c4d5e6f7-1829-4a3b-8c7d-6e5f4a3b2c1d")?,
            "Lia Domingo",
            "lia.domingo@example.edu",
            AcademicLevel::SeniorHigh,
            "STEM 11-A",
        ),
    ];

    for (id, name, email, level, section) in students {
        sqlx::query(
            r#"
            INSERT INTO honor_roll.students (id, full_name, email, level, section)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, level = EXCLUDED.level,
                section = EXCLUDED.section
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(level.as_str())
        .bind(section)
        .execute(pool)
        .await?;
    }

    let grades = vec![
        ("seed-g001", "mara.santos@example.edu", "Mathematics", 1, 96.0),
        ("seed-g002", "mara.santos@example.edu", "Science", 1, 94.0),
        ("seed-g003", "mara.santos@example.edu", "Mathematics", 2, 97.0),
        ("seed-g004", "mara.santos@example.edu", "Science", 2, 95.0),
        ("seed-g005", "ben.reyes@example.edu", "Mathematics", 1, 88.0),
        ("seed-g006", "ben.reyes@example.edu", "Science", 1, 84.0),
        ("seed-g007", "lia.domingo@example.edu", "Calculus", 1, 92.0),
        ("seed-g008", "lia.domingo@example.edu", "Physics", 1, 90.0),
    ];

    for (source_key, email, subject, period, score) in grades {
        let student_id: Uuid =
            sqlx::query("SELECT id FROM honor_roll.students WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?
                .get("id");

        sqlx::query(
            r#"
            INSERT INTO honor_roll.grades
            (id, student_id, school_year, subject, period, score, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind("2025-2026")
        .bind(subject)
        .bind(period)
        .bind(score)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_grades(
    pool: &PgPool,
    level: AcademicLevel,
    school_year: &str,
    email: Option<&str>,
) -> anyhow::Result<Vec<GradeRecord>> {
    let mut query = String::from(
        "SELECT st.id as student_id, st.full_name, st.email, st.level, \
         g.school_year, g.subject, g.period, g.score \
         FROM honor_roll.grades g \
         JOIN honor_roll.students st ON st.id = g.student_id \
         WHERE st.level = $1 AND g.school_year = $2",
    );

    if email.is_some() {
        query.push_str(" AND st.email = $3");
    }

    let mut rows = sqlx::query(&query).bind(level.as_str()).bind(school_year);
    if let Some(value) = email {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut grades = Vec::new();

    for row in records {
        let level: String = row.get("level");
        grades.push(GradeRecord {
            student_id: row.get("student_id"),
            student_name: row.get("full_name"),
            student_email: row.get("email"),
            level: AcademicLevel::parse(&level)?,
            school_year: row.get("school_year"),
            subject: row.get("subject"),
            period: row.get("period"),
            score: row.get("score"),
        });
    }

    Ok(grades)
}

pub async fn fetch_honor_types(
    pool: &PgPool,
    level: AcademicLevel,
) -> anyhow::Result<Vec<HonorType>> {
    let rows = sqlx::query(
        "SELECT id, name, level, min_average, grade_floor \
         FROM honor_roll.honor_types WHERE level = $1",
    )
    .bind(level.as_str())
    .fetch_all(pool)
    .await?;

    let mut types = Vec::new();
    for row in rows {
        let level: String = row.get("level");
        types.push(HonorType {
            id: row.get("id"),
            name: row.get("name"),
            level: AcademicLevel::parse(&level)?,
            min_average: row.get("min_average"),
            grade_floor: row.get("grade_floor"),
        });
    }

    Ok(types)
}

/// Records a pending honor result for every qualifying (student, honor type)
/// pair. The unique index on (student, honor type, school year, level) makes
/// re-runs idempotent; returns the number of new rows.
pub async fn record_results(
    pool: &PgPool,
    level: AcademicLevel,
    evaluations: &[StudentEvaluation],
) -> anyhow::Result<usize> {
    let mut inserted = 0usize;

    for evaluation in evaluations {
        for honor in &evaluation.qualified {
            let result = sqlx::query(
                r#"
                INSERT INTO honor_roll.honor_results
                (id, student_id, honor_type_id, level, school_year, gpa,
                 approval_state, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
                ON CONFLICT (student_id, honor_type_id, school_year, level) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(evaluation.student_id)
            .bind(honor.honor_type_id)
            .bind(level.as_str())
            .bind(&evaluation.school_year)
            .bind(evaluation.gpa)
            .bind(Utc::now().naive_utc())
            .execute(pool)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
            }
        }
    }

    Ok(inserted)
}

pub async fn fetch_result_state(pool: &PgPool, result_id: Uuid) -> anyhow::Result<ApprovalState> {
    let row = sqlx::query("SELECT approval_state FROM honor_roll.honor_results WHERE id = $1")
        .bind(result_id)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("no honor result with id {result_id}"))?;

    let state: String = row.get("approval_state");
    ApprovalState::parse(&state)
}

/// Applies a reviewer decision. The pure state machine validates the
/// transition first; the update then re-checks `approval_state = 'pending'`
/// so a decision raced by another reviewer fails instead of overwriting.
pub async fn decide_result(
    pool: &PgPool,
    result_id: Uuid,
    action: &ReviewAction,
    role: ReviewerRole,
) -> anyhow::Result<ApprovalState> {
    let current = fetch_result_state(pool, result_id).await?;
    let next = crate::approval::apply_decision(current, action, role)?;

    let reason = match action {
        ReviewAction::Approve => None,
        ReviewAction::Return { reason } => Some(reason.trim().to_string()),
    };

    let result = sqlx::query(
        r#"
        UPDATE honor_roll.honor_results
        SET approval_state = $2, decided_by = $3, decision_reason = $4, decided_at = $5
        WHERE id = $1 AND approval_state = 'pending'
        "#,
    )
    .bind(result_id)
    .bind(next.as_str())
    .bind(role.as_str())
    .bind(reason)
    .bind(Utc::now().naive_utc())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("honor result {result_id} was decided by someone else first");
    }

    Ok(next)
}

pub async fn fetch_results(
    pool: &PgPool,
    school_year: &str,
    level: Option<AcademicLevel>,
) -> anyhow::Result<Vec<HonorResult>> {
    let mut query = String::from(
        "SELECT r.id, r.student_id, st.full_name, st.email, r.honor_type_id, \
         ht.name as honor_name, r.level, r.school_year, r.gpa, r.approval_state, \
         r.decided_by, r.decision_reason, r.created_at, r.decided_at \
         FROM honor_roll.honor_results r \
         JOIN honor_roll.students st ON st.id = r.student_id \
         JOIN honor_roll.honor_types ht ON ht.id = r.honor_type_id \
         WHERE r.school_year = $1",
    );

    if level.is_some() {
        query.push_str(" AND r.level = $2");
    }
    query.push_str(" ORDER BY r.gpa DESC");

    let mut rows = sqlx::query(&query).bind(school_year);
    if let Some(value) = level {
        rows = rows.bind(value.as_str());
    }

    let records = rows.fetch_all(pool).await?;
    let mut results = Vec::new();

    for row in records {
        let level: String = row.get("level");
        let state: String = row.get("approval_state");
        results.push(HonorResult {
            id: row.get("id"),
            student_id: row.get("student_id"),
            student_name: row.get("full_name"),
            student_email: row.get("email"),
            honor_type_id: row.get("honor_type_id"),
            honor_name: row.get("honor_name"),
            level: AcademicLevel::parse(&level)?,
            school_year: row.get("school_year"),
            gpa: row.get("gpa"),
            state: ApprovalState::parse(&state)?,
            decided_by: row.get("decided_by"),
            decision_reason: row.get("decision_reason"),
            created_at: row.get("created_at"),
            decided_at: row.get("decided_at"),
        });
    }

    Ok(results)
}

/// Issues certificates for approved results in the school year that do not
/// have one yet. Serial sequence continues from the highest serial already
/// issued for the year; the unique index on serial_no is the backstop.
pub async fn issue_certificates(
    pool: &PgPool,
    school_year: &str,
    sign: bool,
) -> anyhow::Result<Vec<Certificate>> {
    let pending_rows = sqlx::query(
        r#"
        SELECT r.id, st.full_name, ht.name as honor_name
        FROM honor_roll.honor_results r
        JOIN honor_roll.students st ON st.id = r.student_id
        JOIN honor_roll.honor_types ht ON ht.id = r.honor_type_id
        LEFT JOIN honor_roll.certificates c ON c.honor_result_id = r.id
        WHERE r.school_year = $1 AND r.approval_state = 'approved' AND c.id IS NULL
        ORDER BY r.gpa DESC
        "#,
    )
    .bind(school_year)
    .fetch_all(pool)
    .await?;

    let serial_rows = sqlx::query(
        "SELECT c.serial_no FROM honor_roll.certificates c \
         JOIN honor_roll.honor_results r ON r.id = c.honor_result_id \
         WHERE r.school_year = $1",
    )
    .bind(school_year)
    .fetch_all(pool)
    .await?;

    let mut sequence = serial_rows
        .iter()
        .filter_map(|row| {
            let serial: String = row.get("serial_no");
            certificate::serial_sequence(&serial, school_year)
        })
        .max()
        .unwrap_or(0);

    let issued_on = Utc::now().date_naive();
    let mut issued = Vec::new();

    for row in pending_rows {
        sequence += 1;
        let cert = Certificate {
            id: Uuid::new_v4(),
            honor_result_id: row.get("id"),
            student_name: row.get("full_name"),
            honor_name: row.get("honor_name"),
            serial_no: certificate::serial_number(school_year, sequence),
            signed: sign,
            issued_on,
        };

        sqlx::query(
            r#"
            INSERT INTO honor_roll.certificates
            (id, honor_result_id, serial_no, signed, issued_on)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(cert.id)
        .bind(cert.honor_result_id)
        .bind(&cert.serial_no)
        .bind(cert.signed)
        .bind(cert.issued_on)
        .execute(pool)
        .await?;

        issued.push(cert);
    }

    Ok(issued)
}

pub async fn fetch_certificates(
    pool: &PgPool,
    school_year: &str,
) -> anyhow::Result<Vec<Certificate>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.honor_result_id, st.full_name, ht.name as honor_name,
               c.serial_no, c.signed, c.issued_on
        FROM honor_roll.certificates c
        JOIN honor_roll.honor_results r ON r.id = c.honor_result_id
        JOIN honor_roll.students st ON st.id = r.student_id
        JOIN honor_roll.honor_types ht ON ht.id = r.honor_type_id
        WHERE r.school_year = $1
        ORDER BY c.serial_no
        "#,
    )
    .bind(school_year)
    .fetch_all(pool)
    .await?;

    let mut certificates = Vec::new();
    for row in rows {
        certificates.push(Certificate {
            id: row.get("id"),
            honor_result_id: row.get("honor_result_id"),
            student_name: row.get("full_name"),
            honor_name: row.get("honor_name"),
            serial_no: row.get("serial_no"),
            signed: row.get("signed"),
            issued_on: row.get("issued_on"),
        });
    }

    Ok(certificates)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        level: String,
        section: String,
        school_year: String,
        subject: String,
        period: i32,
        score: f64,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let level = AcademicLevel::parse(&row.level)?;
        if !(0.0..=100.0).contains(&row.score) {
            anyhow::bail!(
                "score {} for {} is outside 0-100",
                row.score,
                row.email
            );
        }
        if row.period < 1 || row.period > level.periods_per_year() {
            anyhow::bail!(
                "period {} for {} is outside 1-{} for {}",
                row.period,
                row.email,
                level.periods_per_year(),
                level.as_str()
            );
        }

        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO honor_roll.students
            (id, full_name, email, level, section)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, level = EXCLUDED.level,
                section = EXCLUDED.section
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(&row.email)
        .bind(level.as_str())
        .bind(&row.section)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO honor_roll.grades
            (id, student_id, school_year, subject, period, score, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(&row.school_year)
        .bind(&row.subject)
        .bind(row.period)
        .bind(row.score)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
