use std::fmt::Write;

use crate::models::{AcademicLevel, ApprovalState, Certificate, HonorResult};

#[derive(Debug, Clone)]
pub struct HonorSummary {
    pub honor_name: String,
    pub count: usize,
    pub avg_gpa: f64,
}

pub fn summarize_by_honor(results: &[HonorResult]) -> Vec<HonorSummary> {
    let mut map: std::collections::HashMap<String, (usize, f64)> =
        std::collections::HashMap::new();

    for result in results {
        let entry = map.entry(result.honor_name.clone()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += result.gpa;
    }

    let mut summaries: Vec<HonorSummary> = map
        .into_iter()
        .map(|(honor_name, (count, total_gpa))| HonorSummary {
            honor_name,
            count,
            avg_gpa: if count == 0 { 0.0 } else { total_gpa / count as f64 },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

pub fn build_report(
    level: Option<AcademicLevel>,
    school_year: &str,
    results: &[HonorResult],
    certificates: &[Certificate],
) -> String {
    let mut output = String::new();
    let scope_label = level.map(|l| l.as_str()).unwrap_or("all levels");

    let _ = writeln!(output, "# Honor Roll Report");
    let _ = writeln!(
        output,
        "Generated for {} (school year {})",
        scope_label, school_year
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Honor Mix");

    let summaries = summarize_by_honor(results);
    if summaries.is_empty() {
        let _ = writeln!(output, "No honor results recorded for this school year.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} students (avg GPA {:.2})",
                summary.honor_name, summary.count, summary.avg_gpa
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Approved Honors");

    let approved: Vec<&HonorResult> = results
        .iter()
        .filter(|r| r.state == ApprovalState::Approved)
        .collect();
    if approved.is_empty() {
        let _ = writeln!(output, "No approved honors yet.");
    } else {
        for result in approved.iter() {
            let _ = writeln!(
                output,
                "- {} ({}) — {} at GPA {:.2}, approved by {}",
                result.student_name,
                result.student_email,
                result.honor_name,
                result.gpa,
                result.decided_by.as_deref().unwrap_or("unknown")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Awaiting Review");

    let pending: Vec<&HonorResult> = results
        .iter()
        .filter(|r| r.state == ApprovalState::Pending)
        .collect();
    if pending.is_empty() {
        let _ = writeln!(output, "No results awaiting review.");
    } else {
        for result in pending.iter() {
            let _ = writeln!(
                output,
                "- {} — {} at GPA {:.2} (result {})",
                result.student_name, result.honor_name, result.gpa, result.id
            );
        }
    }

    let returned: Vec<&HonorResult> = results
        .iter()
        .filter(|r| r.state == ApprovalState::Returned)
        .collect();
    if !returned.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Returned");
        for result in returned.iter() {
            let _ = writeln!(
                output,
                "- {} — {}: {}",
                result.student_name,
                result.honor_name,
                result.decision_reason.as_deref().unwrap_or("no reason recorded")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Certificates");

    if certificates.is_empty() {
        let _ = writeln!(output, "No certificates issued for this school year.");
    } else {
        for cert in certificates.iter() {
            let _ = writeln!(
                output,
                "- {} — {} for {} ({}, issued {})",
                cert.serial_no,
                cert.honor_name,
                cert.student_name,
                if cert.signed { "signed" } else { "draft" },
                cert.issued_on
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn result(name: &str, honor: &str, gpa: f64, state: ApprovalState) -> HonorResult {
        HonorResult {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            student_name: name.to_string(),
            student_email: format!("{}@example.edu", name.to_lowercase().replace(' ', ".")),
            honor_type_id: Uuid::new_v4(),
            honor_name: honor.to_string(),
            level: AcademicLevel::JuniorHigh,
            school_year: "2025-2026".to_string(),
            gpa,
            state,
            decided_by: match state {
                ApprovalState::Pending => None,
                _ => Some("chairperson".to_string()),
            },
            decision_reason: match state {
                ApprovalState::Returned => Some("needs re-check".to_string()),
                _ => None,
            },
            created_at: Utc::now().naive_utc(),
            decided_at: None,
        }
    }

    #[test]
    fn summary_counts_and_averages_per_honor() {
        let results = vec![
            result("Mara Santos", "With Honors", 92.0, ApprovalState::Approved),
            result("Ben Reyes", "With Honors", 90.0, ApprovalState::Pending),
            result("Lia Domingo", "With High Honors", 96.0, ApprovalState::Pending),
        ];

        let summaries = summarize_by_honor(&results);
        assert_eq!(summaries[0].honor_name, "With Honors");
        assert_eq!(summaries[0].count, 2);
        assert!((summaries[0].avg_gpa - 91.0).abs() < 1e-9);
    }

    #[test]
    fn report_sections_cover_states_and_certificates() {
        let results = vec![
            result("Mara Santos", "With High Honors", 95.5, ApprovalState::Approved),
            result("Ben Reyes", "With Honors", 90.2, ApprovalState::Pending),
            result("Lia Domingo", "With Honors", 91.0, ApprovalState::Returned),
        ];
        let certificates = vec![Certificate {
            id: Uuid::new_v4(),
            honor_result_id: results[0].id,
            student_name: "Mara Santos".to_string(),
            honor_name: "With High Honors".to_string(),
            serial_no: "HR-2025-2026-000001".to_string(),
            signed: true,
            issued_on: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
        }];

        let report = build_report(
            Some(AcademicLevel::JuniorHigh),
            "2025-2026",
            &results,
            &certificates,
        );

        assert!(report.contains("# Honor Roll Report"));
        assert!(report.contains("approved by chairperson"));
        assert!(report.contains("## Awaiting Review"));
        assert!(report.contains("needs re-check"));
        assert!(report.contains("HR-2025-2026-000001"));
        assert!(report.contains("signed"));
    }

    #[test]
    fn empty_report_uses_fallback_lines() {
        let report = build_report(None, "2025-2026", &[], &[]);
        assert!(report.contains("all levels"));
        assert!(report.contains("No honor results recorded"));
        assert!(report.contains("No certificates issued"));
    }
}
