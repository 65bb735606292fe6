use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{GradeAggregate, GradeRecord, PeriodAggregate};

struct Accumulator {
    student_name: String,
    student_email: String,
    level: crate::models::AcademicLevel,
    school_year: String,
    sum: f64,
    min: f64,
    max: f64,
    count: usize,
    by_period: HashMap<i32, (f64, usize)>,
}

/// Groups grade rows by student and computes mean/min/max overall plus a
/// per-period breakdown. Students with no rows simply do not appear; callers
/// treat absence as "no grades".
pub fn aggregate_grades(grades: &[GradeRecord]) -> Vec<GradeAggregate> {
    let mut accumulators: HashMap<Uuid, Accumulator> = HashMap::new();

    for grade in grades {
        let entry = accumulators
            .entry(grade.student_id)
            .or_insert_with(|| Accumulator {
                student_name: grade.student_name.clone(),
                student_email: grade.student_email.clone(),
                level: grade.level,
                school_year: grade.school_year.clone(),
                sum: 0.0,
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
                count: 0,
                by_period: HashMap::new(),
            });

        entry.sum += grade.score;
        entry.min = entry.min.min(grade.score);
        entry.max = entry.max.max(grade.score);
        entry.count += 1;

        let period = entry.by_period.entry(grade.period).or_insert((0.0, 0));
        period.0 += grade.score;
        period.1 += 1;
    }

    let mut aggregates: Vec<GradeAggregate> = accumulators
        .into_iter()
        .map(|(student_id, acc)| {
            let mut periods: Vec<PeriodAggregate> = acc
                .by_period
                .into_iter()
                .map(|(period, (sum, count))| PeriodAggregate {
                    period,
                    mean: sum / count as f64,
                    grade_count: count,
                })
                .collect();
            periods.sort_by_key(|p| p.period);

            GradeAggregate {
                student_id,
                student_name: acc.student_name,
                student_email: acc.student_email,
                level: acc.level,
                school_year: acc.school_year,
                mean: acc.sum / acc.count as f64,
                min: acc.min,
                max: acc.max,
                grade_count: acc.count,
                periods,
            }
        })
        .collect();

    aggregates.sort_by(|a, b| {
        b.mean
            .partial_cmp(&a.mean)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.student_name.cmp(&b.student_name))
    });
    aggregates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AcademicLevel;

    fn grade(student_id: Uuid, subject: &str, period: i32, score: f64) -> GradeRecord {
        GradeRecord {
            student_id,
            student_name: "Mara Santos".to_string(),
            student_email: "mara.santos@example.edu".to_string(),
            level: AcademicLevel::JuniorHigh,
            school_year: "2025-2026".to_string(),
            subject: subject.to_string(),
            period,
            score,
        }
    }

    #[test]
    fn mean_matches_arithmetic_mean() {
        let student = Uuid::new_v4();
        let grades = vec![
            grade(student, "Math", 1, 92.0),
            grade(student, "Science", 1, 88.0),
            grade(student, "English", 2, 96.0),
        ];

        let aggregates = aggregate_grades(&grades);
        assert_eq!(aggregates.len(), 1);
        let agg = &aggregates[0];
        assert!((agg.mean - 92.0).abs() < 1e-9);
        assert_eq!(agg.min, 88.0);
        assert_eq!(agg.max, 96.0);
        assert_eq!(agg.grade_count, 3);
    }

    #[test]
    fn periods_are_grouped_and_ordered() {
        let student = Uuid::new_v4();
        let grades = vec![
            grade(student, "Math", 2, 90.0),
            grade(student, "Math", 1, 80.0),
            grade(student, "Science", 2, 100.0),
        ];

        let aggregates = aggregate_grades(&grades);
        let periods = &aggregates[0].periods;
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].period, 1);
        assert_eq!(periods[0].grade_count, 1);
        assert!((periods[1].mean - 95.0).abs() < 1e-9);
    }

    #[test]
    fn students_are_ranked_by_mean() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut low = grade(second, "Math", 1, 75.0);
        low.student_name = "Ben Reyes".to_string();
        let grades = vec![grade(first, "Math", 1, 95.0), low];

        let aggregates = aggregate_grades(&grades);
        assert_eq!(aggregates[0].student_id, first);
        assert_eq!(aggregates[1].student_id, second);
    }

    #[test]
    fn empty_input_yields_no_aggregates() {
        assert!(aggregate_grades(&[]).is_empty());
    }
}
