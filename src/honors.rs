use serde::Serialize;
use uuid::Uuid;

use crate::models::{GradeAggregate, HonorType};

#[derive(Debug, Clone, Serialize)]
pub struct QualifiedHonor {
    pub honor_type_id: Uuid,
    pub honor_name: String,
    pub min_average: f64,
    pub grade_floor: f64,
}

/// Outcome of matching one student's aggregate against a level's honor types.
/// `qualified` is ordered strictest-first; `reasons` is populated only when
/// nothing matched.
#[derive(Debug, Clone, Serialize)]
pub struct StudentEvaluation {
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub school_year: String,
    pub gpa: f64,
    pub min_grade: f64,
    pub grade_count: usize,
    pub qualified: Vec<QualifiedHonor>,
    pub reasons: Vec<String>,
}

impl StudentEvaluation {
    pub fn best_honor(&self) -> Option<&QualifiedHonor> {
        self.qualified.first()
    }
}

/// Orders honor types strictest-first: higher minimum average wins, ties
/// broken by the higher grade floor.
pub fn rank_by_strictness(types: &mut [HonorType]) {
    types.sort_by(|a, b| {
        b.min_average
            .partial_cmp(&a.min_average)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.grade_floor
                    .partial_cmp(&a.grade_floor)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}

pub fn qualifies(aggregate: &GradeAggregate, honor: &HonorType) -> bool {
    aggregate.mean >= honor.min_average && aggregate.min >= honor.grade_floor
}

/// Evaluates every aggregate against the ranked honor types. Honor types are
/// re-ranked here so callers can pass them in storage order.
pub fn evaluate_students(
    aggregates: &[GradeAggregate],
    honor_types: &[HonorType],
) -> Vec<StudentEvaluation> {
    let mut ranked = honor_types.to_vec();
    rank_by_strictness(&mut ranked);

    aggregates
        .iter()
        .map(|aggregate| {
            let qualified: Vec<QualifiedHonor> = ranked
                .iter()
                .filter(|honor| qualifies(aggregate, honor))
                .map(|honor| QualifiedHonor {
                    honor_type_id: honor.id,
                    honor_name: honor.name.clone(),
                    min_average: honor.min_average,
                    grade_floor: honor.grade_floor,
                })
                .collect();

            let mut reasons = Vec::new();
            if qualified.is_empty() {
                // Explain against the most lenient honor on offer.
                if let Some(easiest) = ranked.last() {
                    if aggregate.mean < easiest.min_average {
                        reasons.push(format!(
                            "average {:.2} below {:.2} required for {}",
                            aggregate.mean, easiest.min_average, easiest.name
                        ));
                    }
                    if aggregate.min < easiest.grade_floor {
                        reasons.push(format!(
                            "lowest grade {:.2} below floor {:.2} for {}",
                            aggregate.min, easiest.grade_floor, easiest.name
                        ));
                    }
                } else {
                    reasons.push("no honor types configured for this level".to_string());
                }
            }

            StudentEvaluation {
                student_id: aggregate.student_id,
                student_name: aggregate.student_name.clone(),
                student_email: aggregate.student_email.clone(),
                school_year: aggregate.school_year.clone(),
                gpa: aggregate.mean,
                min_grade: aggregate.min,
                grade_count: aggregate.grade_count,
                qualified,
                reasons,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AcademicLevel;

    fn honor(name: &str, min_average: f64, grade_floor: f64) -> HonorType {
        HonorType {
            id: Uuid::new_v4(),
            name: name.to_string(),
            level: AcademicLevel::JuniorHigh,
            min_average,
            grade_floor,
        }
    }

    fn aggregate(mean: f64, min: f64) -> GradeAggregate {
        GradeAggregate {
            student_id: Uuid::new_v4(),
            student_name: "Mara Santos".to_string(),
            student_email: "mara.santos@example.edu".to_string(),
            level: AcademicLevel::JuniorHigh,
            school_year: "2025-2026".to_string(),
            mean,
            min,
            max: 100.0,
            grade_count: 8,
            periods: Vec::new(),
        }
    }

    fn standard_types() -> Vec<HonorType> {
        vec![
            honor("With Honors", 90.0, 85.0),
            honor("With Highest Honors", 98.0, 93.0),
            honor("With High Honors", 95.0, 90.0),
        ]
    }

    #[test]
    fn ranking_puts_strictest_first() {
        let mut types = standard_types();
        rank_by_strictness(&mut types);
        let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["With Highest Honors", "With High Honors", "With Honors"]
        );
    }

    #[test]
    fn qualifies_requires_both_mean_and_floor() {
        let honor = honor("With Honors", 90.0, 85.0);
        assert!(qualifies(&aggregate(91.0, 86.0), &honor));
        assert!(!qualifies(&aggregate(89.9, 95.0), &honor));
        assert!(!qualifies(&aggregate(95.0, 84.9), &honor));
        // Boundary values count as qualifying.
        assert!(qualifies(&aggregate(90.0, 85.0), &honor));
    }

    #[test]
    fn multiple_qualifications_report_strictest_first() {
        let types = standard_types();
        let evaluations = evaluate_students(&[aggregate(96.0, 92.0)], &types);
        let eval = &evaluations[0];
        assert_eq!(eval.qualified.len(), 2);
        assert_eq!(eval.best_honor().unwrap().honor_name, "With High Honors");
        assert!(eval.reasons.is_empty());
    }

    #[test]
    fn failing_both_thresholds_reports_both_reasons() {
        let types = standard_types();
        let evaluations = evaluate_students(&[aggregate(85.0, 70.0)], &types);
        let eval = &evaluations[0];
        assert!(eval.qualified.is_empty());
        assert_eq!(eval.reasons.len(), 2);
        assert!(eval.reasons[0].contains("average 85.00"));
        assert!(eval.reasons[1].contains("lowest grade 70.00"));
    }

    #[test]
    fn no_configured_types_is_its_own_reason() {
        let evaluations = evaluate_students(&[aggregate(99.0, 99.0)], &[]);
        assert_eq!(
            evaluations[0].reasons,
            vec!["no honor types configured for this level".to_string()]
        );
    }
}
