use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{Assessment, GradeEntry, Student, SubjectPerformance, TrendMark};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Strength,
    Weakness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInsight {
    pub id: String,
    pub student_id: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub category: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// Fixed per rule, not computed.
    pub confidence: u32,
    pub suggested_actions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    Volatile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub score: f64,
    pub assessment_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTrend {
    pub student_id: String,
    pub subject: String,
    pub period: String,
    pub trend: TrendDirection,
    pub trend_score: f64,
    pub data_points: Vec<TrendPoint>,
    pub predicted_score: f64,
    pub confidence: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSeverity {
    Minor,
    Moderate,
    Major,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningGap {
    pub id: String,
    pub student_id: String,
    pub subject: String,
    pub topic: String,
    pub severity: GapSeverity,
    pub description: String,
    pub suggested_resources: Vec<String>,
    pub estimated_days_to_close: u32,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Intervention,
    TeachingStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub target_students: Vec<String>,
    pub priority: Priority,
    /// Fixed per recommendation type, not computed from data.
    pub estimated_impact: u32,
    pub implementation_steps: Vec<String>,
    pub required_resources: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    GradeDrop,
    MissingAssignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub student_id: String,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub created_at: DateTime<Utc>,
    pub action_required: bool,
    pub related_data: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradeDistribution {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
    #[serde(rename = "F")]
    pub f: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectBreakdown {
    pub subject: String,
    pub average_score: f64,
    pub student_count: usize,
    pub grade_distribution: GradeDistribution,
    pub top_performers: Vec<String>,
    pub struggling_students: Vec<String>,
    pub common_weaknesses: Vec<String>,
    pub improvement_suggestions: Vec<String>,
}

/// The cached bundle of derived views. Wholly replaced on every run; no
/// incremental invariant is maintained between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub insights: Vec<PerformanceInsight>,
    pub trends: Vec<PerformanceTrend>,
    pub learning_gaps: Vec<LearningGap>,
    pub recommendations: Vec<Recommendation>,
    pub alerts: Vec<PerformanceAlert>,
    pub subject_breakdowns: Vec<SubjectBreakdown>,
    pub last_updated: DateTime<Utc>,
}

pub struct AnalyticsContext<'a> {
    pub students: &'a [Student],
    pub grade_entries: &'a [GradeEntry],
    pub assessments: &'a [Assessment],
}

impl<'a> AnalyticsContext<'a> {
    fn assessment_index(&self) -> HashMap<&'a str, &'a Assessment> {
        self.assessments
            .iter()
            .map(|a| (a.id.as_str(), a))
            .collect()
    }

    fn student_entries(&self, student_id: &str) -> Vec<&'a GradeEntry> {
        self.grade_entries
            .iter()
            .filter(|g| g.student_id == student_id)
            .collect()
    }
}

/// Derive the full analytics snapshot from the current collections. Pure and
/// deterministic given its inputs; `now` is embedded in generated ids and
/// timestamps and anchors the recency windows.
pub fn generate(ctx: &AnalyticsContext<'_>, now: DateTime<Utc>) -> AnalyticsSnapshot {
    AnalyticsSnapshot {
        insights: performance_insights(ctx, now),
        trends: performance_trends(ctx),
        learning_gaps: learning_gaps(ctx, now),
        recommendations: recommendations(ctx, now),
        alerts: performance_alerts(ctx, now),
        subject_breakdowns: subject_breakdowns(ctx),
        last_updated: now,
    }
}

fn mean_percentage(entries: &[&GradeEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    entries.iter().map(|g| g.percentage).sum::<f64>() / entries.len() as f64
}

fn recent_entries<'a>(
    entries: &[&'a GradeEntry],
    days: i64,
    now: DateTime<Utc>,
) -> Vec<&'a GradeEntry> {
    let cutoff = now - Duration::days(days);
    entries
        .iter()
        .filter(|g| g.graded_at >= cutoff)
        .copied()
        .collect()
}

fn chronological<'a>(entries: &[&'a GradeEntry]) -> Vec<&'a GradeEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|g| g.graded_at);
    sorted
}

fn subject_scoped<'a>(
    entries: &[&'a GradeEntry],
    index: &HashMap<&str, &Assessment>,
    subject: &str,
) -> Vec<&'a GradeEntry> {
    entries
        .iter()
        .filter(|g| {
            index
                .get(g.assessment_id.as_str())
                .map(|a| a.subject == subject)
                .unwrap_or(false)
        })
        .copied()
        .collect()
}

/// Second-half average minus first-half average of the chronologically
/// sorted series. Fewer than two entries yields 0.
fn half_split_delta(entries: &[&GradeEntry]) -> f64 {
    if entries.len() < 2 {
        return 0.0;
    }
    let sorted = chronological(entries);
    let mid = sorted.len() / 2;
    mean_percentage(&sorted[mid..]) - mean_percentage(&sorted[..mid])
}

pub fn trend_score(entries: &[&GradeEntry]) -> f64 {
    half_split_delta(entries).clamp(-100.0, 100.0)
}

pub fn trend_direction(score: f64) -> TrendDirection {
    if score.abs() < 5.0 {
        TrendDirection::Stable
    } else if score > 10.0 {
        TrendDirection::Improving
    } else if score < -10.0 {
        TrendDirection::Declining
    } else {
        TrendDirection::Volatile
    }
}

fn predicted_score(entries: &[&GradeEntry]) -> f64 {
    let average = mean_percentage(entries);
    if entries.len() < 3 {
        return average;
    }
    (average + half_split_delta(entries)).clamp(0.0, 100.0)
}

fn std_deviation(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let variance = scores
        .iter()
        .map(|s| (s - mean) * (s - mean))
        .sum::<f64>()
        / scores.len() as f64;
    variance.sqrt()
}

fn trend_confidence(entries: &[&GradeEntry]) -> u32 {
    if entries.len() < 3 {
        return 50;
    }
    let scores: Vec<f64> = entries.iter().map(|g| g.percentage).collect();
    (100.0 - std_deviation(&scores)).max(50.0).round() as u32
}

fn performance_insights(
    ctx: &AnalyticsContext<'_>,
    now: DateTime<Utc>,
) -> Vec<PerformanceInsight> {
    let index = ctx.assessment_index();
    let stamp = now.timestamp_millis();
    let mut insights = Vec::new();

    for student in ctx.students {
        let entries = ctx.student_entries(&student.id);
        if entries.is_empty() {
            continue;
        }

        let overall = mean_percentage(&entries);
        let recent = mean_percentage(&recent_entries(&entries, 30, now));

        if recent < overall - 10.0 {
            insights.push(PerformanceInsight {
                id: format!("insight-{}-decline-{}", student.id, stamp),
                student_id: student.id.clone(),
                kind: InsightKind::Weakness,
                category: "academic".to_string(),
                title: "Recent Performance Decline".to_string(),
                description: format!(
                    "{} has shown a {}% decline in recent performance.",
                    student.name,
                    (overall - recent).round()
                ),
                priority: Priority::High,
                confidence: 85,
                suggested_actions: vec![
                    "Schedule one-on-one meeting with student".to_string(),
                    "Review recent assignments for patterns".to_string(),
                    "Consider additional support resources".to_string(),
                    "Contact parents for discussion".to_string(),
                ],
                created_at: now,
            });
        }

        if overall >= 90.0 {
            insights.push(PerformanceInsight {
                id: format!("insight-{}-strength-{}", student.id, stamp),
                student_id: student.id.clone(),
                kind: InsightKind::Strength,
                category: "academic".to_string(),
                title: "Excellent Performance".to_string(),
                description: format!(
                    "{} is consistently performing at a high level with an average of {}%.",
                    student.name,
                    overall.round()
                ),
                priority: Priority::Low,
                confidence: 95,
                suggested_actions: vec![
                    "Consider advanced materials or enrichment activities".to_string(),
                    "Use as peer mentor for struggling students".to_string(),
                    "Maintain current support level".to_string(),
                ],
                created_at: now,
            });
        }

        for subject in &student.subjects {
            let subject_entries = subject_scoped(&entries, &index, subject);
            if subject_entries.len() < 2 {
                continue;
            }
            let subject_average = mean_percentage(&subject_entries);
            if subject_average < 70.0 {
                insights.push(PerformanceInsight {
                    id: format!("insight-{}-{}-struggling-{}", student.id, subject, stamp),
                    student_id: student.id.clone(),
                    kind: InsightKind::Weakness,
                    category: "academic".to_string(),
                    title: format!("Struggling in {}", subject),
                    description: format!(
                        "{} is struggling in {} with an average of {}%.",
                        student.name,
                        subject,
                        subject_average.round()
                    ),
                    priority: Priority::High,
                    confidence: 90,
                    suggested_actions: vec![
                        format!("Provide additional {} support materials", subject),
                        "Schedule extra help sessions".to_string(),
                        "Consider peer tutoring".to_string(),
                        "Break down complex concepts into smaller parts".to_string(),
                    ],
                    created_at: now,
                });
            }
        }
    }

    insights
}

fn performance_trends(ctx: &AnalyticsContext<'_>) -> Vec<PerformanceTrend> {
    let index = ctx.assessment_index();
    let mut trends = Vec::new();

    for student in ctx.students {
        let entries = ctx.student_entries(&student.id);
        for subject in &student.subjects {
            let subject_entries = chronological(&subject_scoped(&entries, &index, subject));
            if subject_entries.len() < 3 {
                continue;
            }

            let data_points = subject_entries
                .iter()
                .map(|g| TrendPoint {
                    date: g.graded_at,
                    score: g.percentage,
                    assessment_type: index
                        .get(g.assessment_id.as_str())
                        .map(|a| a.kind.as_str().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                })
                .collect();

            let score = trend_score(&subject_entries);
            trends.push(PerformanceTrend {
                student_id: student.id.clone(),
                subject: subject.clone(),
                period: "month".to_string(),
                trend: trend_direction(score),
                trend_score: score,
                data_points,
                predicted_score: predicted_score(&subject_entries),
                confidence: trend_confidence(&subject_entries),
            });
        }
    }

    trends
}

pub fn gap_severity(low_count: usize, total_count: usize) -> GapSeverity {
    let percentage = low_count as f64 * 100.0 / total_count as f64;
    if percentage >= 75.0 {
        GapSeverity::Critical
    } else if percentage >= 50.0 {
        GapSeverity::Major
    } else if percentage >= 25.0 {
        GapSeverity::Moderate
    } else {
        GapSeverity::Minor
    }
}

fn days_to_close(severity: GapSeverity) -> u32 {
    match severity {
        GapSeverity::Minor => 7,
        GapSeverity::Moderate => 14,
        GapSeverity::Major => 30,
        GapSeverity::Critical => 60,
    }
}

/// Placeholder for real topic inference: a static per-subject topic list with
/// an arbitrary but deterministic pick, so repeated runs agree.
fn weak_topic(subject: &str, low_count: usize) -> String {
    let topics: &[&str] = match subject {
        "Mathematics" => &["Algebra", "Geometry", "Arithmetic", "Problem Solving"],
        "English" => &["Reading Comprehension", "Writing", "Grammar", "Vocabulary"],
        "Science" => &["Biology", "Chemistry", "Physics", "Scientific Method"],
        "History" => &["Historical Events", "Timeline", "Analysis", "Research"],
        "Geography" => &["Maps", "Climate", "Countries", "Physical Features"],
        _ => &["General Concepts"],
    };
    topics[low_count % topics.len()].to_string()
}

fn gap_resources(subject: &str, severity: GapSeverity) -> Vec<String> {
    let mut resources = vec![
        format!("{} practice worksheets", subject),
        "Online tutorial videos".to_string(),
        "One-on-one tutoring sessions".to_string(),
        "Peer study groups".to_string(),
    ];
    if matches!(severity, GapSeverity::Critical | GapSeverity::Major) {
        resources.push("Specialized intervention program".to_string());
        resources.push("Parent-teacher conference".to_string());
    }
    resources
}

fn learning_gaps(ctx: &AnalyticsContext<'_>, now: DateTime<Utc>) -> Vec<LearningGap> {
    let index = ctx.assessment_index();
    let stamp = now.timestamp_millis();
    let mut gaps = Vec::new();

    for student in ctx.students {
        let entries = ctx.student_entries(&student.id);
        for subject in &student.subjects {
            let subject_entries = subject_scoped(&entries, &index, subject);
            if subject_entries.is_empty() {
                continue;
            }
            let low_count = subject_entries
                .iter()
                .filter(|g| g.percentage < 60.0)
                .count();
            if low_count == 0 {
                continue;
            }

            let severity = gap_severity(low_count, subject_entries.len());
            gaps.push(LearningGap {
                id: format!("gap-{}-{}-{}", student.id, subject, stamp),
                student_id: student.id.clone(),
                subject: subject.clone(),
                topic: weak_topic(subject, low_count),
                severity,
                description: format!(
                    "{} is struggling with fundamental concepts in {}.",
                    student.name, subject
                ),
                suggested_resources: gap_resources(subject, severity),
                estimated_days_to_close: days_to_close(severity),
                created_at: now,
                status: "open".to_string(),
            });
        }
    }

    gaps
}

fn recommendations(ctx: &AnalyticsContext<'_>, now: DateTime<Utc>) -> Vec<Recommendation> {
    let stamp = now.timestamp_millis();
    let mut out = Vec::new();

    // Only students with at least one graded entry are classified; an
    // ungraded student averages nothing, not zero.
    let averages: Vec<(&Student, f64)> = ctx
        .students
        .iter()
        .filter_map(|s| {
            let entries = ctx.student_entries(&s.id);
            if entries.is_empty() {
                None
            } else {
                Some((s, mean_percentage(&entries)))
            }
        })
        .collect();

    let struggling: Vec<&Student> = averages
        .iter()
        .filter(|(_, avg)| *avg < 70.0)
        .map(|(s, _)| *s)
        .collect();
    if !struggling.is_empty() {
        out.push(Recommendation {
            id: format!("rec-intervention-{}", stamp),
            kind: RecommendationKind::Intervention,
            title: "Implement Group Intervention Program".to_string(),
            description: format!(
                "{} students are performing below 70%. Consider implementing a targeted intervention program.",
                struggling.len()
            ),
            target_students: struggling.iter().map(|s| s.id.clone()).collect(),
            priority: Priority::High,
            estimated_impact: 75,
            implementation_steps: vec![
                "Identify common learning gaps".to_string(),
                "Create small group sessions".to_string(),
                "Develop targeted materials".to_string(),
                "Schedule regular progress checks".to_string(),
                "Involve parents in the process".to_string(),
            ],
            required_resources: vec![
                "Additional teaching materials".to_string(),
                "Small group space".to_string(),
                "Progress tracking tools".to_string(),
                "Parent communication templates".to_string(),
            ],
            created_at: now,
            status: "pending".to_string(),
        });
    }

    let excelling: Vec<&Student> = averages
        .iter()
        .filter(|(_, avg)| *avg >= 90.0)
        .map(|(s, _)| *s)
        .collect();
    if !excelling.is_empty() {
        out.push(Recommendation {
            id: format!("rec-enrichment-{}", stamp),
            kind: RecommendationKind::TeachingStrategy,
            title: "Create Enrichment Program".to_string(),
            description: format!(
                "{} students are excelling. Consider creating an enrichment program to challenge them further.",
                excelling.len()
            ),
            target_students: excelling.iter().map(|s| s.id.clone()).collect(),
            priority: Priority::Medium,
            estimated_impact: 60,
            implementation_steps: vec![
                "Design advanced curriculum modules".to_string(),
                "Create project-based learning opportunities".to_string(),
                "Establish peer mentoring program".to_string(),
                "Provide leadership opportunities".to_string(),
            ],
            required_resources: vec![
                "Advanced curriculum materials".to_string(),
                "Project resources".to_string(),
                "Mentoring guidelines".to_string(),
                "Leadership training materials".to_string(),
            ],
            created_at: now,
            status: "pending".to_string(),
        });
    }

    out
}

fn performance_alerts(ctx: &AnalyticsContext<'_>, now: DateTime<Utc>) -> Vec<PerformanceAlert> {
    let stamp = now.timestamp_millis();
    let today = now.date_naive();
    let mut alerts = Vec::new();

    // Assessments that came due within the last 7 days.
    let recently_due: Vec<&Assessment> = ctx
        .assessments
        .iter()
        .filter(|a| {
            let days = (today - a.due_date).num_days();
            (0..=7).contains(&days)
        })
        .collect();

    for student in ctx.students {
        let entries = ctx.student_entries(&student.id);
        if entries.is_empty() {
            continue;
        }

        let overall = mean_percentage(&entries);
        let recent = mean_percentage(&recent_entries(&entries, 7, now));

        if recent < overall - 15.0 {
            let drop = (overall - recent).round();
            alerts.push(PerformanceAlert {
                id: format!("alert-{}-drop-{}", student.id, stamp),
                kind: AlertKind::GradeDrop,
                student_id: student.id.clone(),
                title: "Significant Grade Drop Detected".to_string(),
                message: format!(
                    "{} has experienced a {}% drop in recent performance.",
                    student.name, drop
                ),
                severity: AlertSeverity::Critical,
                created_at: now,
                action_required: true,
                related_data: serde_json::json!({
                    "recentAverage": recent,
                    "overallAverage": overall,
                    "dropPercentage": drop
                }),
            });
        }

        for assessment in &recently_due {
            let enrolled = student.class_ids.contains(&assessment.class_id);
            if !enrolled {
                continue;
            }
            let has_entry = entries
                .iter()
                .any(|g| g.assessment_id == assessment.id);
            if has_entry {
                continue;
            }
            alerts.push(PerformanceAlert {
                id: format!("alert-{}-missing-{}", student.id, assessment.id),
                kind: AlertKind::MissingAssignment,
                student_id: student.id.clone(),
                title: "Missing Assignment".to_string(),
                message: format!(
                    "{} has not submitted {} which was due {}.",
                    student.name, assessment.title, assessment.due_date
                ),
                severity: AlertSeverity::Warning,
                created_at: now,
                action_required: true,
                related_data: serde_json::json!({
                    "assessmentId": assessment.id,
                    "dueDate": assessment.due_date,
                    "daysLate": (today - assessment.due_date).num_days()
                }),
            });
        }
    }

    alerts
}

/// Static lookup, acknowledged placeholder: real weakness detection would
/// analyze assessment content.
fn common_weaknesses(subject: &str) -> Vec<String> {
    let weaknesses: &[&str] = match subject {
        "Mathematics" => &["Problem-solving strategies", "Basic arithmetic", "Word problems"],
        "English" => &["Reading comprehension", "Essay structure", "Grammar rules"],
        "Science" => &["Scientific method", "Data analysis", "Concept application"],
        "History" => &["Historical analysis", "Timeline understanding", "Source evaluation"],
        "Geography" => &["Map reading", "Climate patterns", "Country identification"],
        _ => &["General concepts"],
    };
    weaknesses.iter().map(|w| w.to_string()).collect()
}

fn improvement_suggestions(average: f64) -> Vec<String> {
    if average < 60.0 {
        vec![
            "Implement intensive remediation program".to_string(),
            "Provide additional one-on-one support".to_string(),
            "Break down complex topics into smaller units".to_string(),
        ]
    } else if average < 80.0 {
        vec![
            "Increase practice opportunities".to_string(),
            "Provide more detailed feedback".to_string(),
            "Use visual aids and hands-on activities".to_string(),
        ]
    } else {
        vec![
            "Maintain current teaching strategies".to_string(),
            "Consider enrichment activities".to_string(),
            "Encourage peer tutoring".to_string(),
        ]
    }
}

fn subject_breakdowns(ctx: &AnalyticsContext<'_>) -> Vec<SubjectBreakdown> {
    let index = ctx.assessment_index();

    // One breakdown per subject referenced by any student, first-seen order.
    let mut subjects: Vec<&String> = Vec::new();
    for student in ctx.students {
        for subject in &student.subjects {
            if !subjects.contains(&subject) {
                subjects.push(subject);
            }
        }
    }

    let mut breakdowns = Vec::new();
    for subject in subjects {
        let subject_entries: Vec<&GradeEntry> = ctx
            .grade_entries
            .iter()
            .filter(|g| {
                index
                    .get(g.assessment_id.as_str())
                    .map(|a| &a.subject == subject)
                    .unwrap_or(false)
            })
            .collect();
        if subject_entries.is_empty() {
            continue;
        }

        let average = mean_percentage(&subject_entries);

        let mut distribution = GradeDistribution::default();
        for entry in &subject_entries {
            match entry.percentage {
                p if p >= 90.0 => distribution.a += 1,
                p if p >= 80.0 => distribution.b += 1,
                p if p >= 70.0 => distribution.c += 1,
                p if p >= 60.0 => distribution.d += 1,
                _ => distribution.f += 1,
            }
        }

        let mut top_performers = Vec::new();
        let mut struggling_students = Vec::new();
        for student in ctx.students {
            let own: Vec<&GradeEntry> = subject_entries
                .iter()
                .filter(|g| g.student_id == student.id)
                .copied()
                .collect();
            if own.is_empty() {
                continue;
            }
            let own_average = mean_percentage(&own);
            if own_average >= 90.0 {
                top_performers.push(student.name.clone());
            } else if own_average < 70.0 {
                struggling_students.push(student.name.clone());
            }
        }

        breakdowns.push(SubjectBreakdown {
            subject: subject.clone(),
            average_score: average.round(),
            student_count: ctx
                .students
                .iter()
                .filter(|s| s.subjects.contains(subject))
                .count(),
            grade_distribution: distribution,
            top_performers,
            struggling_students,
            common_weaknesses: common_weaknesses(subject),
            improvement_suggestions: improvement_suggestions(average),
        });
    }

    breakdowns
}

/// Recompute a student's overall grade and per-subject snapshot from their
/// grade entries. Used by the grading workflow after an upsert.
pub fn student_performance(
    student: &Student,
    grade_entries: &[GradeEntry],
    assessments: &[Assessment],
) -> (f64, Vec<SubjectPerformance>) {
    let ctx = AnalyticsContext {
        students: std::slice::from_ref(student),
        grade_entries,
        assessments,
    };
    let index = ctx.assessment_index();
    let entries = ctx.student_entries(&student.id);

    let overall = mean_percentage(&entries).round();
    let performance = student
        .subjects
        .iter()
        .map(|subject| {
            let subject_entries = subject_scoped(&entries, &index, subject);
            let delta = half_split_delta(&subject_entries);
            let trend = if delta > 5.0 {
                TrendMark::Up
            } else if delta < -5.0 {
                TrendMark::Down
            } else {
                TrendMark::Stable
            };
            SubjectPerformance {
                subject: subject.clone(),
                grade: mean_percentage(&subject_entries).round(),
                trend,
            }
        })
        .collect();

    (overall, performance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        percentage_of, AssessmentKind, EmergencyContact, MedicalInfo, ParentContacts,
    };
    use chrono::TimeZone;

    fn day(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, n, 12, 0, 0).unwrap()
    }

    fn student(id: &str, name: &str, subjects: &[&str]) -> Student {
        Student {
            id: id.to_string(),
            name: name.to_string(),
            grade: "Grade 4".to_string(),
            age: 9,
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            overall_grade: 0.0,
            performance: Vec::new(),
            parent_contacts: ParentContacts::default(),
            emergency_contact: EmergencyContact::default(),
            address: None,
            medical_info: MedicalInfo::default(),
            enrollment_date: day(1).date_naive(),
            class_ids: vec!["class-1".to_string()],
        }
    }

    fn assessment(id: &str, subject: &str, due: DateTime<Utc>) -> Assessment {
        Assessment {
            id: id.to_string(),
            title: format!("{} check-in", subject),
            subject: subject.to_string(),
            class_id: "class-1".to_string(),
            kind: AssessmentKind::Quiz,
            total_marks: 100.0,
            weight: 10.0,
            due_date: due.date_naive(),
            instructions: None,
            created_at: due,
            created_by: "teacher-1".to_string(),
        }
    }

    fn entry(id: &str, assessment_id: &str, student_id: &str, pct: f64, at: DateTime<Utc>) -> GradeEntry {
        GradeEntry {
            id: id.to_string(),
            assessment_id: assessment_id.to_string(),
            student_id: student_id.to_string(),
            score: pct,
            max_score: 100.0,
            percentage: percentage_of(pct, 100.0),
            feedback: None,
            graded_by: "teacher-1".to_string(),
            graded_at: at,
            is_late: false,
            late_penalty: 0.0,
        }
    }

    #[test]
    fn trend_direction_matches_score_bands() {
        assert_eq!(trend_direction(12.0), TrendDirection::Improving);
        assert_eq!(trend_direction(-12.0), TrendDirection::Declining);
        assert_eq!(trend_direction(2.0), TrendDirection::Stable);
        assert_eq!(trend_direction(7.0), TrendDirection::Volatile);
        assert_eq!(trend_direction(-7.0), TrendDirection::Volatile);
    }

    #[test]
    fn five_point_series_is_volatile_with_predicted_above_average() {
        // [85, 88, 92, 90, 95]: halves average 86.5 and 92.33, trend +5.83.
        let assessments: Vec<Assessment> = (1..=5)
            .map(|i| assessment(&format!("a{}", i), "Mathematics", day(i as u32)))
            .collect();
        let scores = [85.0, 88.0, 92.0, 90.0, 95.0];
        let entries: Vec<GradeEntry> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| entry(&format!("g{}", i), &format!("a{}", i + 1), "s1", *s, day(i as u32 + 1)))
            .collect();
        let refs: Vec<&GradeEntry> = entries.iter().collect();

        let score = trend_score(&refs);
        assert!((score - 5.8333).abs() < 0.001, "trend score {}", score);
        assert_eq!(trend_direction(score), TrendDirection::Volatile);

        let predicted = predicted_score(&refs);
        assert!((predicted - 95.8333).abs() < 0.001, "predicted {}", predicted);

        let students = vec![student("s1", "Emma Thompson", &["Mathematics"])];
        let ctx = AnalyticsContext {
            students: &students,
            grade_entries: &entries,
            assessments: &assessments,
        };
        let trends = performance_trends(&ctx);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].trend, TrendDirection::Volatile);
        assert_eq!(trends[0].data_points.len(), 5);
        assert_eq!(trends[0].confidence, 97);
    }

    #[test]
    fn fewer_than_three_points_predicts_the_plain_average() {
        let e1 = entry("g1", "a1", "s1", 60.0, day(1));
        let e2 = entry("g2", "a1", "s1", 80.0, day(2));
        let refs = vec![&e1, &e2];
        assert_eq!(predicted_score(&refs), 70.0);
        assert_eq!(trend_confidence(&refs), 50);
    }

    #[test]
    fn gap_severity_fractions() {
        assert_eq!(gap_severity(3, 4), GapSeverity::Critical);
        assert_eq!(gap_severity(2, 4), GapSeverity::Major);
        assert_eq!(gap_severity(1, 4), GapSeverity::Moderate);
        assert_eq!(gap_severity(1, 5), GapSeverity::Minor);
    }

    #[test]
    fn strength_and_struggling_insights_fire_on_thresholds() {
        let assessments = vec![
            assessment("a1", "Mathematics", day(1)),
            assessment("a2", "Mathematics", day(2)),
        ];
        let entries = vec![
            entry("g1", "a1", "ace", 95.0, day(1)),
            entry("g2", "a2", "ace", 93.0, day(2)),
            entry("g3", "a1", "behind", 60.0, day(1)),
            entry("g4", "a2", "behind", 65.0, day(2)),
        ];
        let students = vec![
            student("ace", "Sofia Chen", &["Mathematics"]),
            student("behind", "Liam Johnson", &["Mathematics"]),
        ];
        let ctx = AnalyticsContext {
            students: &students,
            grade_entries: &entries,
            assessments: &assessments,
        };

        let insights = performance_insights(&ctx, day(3));
        assert!(insights.iter().any(|i| {
            i.student_id == "ace" && i.kind == InsightKind::Strength && i.confidence == 95
        }));
        assert!(insights.iter().any(|i| {
            i.student_id == "behind"
                && i.title == "Struggling in Mathematics"
                && i.priority == Priority::High
                && i.confidence == 90
        }));
    }

    #[test]
    fn single_low_grade_is_not_enough_for_a_subject_insight() {
        let assessments = vec![assessment("a1", "Science", day(1))];
        let entries = vec![entry("g1", "a1", "s1", 50.0, day(1))];
        let students = vec![student("s1", "Emma Thompson", &["Science"])];
        let ctx = AnalyticsContext {
            students: &students,
            grade_entries: &entries,
            assessments: &assessments,
        };
        let insights = performance_insights(&ctx, day(2));
        assert!(!insights.iter().any(|i| i.title.starts_with("Struggling")));
    }

    #[test]
    fn missing_assignment_alert_respects_roster_and_window() {
        let now = day(20);
        let due_recent = assessment("due-recent", "Mathematics", day(18));
        let due_old = assessment("due-old", "Mathematics", day(1));
        let mut off_roster = student("other", "Ravi Patel", &["Mathematics"]);
        off_roster.class_ids = vec!["class-2".to_string()];

        let students = vec![student("s1", "Emma Thompson", &["Mathematics"]), off_roster];
        // s1 has one graded entry so alert analysis runs, but none for the
        // recently-due assessment.
        let entries = vec![entry("g1", "due-old", "s1", 80.0, day(2))];
        let other_entries = vec![entry("g2", "due-old", "other", 80.0, day(2))];
        let mut all = entries.clone();
        all.extend(other_entries);

        let assessments = vec![due_recent, due_old];
        let ctx = AnalyticsContext {
            students: &students,
            grade_entries: &all,
            assessments: &assessments,
        };
        let alerts = performance_alerts(&ctx, now);

        let missing: Vec<_> = alerts
            .iter()
            .filter(|a| a.kind == AlertKind::MissingAssignment)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].student_id, "s1");
        assert_eq!(missing[0].severity, AlertSeverity::Warning);
        // due-old fell outside the 7-day window; "other" is not on class-1.
    }

    #[test]
    fn grade_drop_alert_embeds_the_numeric_drop() {
        let now = day(28);
        let assessments = vec![
            assessment("a1", "Mathematics", day(1)),
            assessment("a2", "Mathematics", day(27)),
        ];
        let entries = vec![
            entry("g1", "a1", "s1", 90.0, day(1)),
            entry("g2", "a1", "s1", 92.0, day(2)),
            entry("g3", "a2", "s1", 40.0, day(27)),
        ];
        let students = vec![student("s1", "Emma Thompson", &["Mathematics"])];
        let ctx = AnalyticsContext {
            students: &students,
            grade_entries: &entries,
            assessments: &assessments,
        };
        let alerts = performance_alerts(&ctx, now);
        let drop = alerts
            .iter()
            .find(|a| a.kind == AlertKind::GradeDrop)
            .expect("grade drop alert");
        assert_eq!(drop.severity, AlertSeverity::Critical);
        // overall 74, recent (7d) 40 -> drop 34.
        assert_eq!(drop.related_data["dropPercentage"], 34.0);
    }

    #[test]
    fn distribution_partitions_every_entry_exactly_once() {
        let assessments = vec![assessment("a1", "English", day(1))];
        let scores = [95.0, 85.0, 75.0, 65.0, 55.0, 90.0, 80.0, 70.0, 60.0, 59.0];
        let entries: Vec<GradeEntry> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| entry(&format!("g{}", i), "a1", "s1", *s, day(i as u32 + 1)))
            .collect();
        let students = vec![student("s1", "Emma Thompson", &["English"])];
        let ctx = AnalyticsContext {
            students: &students,
            grade_entries: &entries,
            assessments: &assessments,
        };
        let breakdowns = subject_breakdowns(&ctx);
        assert_eq!(breakdowns.len(), 1);
        let d = &breakdowns[0].grade_distribution;
        assert_eq!(d.a + d.b + d.c + d.d + d.f, scores.len());
        assert_eq!((d.a, d.b, d.c, d.d, d.f), (2, 2, 2, 2, 2));
    }

    #[test]
    fn snapshot_is_idempotent_for_a_fixed_instant() {
        let assessments = vec![
            assessment("a1", "Mathematics", day(1)),
            assessment("a2", "Mathematics", day(8)),
            assessment("a3", "Mathematics", day(15)),
        ];
        let entries = vec![
            entry("g1", "a1", "s1", 55.0, day(1)),
            entry("g2", "a2", "s1", 58.0, day(8)),
            entry("g3", "a3", "s1", 52.0, day(15)),
        ];
        let students = vec![student("s1", "Liam Johnson", &["Mathematics"])];
        let ctx = AnalyticsContext {
            students: &students,
            grade_entries: &entries,
            assessments: &assessments,
        };
        let now = day(20);
        let first = serde_json::to_value(generate(&ctx, now)).unwrap();
        let second = serde_json::to_value(generate(&ctx, now)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn recommendations_ignore_ungraded_students() {
        let assessments = vec![assessment("a1", "Mathematics", day(1))];
        let entries = vec![entry("g1", "a1", "graded", 50.0, day(1))];
        let students = vec![
            student("graded", "Liam Johnson", &["Mathematics"]),
            student("new", "Maya Ortiz", &["Mathematics"]),
        ];
        let ctx = AnalyticsContext {
            students: &students,
            grade_entries: &entries,
            assessments: &assessments,
        };
        let recs = recommendations(&ctx, day(2));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::Intervention);
        assert_eq!(recs[0].target_students, vec!["graded".to_string()]);
        assert_eq!(recs[0].estimated_impact, 75);
    }

    #[test]
    fn student_performance_refreshes_overall_and_subject_rows() {
        let assessments = vec![
            assessment("a1", "Mathematics", day(1)),
            assessment("a2", "Mathematics", day(10)),
            assessment("a3", "English", day(5)),
        ];
        let entries = vec![
            entry("g1", "a1", "s1", 70.0, day(1)),
            entry("g2", "a2", "s1", 90.0, day(10)),
            entry("g3", "a3", "s1", 80.0, day(5)),
        ];
        let s = student("s1", "Emma Thompson", &["Mathematics", "English", "Science"]);
        let (overall, performance) = student_performance(&s, &entries, &assessments);
        assert_eq!(overall, 80.0);
        assert_eq!(performance.len(), 3);
        let math = performance.iter().find(|p| p.subject == "Mathematics").unwrap();
        assert_eq!(math.grade, 80.0);
        assert_eq!(math.trend, TrendMark::Up);
        let science = performance.iter().find(|p| p.subject == "Science").unwrap();
        assert_eq!(science.grade, 0.0);
        assert_eq!(science.trend, TrendMark::Stable);
    }
}
