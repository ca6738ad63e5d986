use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    pub school: String,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentContacts {
    pub primary: Contact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Contact>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalInfo {
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// Per-subject direction shown on a student card. Distinct from the
/// analytics trend classification, which has a fourth (volatile) bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMark {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPerformance {
    pub subject: String,
    pub grade: f64,
    pub trend: TrendMark,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Grade level as displayed, e.g. "Grade 4".
    pub grade: String,
    pub age: u32,
    /// Enrolled subject names. Subjects are matched by name equality across
    /// students, classes and assessments; there is no foreign key.
    pub subjects: Vec<String>,
    pub overall_grade: f64,
    pub performance: Vec<SubjectPerformance>,
    pub parent_contacts: ParentContacts,
    pub emergency_contact: EmergencyContact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default)]
    pub medical_info: MedicalInfo,
    pub enrollment_date: NaiveDate,
    pub class_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub day: String,
    pub time: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
    pub grade: String,
    pub subject: String,
    pub teacher_id: String,
    pub student_ids: Vec<String>,
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
    pub room: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub academic_year: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    Quiz,
    Test,
    Assignment,
    Project,
    Exam,
}

impl AssessmentKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiz" => Some(Self::Quiz),
            "test" => Some(Self::Test),
            "assignment" => Some(Self::Assignment),
            "project" => Some(Self::Project),
            "exam" => Some(Self::Exam),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Test => "test",
            Self::Assignment => "assignment",
            Self::Project => "project",
            Self::Exam => "exam",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub class_id: String,
    #[serde(rename = "type")]
    pub kind: AssessmentKind,
    pub total_marks: f64,
    /// Percentage contribution toward a final grade.
    pub weight: f64,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// One student's recorded score against one assessment. At most one entry
/// exists per (assessment, student) pair; the grading workflow upserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    pub id: String,
    pub assessment_id: String,
    pub student_id: String,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub graded_by: String,
    pub graded_at: DateTime<Utc>,
    pub is_late: bool,
    pub late_penalty: f64,
}

/// Invariant: `percentage == round(score / max_score * 100)`.
pub fn percentage_of(score: f64, max_score: f64) -> f64 {
    if max_score > 0.0 {
        (score * 100.0 / max_score).round()
    } else {
        0.0
    }
}

pub fn clamp_score(score: f64, total_marks: f64) -> f64 {
    score.max(0.0).min(total_marks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_nearest_whole_point() {
        assert_eq!(percentage_of(17.0, 20.0), 85.0);
        assert_eq!(percentage_of(2.0, 3.0), 67.0);
        assert_eq!(percentage_of(1.0, 3.0), 33.0);
        assert_eq!(percentage_of(0.0, 20.0), 0.0);
    }

    #[test]
    fn percentage_of_zero_max_is_zero() {
        assert_eq!(percentage_of(5.0, 0.0), 0.0);
    }

    #[test]
    fn scores_clamp_to_assessment_range() {
        assert_eq!(clamp_score(-3.0, 20.0), 0.0);
        assert_eq!(clamp_score(25.0, 20.0), 20.0);
        assert_eq!(clamp_score(12.5, 20.0), 12.5);
    }

    #[test]
    fn assessment_kind_round_trips_through_parse() {
        for kind in ["quiz", "test", "assignment", "project", "exam"] {
            assert_eq!(AssessmentKind::parse(kind).map(|k| k.as_str()), Some(kind));
        }
        assert!(AssessmentKind::parse("pop-quiz").is_none());
    }
}
