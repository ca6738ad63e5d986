use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::analytics::student_performance;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{clamp_score, percentage_of, GradeEntry};
use crate::store::Action;

const LATE_PENALTY_PERCENT: f64 = 5.0;

fn handle_grades_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(assessment_id) = req.params.get("assessmentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing assessmentId", None);
    };
    let Some(assessment) = state
        .store
        .assessments
        .iter()
        .find(|a| a.id == assessment_id)
    else {
        return err(&req.id, "not_found", "assessment not found", None);
    };

    let class = state
        .store
        .classes
        .iter()
        .find(|c| c.id == assessment.class_id);
    let class_name = class
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "Unknown Class".to_string());
    let roster: Vec<String> = class.map(|c| c.student_ids.clone()).unwrap_or_default();

    let rows: Vec<serde_json::Value> = roster
        .iter()
        .map(|student_id| {
            let name = state
                .store
                .students
                .iter()
                .find(|s| &s.id == student_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "Unknown Student".to_string());
            let existing = state
                .store
                .grade_entries
                .iter()
                .find(|g| g.assessment_id == assessment.id && &g.student_id == student_id);
            match existing {
                Some(entry) => json!({
                    "studentId": student_id,
                    "name": name,
                    "score": entry.score,
                    "feedback": entry.feedback.clone().unwrap_or_default(),
                    "percentage": entry.percentage,
                    "graded": true
                }),
                // Score 0 doubles as "not yet graded" in the entry form.
                None => json!({
                    "studentId": student_id,
                    "name": name,
                    "score": 0.0,
                    "feedback": "",
                    "percentage": serde_json::Value::Null,
                    "graded": false
                }),
            }
        })
        .collect();

    let graded_count = rows
        .iter()
        .filter(|r| r.get("graded").and_then(|v| v.as_bool()).unwrap_or(false))
        .count();

    ok(
        &req.id,
        json!({
            "assessment": assessment,
            "className": class_name,
            "rows": rows,
            "gradedCount": graded_count
        }),
    )
}

fn handle_grades_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(assessment_id) = req.params.get("assessmentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing assessmentId", None);
    };
    let Some(rows) = req.params.get("grades").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing grades[]", None);
    };
    let Some(assessment) = state
        .store
        .assessments
        .iter()
        .find(|a| a.id == assessment_id)
        .cloned()
    else {
        return err(&req.id, "not_found", "assessment not found", None);
    };

    let now = Utc::now();
    let is_late = now.date_naive() > assessment.due_date;
    let graded_by = state
        .store
        .teacher
        .as_ref()
        .map(|t| t.id.clone())
        .unwrap_or_else(|| "1".to_string());

    let mut saved = 0usize;
    let mut skipped = 0usize;
    let mut touched: Vec<String> = Vec::new();

    for row in rows {
        let Some(student_id) = row.get("studentId").and_then(|v| v.as_str()) else {
            skipped += 1;
            continue;
        };
        let score = row.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0);
        // A score of 0 means "not yet graded": the row is neither created
        // nor updated.
        if score <= 0.0 {
            skipped += 1;
            continue;
        }

        let score = clamp_score(score, assessment.total_marks);
        let feedback = row
            .get("feedback")
            .and_then(|v| v.as_str())
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        let existing_id = state
            .store
            .grade_entries
            .iter()
            .find(|g| g.assessment_id == assessment.id && g.student_id == student_id)
            .map(|g| g.id.clone());

        let entry = GradeEntry {
            id: existing_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            assessment_id: assessment.id.clone(),
            student_id: student_id.to_string(),
            score,
            max_score: assessment.total_marks,
            percentage: percentage_of(score, assessment.total_marks),
            feedback,
            graded_by: graded_by.clone(),
            graded_at: now,
            is_late,
            late_penalty: if is_late { LATE_PENALTY_PERCENT } else { 0.0 },
        };

        if existing_id.is_some() {
            state.dispatch(Action::UpdateGradeEntry(entry));
        } else {
            state.dispatch(Action::AddGradeEntry(entry));
        }
        saved += 1;
        if !touched.contains(&student_id.to_string()) {
            touched.push(student_id.to_string());
        }
    }

    // Grading moved the numbers; refresh each touched student's overall
    // grade and per-subject snapshot.
    for student_id in &touched {
        let Some(student) = state
            .store
            .students
            .iter()
            .find(|s| &s.id == student_id)
            .cloned()
        else {
            continue;
        };
        let (overall, performance) = student_performance(
            &student,
            &state.store.grade_entries,
            &state.store.assessments,
        );
        let mut updated = student;
        updated.overall_grade = overall;
        updated.performance = performance;
        state.dispatch(Action::UpdateStudent(updated));
    }

    tracing::debug!(saved, skipped, assessment = %assessment.id, "grades saved");
    ok(&req.id, json!({ "saved": saved, "skipped": skipped }))
}

fn handle_grades_for_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };

    let mut rows: Vec<serde_json::Value> = state
        .store
        .grade_entries
        .iter()
        .filter(|g| g.student_id == student_id)
        .map(|g| {
            let assessment = state
                .store
                .assessments
                .iter()
                .find(|a| a.id == g.assessment_id);
            json!({
                "entry": g,
                "assessmentTitle": assessment
                    .map(|a| a.title.clone())
                    .unwrap_or_else(|| "Unknown Assessment".to_string()),
                "subject": assessment.map(|a| a.subject.clone()),
                "type": assessment.map(|a| a.kind.as_str()),
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        let date = |v: &serde_json::Value| {
            v.get("entry")
                .and_then(|e| e.get("gradedAt"))
                .and_then(|d| d.as_str())
                .map(|d| d.to_string())
                .unwrap_or_default()
        };
        date(a).cmp(&date(b))
    });

    ok(&req.id, json!({ "grades": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.sheet" => Some(handle_grades_sheet(state, req)),
        "grades.save" => Some(handle_grades_save(state, req)),
        "grades.forStudent" => Some(handle_grades_for_student(state, req)),
        _ => None,
    }
}
