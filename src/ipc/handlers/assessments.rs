use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::handlers::params::{optional_str, parse_date, search_term};
use crate::ipc::types::{AppState, Request};
use crate::model::{Assessment, AssessmentKind};
use crate::store::Action;

fn handle_assessments_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let search = search_term(&req.params);
    let class_id = optional_str(&req.params, "classId");
    let subject = optional_str(&req.params, "subject");
    let kind = optional_str(&req.params, "type").and_then(|t| AssessmentKind::parse(&t));

    let mut assessments: Vec<&Assessment> = state.store.assessments.iter().collect();
    if let Some(search) = search.as_ref() {
        assessments.retain(|a| a.title.to_ascii_lowercase().contains(search));
    }
    if let Some(class_id) = class_id.as_ref() {
        assessments.retain(|a| &a.class_id == class_id);
    }
    if let Some(subject) = subject.as_ref() {
        assessments.retain(|a| &a.subject == subject);
    }
    if let Some(kind) = kind {
        assessments.retain(|a| a.kind == kind);
    }

    let rows: Vec<serde_json::Value> = assessments
        .iter()
        .map(|a| {
            let graded_count = state
                .store
                .grade_entries
                .iter()
                .filter(|g| g.assessment_id == a.id)
                .count();
            let class_name = state
                .store
                .classes
                .iter()
                .find(|c| c.id == a.class_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Unknown Class".to_string());
            let mut row = json!(a);
            if let Some(obj) = row.as_object_mut() {
                obj.insert("gradedCount".to_string(), json!(graded_count));
                obj.insert("className".to_string(), json!(class_name));
            }
            row
        })
        .collect();

    ok(&req.id, json!({ "assessments": rows }))
}

fn handle_assessments_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut missing: Vec<&str> = Vec::new();
    let text = |key: &str| -> Option<String> {
        req.params
            .get(key)
            .and_then(|v| v.as_str())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let title = text("title");
    if title.is_none() {
        missing.push("title");
    }
    let subject = text("subject");
    if subject.is_none() {
        missing.push("subject");
    }
    let class_id = text("classId");
    if class_id.is_none() {
        missing.push("classId");
    }
    let kind_raw = text("type");
    if kind_raw.is_none() {
        missing.push("type");
    }
    let total_marks = req.params.get("totalMarks").and_then(|v| v.as_f64());
    if total_marks.is_none() {
        missing.push("totalMarks");
    }
    let weight = req.params.get("weight").and_then(|v| v.as_f64());
    if weight.is_none() {
        missing.push("weight");
    }
    let due_raw = text("dueDate");
    if due_raw.is_none() {
        missing.push("dueDate");
    }
    if !missing.is_empty() {
        return err(
            &req.id,
            "bad_params",
            "missing required fields",
            Some(json!({ "missing": missing })),
        );
    }

    let kind_raw = kind_raw.expect("validated");
    let Some(kind) = AssessmentKind::parse(&kind_raw) else {
        return err(
            &req.id,
            "bad_params",
            "type must be one of: quiz, test, assignment, project, exam",
            Some(json!({ "type": kind_raw })),
        );
    };
    let total_marks = total_marks.expect("validated");
    if total_marks <= 0.0 {
        return err(
            &req.id,
            "bad_params",
            "totalMarks must be > 0",
            Some(json!({ "totalMarks": total_marks })),
        );
    }
    let due_date = match parse_date(&due_raw.expect("validated"), "dueDate") {
        Ok(d) => d,
        Err(e) => return e.response(&req.id),
    };

    let assessment = Assessment {
        id: Uuid::new_v4().to_string(),
        title: title.expect("validated"),
        subject: subject.expect("validated"),
        class_id: class_id.expect("validated"),
        kind,
        total_marks,
        weight: weight.expect("validated"),
        due_date,
        instructions: text("instructions"),
        created_at: Utc::now(),
        created_by: state
            .store
            .teacher
            .as_ref()
            .map(|t| t.id.clone())
            .unwrap_or_else(|| "1".to_string()),
    };

    let result = json!({ "assessment": &assessment });
    state.dispatch(Action::AddAssessment(assessment));
    ok(&req.id, result)
}

fn handle_assessments_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(payload) = req.params.get("assessment") else {
        return err(&req.id, "bad_params", "missing assessment", None);
    };
    let assessment: Assessment = match serde_json::from_value(payload.clone()) {
        Ok(a) => a,
        Err(e) => {
            return err(
                &req.id,
                "bad_params",
                format!("invalid assessment: {}", e),
                None,
            )
        }
    };
    state.dispatch(Action::UpdateAssessment(assessment));
    ok(&req.id, json!({ "ok": true }))
}

fn handle_assessments_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(assessment_id) = req.params.get("assessmentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing assessmentId", None);
    };
    // Grade entries for the assessment go with it.
    state.dispatch(Action::DeleteAssessment(assessment_id.to_string()));
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assessments.list" => Some(handle_assessments_list(state, req)),
        "assessments.create" => Some(handle_assessments_create(state, req)),
        "assessments.update" => Some(handle_assessments_update(state, req)),
        "assessments.delete" => Some(handle_assessments_delete(state, req)),
        _ => None,
    }
}
