use chrono::{Datelike, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::handlers::params::{optional_str, search_term};
use crate::ipc::types::{AppState, Request};
use crate::model::{Class, ScheduleSlot};
use crate::store::Action;

/// 1-decimal display rounding for roster averages.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn academic_year_for(now: chrono::DateTime<Utc>) -> String {
    let year = now.year();
    if now.month() >= 9 {
        format!("{}-{}", year, year + 1)
    } else {
        format!("{}-{}", year - 1, year)
    }
}

fn class_row(state: &AppState, class: &Class) -> serde_json::Value {
    let assessment_count = state
        .store
        .assessments
        .iter()
        .filter(|a| a.class_id == class.id)
        .count();
    let mut row = json!(class);
    if let Some(obj) = row.as_object_mut() {
        obj.insert("studentCount".to_string(), json!(class.student_ids.len()));
        obj.insert("assessmentCount".to_string(), json!(assessment_count));
    }
    row
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let search = search_term(&req.params);
    let grade = optional_str(&req.params, "grade");
    let subject = optional_str(&req.params, "subject");

    let mut classes: Vec<&Class> = state.store.classes.iter().collect();
    if let Some(search) = search.as_ref() {
        classes.retain(|c| c.name.to_ascii_lowercase().contains(search));
    }
    if let Some(grade) = grade.as_ref() {
        classes.retain(|c| &c.grade == grade);
    }
    if let Some(subject) = subject.as_ref() {
        classes.retain(|c| &c.subject == subject);
    }

    let rows: Vec<serde_json::Value> = classes.iter().map(|c| class_row(state, c)).collect();
    ok(&req.id, json!({ "classes": rows }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut missing: Vec<&str> = Vec::new();
    let text = |key: &str| -> Option<String> {
        req.params
            .get(key)
            .and_then(|v| v.as_str())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let name = text("name");
    if name.is_none() {
        missing.push("name");
    }
    let grade = text("grade");
    if grade.is_none() {
        missing.push("grade");
    }
    let subject = text("subject");
    if subject.is_none() {
        missing.push("subject");
    }
    if !missing.is_empty() {
        return err(
            &req.id,
            "bad_params",
            "missing required fields",
            Some(json!({ "missing": missing })),
        );
    }

    let schedule: Vec<ScheduleSlot> = req
        .params
        .get("schedule")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let now = Utc::now();
    let class = Class {
        id: Uuid::new_v4().to_string(),
        name: name.expect("validated"),
        grade: grade.expect("validated"),
        subject: subject.expect("validated"),
        teacher_id: state
            .store
            .teacher
            .as_ref()
            .map(|t| t.id.clone())
            .unwrap_or_else(|| "1".to_string()),
        student_ids: Vec::new(),
        schedule,
        room: text("room").unwrap_or_default(),
        description: text("description"),
        created_at: now,
        academic_year: text("academicYear").unwrap_or_else(|| academic_year_for(now)),
    };

    let result = json!({ "class": &class });
    state.dispatch(Action::AddClass(class));
    ok(&req.id, result)
}

fn handle_classes_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(payload) = req.params.get("class") else {
        return err(&req.id, "bad_params", "missing class", None);
    };
    let class: Class = match serde_json::from_value(payload.clone()) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "bad_params", format!("invalid class: {}", e), None),
    };
    state.dispatch(Action::UpdateClass(class));
    ok(&req.id, json!({ "ok": true }))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing classId", None);
    };
    // Cascades through assessments, grade entries and student memberships in
    // the reducer; deleting an unknown id is a no-op.
    state.dispatch(Action::DeleteClass(class_id.to_string()));
    ok(&req.id, json!({ "ok": true }))
}

fn membership_params(req: &Request) -> Result<(String, String), serde_json::Value> {
    let class_id = req
        .params
        .get("classId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(&req.id, "bad_params", "missing classId", None))?;
    let student_id = req
        .params
        .get("studentId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(&req.id, "bad_params", "missing studentId", None))?;
    Ok((class_id.to_string(), student_id.to_string()))
}

fn handle_classes_enroll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (class_id, student_id) = match membership_params(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    state.dispatch(Action::EnrollStudent {
        class_id,
        student_id,
    });
    ok(&req.id, json!({ "ok": true }))
}

fn handle_classes_unenroll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (class_id, student_id) = match membership_params(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    state.dispatch(Action::UnenrollStudent {
        class_id,
        student_id,
    });
    ok(&req.id, json!({ "ok": true }))
}

fn handle_classes_details(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing classId", None);
    };
    let Some(class) = state.store.classes.iter().find(|c| c.id == class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    let roster: Vec<serde_json::Value> = class
        .student_ids
        .iter()
        .map(|student_id| {
            let student = state.store.students.iter().find(|s| &s.id == student_id);
            json!({
                "studentId": student_id,
                "name": student
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| "Unknown Student".to_string()),
                "overallGrade": student.map(|s| s.overall_grade),
            })
        })
        .collect();

    let known_grades: Vec<f64> = roster
        .iter()
        .filter_map(|r| r.get("overallGrade").and_then(|v| v.as_f64()))
        .collect();
    let roster_average = if known_grades.is_empty() {
        None
    } else {
        Some(round1(
            known_grades.iter().sum::<f64>() / known_grades.len() as f64,
        ))
    };

    let roster_size = class.student_ids.len();
    let assessments: Vec<serde_json::Value> = state
        .store
        .assessments
        .iter()
        .filter(|a| a.class_id == class.id)
        .map(|a| {
            let graded_count = class
                .student_ids
                .iter()
                .filter(|student_id| {
                    state
                        .store
                        .grade_entries
                        .iter()
                        .any(|g| g.assessment_id == a.id && &g.student_id == *student_id)
                })
                .count();
            let completion = if roster_size > 0 {
                round1(graded_count as f64 * 100.0 / roster_size as f64)
            } else {
                0.0
            };
            json!({
                "assessmentId": a.id,
                "title": a.title,
                "type": a.kind.as_str(),
                "dueDate": a.due_date,
                "gradedCount": graded_count,
                "rosterCount": roster_size,
                "completionPercent": completion
            })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "class": class,
            "roster": roster,
            "rosterAverage": roster_average,
            "assessments": assessments
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.update" => Some(handle_classes_update(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        "classes.enrollStudent" => Some(handle_classes_enroll(state, req)),
        "classes.unenrollStudent" => Some(handle_classes_unenroll(state, req)),
        "classes.details" => Some(handle_classes_details(state, req)),
        _ => None,
    }
}
