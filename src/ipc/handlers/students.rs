use std::path::PathBuf;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::import;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::params::{optional_str, search_term, string_list};
use crate::ipc::types::{AppState, Request};
use crate::model::{
    Address, Contact, EmergencyContact, MedicalInfo, ParentContacts, Student,
    SubjectPerformance, TrendMark,
};
use crate::store::Action;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let search = search_term(&req.params);
    let grade = optional_str(&req.params, "grade");
    let subject = optional_str(&req.params, "subject");

    let mut students: Vec<&Student> = state.store.students.iter().collect();
    if let Some(search) = search.as_ref() {
        students.retain(|s| s.name.to_ascii_lowercase().contains(search));
    }
    if let Some(grade) = grade.as_ref() {
        students.retain(|s| &s.grade == grade);
    }
    if let Some(subject) = subject.as_ref() {
        students.retain(|s| s.subjects.contains(subject));
    }

    ok(
        &req.id,
        json!({
            "students": students,
            "totalCount": state.store.students.len()
        }),
    )
}

/// Creation-form validation: every missing required field is reported at
/// once, so the form can mark them all.
fn student_from_form(payload: &serde_json::Value) -> Result<Student, serde_json::Value> {
    let mut missing: Vec<&str> = Vec::new();

    let text = |key: &str| -> Option<String> {
        payload
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
    let age = payload.get("age").and_then(|v| v.as_u64());
    if age.is_none() {
        missing.push("age");
    }

    let primary_value = payload
        .get("parentContacts")
        .and_then(|v| v.get("primary"))
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    for key in ["name", "email", "phone"] {
        let present = primary_value
            .get(key)
            .and_then(|v| v.as_str())
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !present {
            match key {
                "name" => missing.push("parentContacts.primary.name"),
                "email" => missing.push("parentContacts.primary.email"),
                _ => missing.push("parentContacts.primary.phone"),
            }
        }
    }

    if !missing.is_empty() {
        return Err(json!({ "missing": missing }));
    }

    let primary: Contact = serde_json::from_value(primary_value).unwrap_or_default();
    let secondary: Option<Contact> = payload
        .get("parentContacts")
        .and_then(|v| v.get("secondary"))
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok());

    let emergency: EmergencyContact = payload
        .get("emergencyContact")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_else(|| EmergencyContact {
            name: primary.name.clone(),
            phone: primary.phone.clone(),
            relationship: "Emergency Contact".to_string(),
        });

    let address: Option<Address> = payload
        .get("address")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok());
    let medical_info: MedicalInfo = payload
        .get("medicalInfo")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let subjects = {
        let listed = string_list(payload, "subjects");
        if listed.is_empty() {
            vec!["Mathematics".to_string(), "English".to_string()]
        } else {
            listed
        }
    };

    Ok(Student {
        id: Uuid::new_v4().to_string(),
        name: name.expect("validated"),
        grade: grade.expect("validated"),
        age: age.expect("validated") as u32,
        performance: subjects
            .iter()
            .map(|subject| SubjectPerformance {
                subject: subject.clone(),
                grade: 0.0,
                trend: TrendMark::Stable,
            })
            .collect(),
        subjects,
        overall_grade: 0.0,
        parent_contacts: ParentContacts { primary, secondary },
        emergency_contact: emergency,
        address,
        medical_info,
        enrollment_date: Utc::now().date_naive(),
        class_ids: Vec::new(),
    })
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(payload) = req.params.get("student") else {
        return err(&req.id, "bad_params", "missing student", None);
    };
    let student = match student_from_form(payload) {
        Ok(s) => s,
        Err(details) => {
            return err(
                &req.id,
                "bad_params",
                "missing required fields",
                Some(details),
            )
        }
    };
    let result = json!({ "student": &student });
    state.dispatch(Action::AddStudent(student));
    ok(&req.id, result)
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(payload) = req.params.get("student") else {
        return err(&req.id, "bad_params", "missing student", None);
    };
    let student: Student = match serde_json::from_value(payload.clone()) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "bad_params", format!("invalid student: {}", e), None),
    };
    // Unknown ids fall through the reducer untouched.
    state.dispatch(Action::UpdateStudent(student));
    ok(&req.id, json!({ "ok": true }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    state.dispatch(Action::DeleteStudent(student_id.to_string()));
    ok(&req.id, json!({ "ok": true }))
}

fn handle_students_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let text = if let Some(text) = req.params.get("text").and_then(|v| v.as_str()) {
        text.to_string()
    } else if let Some(path) = req.params.get("path").and_then(|v| v.as_str()) {
        match import::read_import_file(&PathBuf::from(path)) {
            Ok(t) => t,
            Err(e) => return err(&req.id, "file_read_failed", format!("{e:#}"), None),
        }
    } else {
        return err(&req.id, "bad_params", "missing text or path", None);
    };

    match import::parse_students(&text, Utc::now().date_naive()) {
        Ok(report) => {
            let imported = report.students.len();
            tracing::info!(imported, rejected = report.row_errors.len(), "bulk import");
            let students_json = json!(&report.students);
            state.dispatch(Action::BulkAddStudents(report.students));
            ok(
                &req.id,
                json!({
                    "imported": imported,
                    "students": students_json,
                    "errors": report.row_errors
                }),
            )
        }
        // The whole file is rejected; the message is surfaced as the single
        // collected error, never as a protocol failure.
        Err(fatal) => ok(
            &req.id,
            json!({
                "imported": 0,
                "students": [],
                "errors": [fatal.to_string()]
            }),
        ),
    }
}

fn handle_students_import_template(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "fileName": import::TEMPLATE_FILE_NAME,
            "content": import::template()
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.import" => Some(handle_students_import(state, req)),
        "students.importTemplate" => Some(handle_students_import_template(state, req)),
        _ => None,
    }
}
