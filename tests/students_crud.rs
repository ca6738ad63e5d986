mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

fn student_form(name: &str, grade: &str, age: u32, subjects: &[&str]) -> serde_json::Value {
    json!({
        "student": {
            "name": name,
            "grade": grade,
            "age": age,
            "subjects": subjects,
            "parentContacts": {
                "primary": {
                    "name": "Jordan Brown",
                    "email": "jordan.brown@example.com",
                    "phone": "+1-555-0199",
                    "relationship": "Parent"
                }
            }
        }
    })
}

#[test]
fn create_validates_required_fields_all_at_once() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({ "student": { "name": "Ava Brown" } }),
    );
    assert_eq!(error["code"], "bad_params");
    let missing: Vec<&str> = error["details"]["missing"]
        .as_array()
        .expect("missing list")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(missing.contains(&"grade"));
    assert!(missing.contains(&"age"));
    assert!(missing.contains(&"parentContacts.primary.email"));
    assert!(!missing.contains(&"name"));

    // Nothing was added.
    let listed = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert!(listed["students"].as_array().unwrap().is_empty());
}

#[test]
fn create_list_filter_update_delete_flow() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        student_form("Ava Brown", "Grade 5", 10, &["Mathematics", "Science"]),
    );
    let student = created["student"].clone();
    let student_id = student["id"].as_str().expect("student id").to_string();
    assert_eq!(student["overallGrade"], 0.0);
    assert_eq!(student["performance"].as_array().unwrap().len(), 2);
    assert_eq!(student["emergencyContact"]["name"], "Jordan Brown");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        student_form("Noah Green", "Grade 4", 9, &["English"]),
    );

    let by_search = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.list",
        json!({ "search": "ava" }),
    );
    assert_eq!(by_search["students"].as_array().unwrap().len(), 1);
    assert_eq!(by_search["totalCount"], 2);

    let by_grade = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.list",
        json!({ "grade": "Grade 4" }),
    );
    assert_eq!(by_grade["students"].as_array().unwrap().len(), 1);
    assert_eq!(by_grade["students"][0]["name"], "Noah Green");

    let by_subject = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.list",
        json!({ "subject": "Science" }),
    );
    assert_eq!(by_subject["students"].as_array().unwrap().len(), 1);

    let mut updated = student.clone();
    updated["name"] = json!("Ava Brown-Lee");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.update",
        json!({ "student": updated }),
    );
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.list",
        json!({ "search": "brown-lee" }),
    );
    assert_eq!(listed["students"].as_array().unwrap().len(), 1);

    // Updating a student that does not exist changes nothing and does not
    // fail.
    let mut ghost = student.clone();
    ghost["id"] = json!("no-such-student");
    ghost["name"] = json!("Nobody");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.update",
        json!({ "student": ghost }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "9", "students.list", json!({}));
    assert_eq!(listed["students"].as_array().unwrap().len(), 2);
    assert!(listed["students"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["name"] != "Nobody"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "students.delete",
        json!({ "studentId": student_id }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "11", "students.list", json!({}));
    assert_eq!(listed["students"].as_array().unwrap().len(), 1);
}
