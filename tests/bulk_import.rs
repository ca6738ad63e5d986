mod test_support;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar};

#[test]
fn missing_required_column_rejects_the_whole_file() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let text = "name,grade,primary_contact_name,primary_contact_email,primary_contact_phone\n\
                Emma Thompson,Grade 4,Jane,jane@example.com,555-0001";
    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.import",
        json!({ "text": text }),
    );
    assert_eq!(result["imported"], 0);
    assert_eq!(result["errors"], json!(["Missing required columns: age"]));

    let listed = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert!(listed["students"].as_array().unwrap().is_empty());
}

#[test]
fn malformed_rows_are_skipped_while_good_rows_import() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let text = "name,grade,age,primary_contact_name,primary_contact_email,primary_contact_phone\n\
                Emma Thompson,Grade 4,9,Jane,jane@example.com,555-0001\n\
                Broken Row,Grade 4,9\n\
                Sofia Chen,Grade 4,9,Wei,wei@example.com,555-0003";
    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.import",
        json!({ "text": text }),
    );
    assert_eq!(result["imported"], 2);
    let errors = result["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0], "Row 3: column count mismatch");

    let listed = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    let students = listed["students"].as_array().unwrap();
    assert_eq!(students.len(), 2);
    // Imported students start ungraded with defaulted subjects.
    for student in students {
        assert_eq!(student["overallGrade"], 0.0);
        assert_eq!(student["subjects"], json!(["Mathematics", "English"]));
        assert!(student["classIds"].as_array().unwrap().is_empty());
    }
}

#[test]
fn downloaded_template_imports_cleanly() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let template = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.importTemplate",
        json!({}),
    );
    assert_eq!(template["fileName"], "student_import_template.csv");
    let content = template["content"].as_str().expect("template content");

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.import",
        json!({ "text": content }),
    );
    assert_eq!(result["imported"], 2);
    assert!(result["errors"].as_array().unwrap().is_empty());

    let listed = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    let students = listed["students"].as_array().unwrap();
    // The quoted subject list stays one field.
    assert_eq!(
        students[0]["subjects"],
        json!(["Mathematics", "English", "Science"])
    );
    assert_eq!(students[0]["name"], "John Doe");
    assert_eq!(students[1]["parentContacts"]["secondary"], json!(null));
}
