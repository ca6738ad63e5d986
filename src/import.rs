use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use uuid::Uuid;

use crate::model::{
    Address, Contact, EmergencyContact, MedicalInfo, ParentContacts, Student,
    SubjectPerformance, TrendMark,
};

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "name",
    "grade",
    "age",
    "primary_contact_name",
    "primary_contact_email",
    "primary_contact_phone",
];

const TEMPLATE_COLUMNS: [&str; 22] = [
    "name",
    "grade",
    "age",
    "primary_contact_name",
    "primary_contact_email",
    "primary_contact_phone",
    "primary_contact_relationship",
    "secondary_contact_name",
    "secondary_contact_email",
    "secondary_contact_phone",
    "secondary_contact_relationship",
    "emergency_contact_name",
    "emergency_contact_phone",
    "emergency_contact_relationship",
    "street",
    "city",
    "state",
    "zip_code",
    "subjects",
    "allergies",
    "medications",
    "conditions",
];

pub const TEMPLATE_FILE_NAME: &str = "student_import_template.csv";

/// Fatal import failures: the whole file is rejected and nothing is added.
/// Row-level problems are collected in [`ImportReport::row_errors`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    TooShort,
    MissingColumns(Vec<String>),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::TooShort => {
                write!(f, "File must contain at least a header row and one data row")
            }
            ImportError::MissingColumns(columns) => {
                write!(f, "Missing required columns: {}", columns.join(", "))
            }
        }
    }
}

impl std::error::Error for ImportError {}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub students: Vec<Student>,
    pub row_errors: Vec<String>,
}

pub fn read_import_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("read import file {}", path.display()))
}

fn field<'a>(
    record: &'a StringRecord,
    columns: &HashMap<String, usize>,
    name: &str,
) -> &'a str {
    columns
        .get(name)
        .and_then(|idx| record.get(*idx))
        .unwrap_or("")
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split([';', ','])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Parse a delimited student file. Missing required columns reject the whole
/// file; malformed rows are skipped with a collected error while well-formed
/// rows still import.
pub fn parse_students(text: &str, today: NaiveDate) -> Result<ImportReport, ImportError> {
    if text.lines().filter(|l| !l.trim().is_empty()).count() < 2 {
        return Err(ImportError::TooShort);
    }

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|_| ImportError::TooShort)?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    let columns: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), idx))
        .collect();

    let mut students = Vec::new();
    let mut row_errors = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                row_errors.push(format!("Row {}: malformed row", line));
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != headers.len() {
            row_errors.push(format!("Row {}: column count mismatch", line));
            continue;
        }

        let name = field(&record, &columns, "name");
        let grade = field(&record, &columns, "grade");
        let age_raw = field(&record, &columns, "age");
        if name.is_empty() || grade.is_empty() || age_raw.is_empty() {
            row_errors.push(format!(
                "Row {}: missing required fields (name, grade, age)",
                line
            ));
            continue;
        }
        let age: u32 = match age_raw.parse() {
            Ok(v) => v,
            Err(_) => {
                row_errors.push(format!("Row {}: invalid age '{}'", line, age_raw));
                continue;
            }
        };

        let subjects = {
            let listed = split_list(field(&record, &columns, "subjects"));
            if listed.is_empty() {
                vec!["Mathematics".to_string(), "English".to_string()]
            } else {
                listed
            }
        };

        let primary = Contact {
            name: field(&record, &columns, "primary_contact_name").to_string(),
            email: field(&record, &columns, "primary_contact_email").to_string(),
            phone: field(&record, &columns, "primary_contact_phone").to_string(),
            relationship: {
                let r = field(&record, &columns, "primary_contact_relationship");
                if r.is_empty() { "Parent" } else { r }.to_string()
            },
        };
        let secondary_name = field(&record, &columns, "secondary_contact_name");
        let secondary = if secondary_name.is_empty() {
            None
        } else {
            Some(Contact {
                name: secondary_name.to_string(),
                email: field(&record, &columns, "secondary_contact_email").to_string(),
                phone: field(&record, &columns, "secondary_contact_phone").to_string(),
                relationship: {
                    let r = field(&record, &columns, "secondary_contact_relationship");
                    if r.is_empty() { "Parent" } else { r }.to_string()
                },
            })
        };

        // Emergency contact falls back to the primary contact.
        let emergency_name = field(&record, &columns, "emergency_contact_name");
        let emergency = EmergencyContact {
            name: if emergency_name.is_empty() {
                primary.name.clone()
            } else {
                emergency_name.to_string()
            },
            phone: {
                let p = field(&record, &columns, "emergency_contact_phone");
                if p.is_empty() {
                    primary.phone.clone()
                } else {
                    p.to_string()
                }
            },
            relationship: {
                let r = field(&record, &columns, "emergency_contact_relationship");
                if r.is_empty() { "Emergency Contact" } else { r }.to_string()
            },
        };

        let street = field(&record, &columns, "street");
        let address = if street.is_empty() {
            None
        } else {
            Some(Address {
                street: street.to_string(),
                city: field(&record, &columns, "city").to_string(),
                state: field(&record, &columns, "state").to_string(),
                zip_code: field(&record, &columns, "zip_code").to_string(),
            })
        };

        students.push(Student {
            id: format!("imported-{}", Uuid::new_v4()),
            name: name.to_string(),
            grade: grade.to_string(),
            age,
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
            medical_info: MedicalInfo {
                allergies: split_list(field(&record, &columns, "allergies")),
                medications: split_list(field(&record, &columns, "medications")),
                conditions: split_list(field(&record, &columns, "conditions")),
            },
            enrollment_date: today,
            class_ids: Vec::new(),
        });
    }

    Ok(ImportReport {
        students,
        row_errors,
    })
}

/// The sample file offered by the "download template" action. Written through
/// the csv writer so quoting always matches what the importer accepts.
pub fn template() -> String {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(TEMPLATE_COLUMNS)
        .expect("write template header");
    writer
        .write_record([
            "John Doe",
            "Grade 4",
            "9",
            "Jane Doe",
            "jane.doe@email.com",
            "+1-555-0123",
            "Mother",
            "John Doe Sr.",
            "john.doe@email.com",
            "+1-555-0124",
            "Father",
            "Jane Doe",
            "+1-555-0123",
            "Mother",
            "123 Main St",
            "Springfield",
            "IL",
            "62701",
            "Mathematics,English,Science",
            "",
            "",
            "",
        ])
        .expect("write template row");
    writer
        .write_record([
            "Jane Smith",
            "Grade 4",
            "10",
            "Mary Smith",
            "mary.smith@email.com",
            "+1-555-0125",
            "Mother",
            "",
            "",
            "",
            "",
            "Mary Smith",
            "+1-555-0125",
            "Mother",
            "456 Oak Ave",
            "Springfield",
            "IL",
            "62702",
            "Mathematics,English,Science",
            "",
            "",
            "",
        ])
        .expect("write template row");
    let bytes = writer.into_inner().expect("flush template");
    String::from_utf8(bytes).expect("template is utf-8")
}
