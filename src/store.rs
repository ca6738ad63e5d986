use crate::analytics::AnalyticsSnapshot;
use crate::demo;
use crate::model::{
    Assessment, Class, GradeEntry, Student, Subject, Teacher,
};

/// Single source of truth: all domain collections plus transient UI state.
/// Mutated only through [`reduce`].
#[derive(Debug, Clone)]
pub struct State {
    pub teacher: Option<Teacher>,
    pub students: Vec<Student>,
    pub subjects: Vec<Subject>,
    pub classes: Vec<Class>,
    pub assessments: Vec<Assessment>,
    pub grade_entries: Vec<GradeEntry>,
    pub analytics: Option<AnalyticsSnapshot>,
    pub current_view: String,
    pub dark_mode: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            teacher: None,
            students: Vec::new(),
            subjects: demo::subject_catalog(),
            classes: Vec::new(),
            assessments: Vec::new(),
            grade_entries: Vec::new(),
            analytics: None,
            current_view: "dashboard".to_string(),
            dark_mode: false,
        }
    }
}

/// The closed set of state transitions. Every variant is a total function of
/// the current state: update/delete against an unknown id finds no match and
/// leaves the collection unchanged rather than failing.
#[derive(Debug, Clone)]
pub enum Action {
    SetTeacher(Teacher),
    AddStudent(Student),
    UpdateStudent(Student),
    DeleteStudent(String),
    BulkAddStudents(Vec<Student>),
    AddClass(Class),
    UpdateClass(Class),
    DeleteClass(String),
    EnrollStudent { class_id: String, student_id: String },
    UnenrollStudent { class_id: String, student_id: String },
    AddAssessment(Assessment),
    UpdateAssessment(Assessment),
    DeleteAssessment(String),
    AddGradeEntry(GradeEntry),
    UpdateGradeEntry(GradeEntry),
    DeleteGradeEntry(String),
    SetView(String),
    ToggleDarkMode,
    ReplaceAnalytics(AnalyticsSnapshot),
    LoadDemoData,
}

/// Pure state transition: the targeted collection is rebuilt, never patched
/// in place.
pub fn reduce(state: &State, action: Action) -> State {
    let mut next = state.clone();
    match action {
        Action::SetTeacher(teacher) => {
            next.teacher = Some(teacher);
        }
        Action::AddStudent(student) => {
            next.students.push(student);
        }
        Action::UpdateStudent(student) => {
            next.students = next
                .students
                .into_iter()
                .map(|s| if s.id == student.id { student.clone() } else { s })
                .collect();
        }
        Action::DeleteStudent(student_id) => {
            next.students.retain(|s| s.id != student_id);
            // Keep rosters consistent with the student list.
            next.classes = next
                .classes
                .into_iter()
                .map(|mut c| {
                    c.student_ids.retain(|id| *id != student_id);
                    c
                })
                .collect();
        }
        Action::BulkAddStudents(students) => {
            next.students.extend(students);
        }
        Action::AddClass(class) => {
            next.classes.push(class);
        }
        Action::UpdateClass(class) => {
            next.classes = next
                .classes
                .into_iter()
                .map(|c| if c.id == class.id { class.clone() } else { c })
                .collect();
        }
        Action::DeleteClass(class_id) => {
            // Explicit cascade in dependency order: entries of the class's
            // assessments, the assessments, membership rows, the class.
            let assessment_ids: Vec<String> = next
                .assessments
                .iter()
                .filter(|a| a.class_id == class_id)
                .map(|a| a.id.clone())
                .collect();
            next.grade_entries
                .retain(|g| !assessment_ids.contains(&g.assessment_id));
            next.assessments.retain(|a| a.class_id != class_id);
            next.students = next
                .students
                .into_iter()
                .map(|mut s| {
                    s.class_ids.retain(|id| *id != class_id);
                    s
                })
                .collect();
            next.classes.retain(|c| c.id != class_id);
        }
        Action::EnrollStudent {
            class_id,
            student_id,
        } => {
            next.classes = next
                .classes
                .into_iter()
                .map(|mut c| {
                    if c.id == class_id && !c.student_ids.contains(&student_id) {
                        c.student_ids.push(student_id.clone());
                    }
                    c
                })
                .collect();
            next.students = next
                .students
                .into_iter()
                .map(|mut s| {
                    if s.id == student_id && !s.class_ids.contains(&class_id) {
                        s.class_ids.push(class_id.clone());
                    }
                    s
                })
                .collect();
        }
        Action::UnenrollStudent {
            class_id,
            student_id,
        } => {
            next.classes = next
                .classes
                .into_iter()
                .map(|mut c| {
                    if c.id == class_id {
                        c.student_ids.retain(|id| *id != student_id);
                    }
                    c
                })
                .collect();
            next.students = next
                .students
                .into_iter()
                .map(|mut s| {
                    if s.id == student_id {
                        s.class_ids.retain(|id| *id != class_id);
                    }
                    s
                })
                .collect();
        }
        Action::AddAssessment(assessment) => {
            next.assessments.push(assessment);
        }
        Action::UpdateAssessment(assessment) => {
            next.assessments = next
                .assessments
                .into_iter()
                .map(|a| {
                    if a.id == assessment.id {
                        assessment.clone()
                    } else {
                        a
                    }
                })
                .collect();
        }
        Action::DeleteAssessment(assessment_id) => {
            next.grade_entries
                .retain(|g| g.assessment_id != assessment_id);
            next.assessments.retain(|a| a.id != assessment_id);
        }
        Action::AddGradeEntry(entry) => {
            next.grade_entries.push(entry);
        }
        Action::UpdateGradeEntry(entry) => {
            next.grade_entries = next
                .grade_entries
                .into_iter()
                .map(|g| if g.id == entry.id { entry.clone() } else { g })
                .collect();
        }
        Action::DeleteGradeEntry(entry_id) => {
            next.grade_entries.retain(|g| g.id != entry_id);
        }
        Action::SetView(view) => {
            next.current_view = view;
        }
        Action::ToggleDarkMode => {
            next.dark_mode = !next.dark_mode;
        }
        Action::ReplaceAnalytics(snapshot) => {
            next.analytics = Some(snapshot);
        }
        Action::LoadDemoData => {
            demo::seed(&mut next);
        }
    }
    next
}
