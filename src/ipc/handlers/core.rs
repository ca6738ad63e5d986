use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::handlers::params::required_str;
use crate::ipc::types::{AppState, Request};
use crate::store::Action;

fn counts_json(state: &AppState) -> serde_json::Value {
    json!({
        "students": state.store.students.len(),
        "classes": state.store.classes.len(),
        "assessments": state.store.assessments.len(),
        "gradeEntries": state.store.grade_entries.len(),
        "subjects": state.store.subjects.len(),
    })
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "counts": counts_json(state)
        }),
    )
}

fn handle_demo_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.dispatch(Action::LoadDemoData);
    tracing::info!(
        students = state.store.students.len(),
        classes = state.store.classes.len(),
        "demo data loaded"
    );
    ok(&req.id, json!({ "loaded": true, "counts": counts_json(state) }))
}

fn handle_view_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match required_str(req, "view") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    state.dispatch(Action::SetView(view.clone()));
    ok(&req.id, json!({ "currentView": view }))
}

fn handle_theme_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.dispatch(Action::ToggleDarkMode);
    ok(&req.id, json!({ "darkMode": state.store.dark_mode }))
}

fn handle_state_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "counts": counts_json(state),
            "currentView": state.store.current_view,
            "darkMode": state.store.dark_mode,
            "teacher": state.store.teacher,
            "subjects": state.store.subjects,
            "analyticsLastUpdated": state
                .store
                .analytics
                .as_ref()
                .map(|a| a.last_updated),
        }),
    )
}

fn handle_teacher_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(payload) = req.params.get("teacher") else {
        return err(&req.id, "bad_params", "missing teacher", None);
    };
    let teacher = match serde_json::from_value(payload.clone()) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "bad_params", format!("invalid teacher: {}", e), None),
    };
    state.dispatch(Action::SetTeacher(teacher));
    ok(&req.id, json!({ "teacher": state.store.teacher }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "demo.load" => Some(handle_demo_load(state, req)),
        "view.set" => Some(handle_view_set(state, req)),
        "theme.toggle" => Some(handle_theme_toggle(state, req)),
        "state.summary" => Some(handle_state_summary(state, req)),
        "teacher.set" => Some(handle_teacher_set(state, req)),
        _ => None,
    }
}
