use chrono::Utc;
use serde_json::json;

use crate::analytics::{generate, AnalyticsContext};
use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use crate::store::Action;

fn handle_analytics_refresh(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot = {
        let ctx = AnalyticsContext {
            students: &state.store.students,
            grade_entries: &state.store.grade_entries,
            assessments: &state.store.assessments,
        };
        generate(&ctx, Utc::now())
    };
    tracing::info!(
        insights = snapshot.insights.len(),
        trends = snapshot.trends.len(),
        gaps = snapshot.learning_gaps.len(),
        alerts = snapshot.alerts.len(),
        "analytics snapshot refreshed"
    );

    let result = json!({ "analytics": &snapshot });
    state.dispatch(Action::ReplaceAnalytics(snapshot));
    ok(&req.id, result)
}

fn handle_analytics_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.store.analytics.as_ref() {
        Some(snapshot) => ok(
            &req.id,
            json!({
                "analytics": snapshot,
                "lastUpdated": snapshot.last_updated
            }),
        ),
        None => ok(
            &req.id,
            json!({
                "analytics": serde_json::Value::Null,
                "lastUpdated": serde_json::Value::Null
            }),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.refresh" => Some(handle_analytics_refresh(state, req)),
        "analytics.get" => Some(handle_analytics_get(state, req)),
        _ => None,
    }
}
