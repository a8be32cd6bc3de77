//! `/render/` endpoint.
//!
//! Always answers 200 with a JSON array. Upstream failures only show up as
//! missing series.

use std::sync::Arc;

use axum::{
    extract::{Extension, Form, Query},
    http::header,
    response::{IntoResponse, Response},
};
use carbon_common::TimeRange;
use carbon_protocol::{media_types, params, FetchResponse};
use chrono::Utc;
use tracing::{info, warn};

use crate::state::AppState;

type FormPairs = Vec<(String, String)>;

/// Render parameters gathered from the query string and form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderParams {
    pub targets: Vec<String>,
    pub from: String,
    pub until: String,
}

impl RenderParams {
    /// Every `target` is kept in order; `from`/`until` take their first value.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut targets = Vec::new();
        let mut from = None;
        let mut until = None;

        for (key, value) in pairs {
            match key.as_str() {
                params::TARGET => targets.push(value),
                params::FROM if from.is_none() => from = Some(value),
                params::UNTIL if until.is_none() => until = Some(value),
                _ => {}
            }
        }

        Self {
            targets,
            from: from.unwrap_or_default(),
            until: until.unwrap_or_default(),
        }
    }
}

/// GET /render/
pub async fn render_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Option<Query<FormPairs>>,
) -> Response {
    let pairs = query.map(|Query(pairs)| pairs).unwrap_or_default();
    render(&state, RenderParams::from_pairs(pairs)).await
}

/// POST /render/ - body values come before query values.
pub async fn render_form_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Option<Query<FormPairs>>,
    form: Option<Form<FormPairs>>,
) -> Response {
    let body = form.map(|Form(pairs)| pairs).unwrap_or_default();
    let query = query.map(|Query(pairs)| pairs).unwrap_or_default();
    render(&state, RenderParams::from_pairs(body.into_iter().chain(query))).await
}

async fn render(state: &AppState, params: RenderParams) -> Response {
    let range = TimeRange::from_params(&params.from, &params.until, Utc::now());
    state.metrics.record_render_request(params.targets.len());

    let results = state.aggregator.render(&params.targets, range).await;

    state.metrics.record_series_returned(results.len());
    info!(
        targets = params.targets.len(),
        series = results.len(),
        from = range.from,
        until = range.until,
        "Render request complete"
    );

    json_response(&results)
}

fn json_response(results: &[FetchResponse]) -> Response {
    let body = match serde_json::to_vec(results) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Failed to encode render results");
            b"[]".to_vec()
        }
    };

    ([(header::CONTENT_TYPE, media_types::JSON)], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> FormPairs {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_params_repeated_targets() {
        let params = RenderParams::from_pairs(pairs(&[
            ("target", "a.*"),
            ("from", "20240101"),
            ("target", "b.*"),
            ("until", "20240102"),
            ("format", "json"),
        ]));

        assert_eq!(params.targets, vec!["a.*", "b.*"]);
        assert_eq!(params.from, "20240101");
        assert_eq!(params.until, "20240102");
    }

    #[test]
    fn test_params_first_value_wins() {
        let params = RenderParams::from_pairs(pairs(&[
            ("from", "body"),
            ("from", "query"),
            ("until", ""),
            ("until", "ignored"),
        ]));

        assert_eq!(params.from, "body");
        assert_eq!(params.until, "");
        assert!(params.targets.is_empty());
    }

    #[test]
    fn test_params_empty() {
        assert_eq!(RenderParams::from_pairs(Vec::new()), RenderParams::default());
    }

    #[test]
    fn test_empty_results_encode_as_array() {
        let response = json_response(&[]);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            media_types::JSON
        );
    }
}
