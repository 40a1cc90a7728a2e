//! Expression evaluation in release or spot context

use crate::error::SyncError;
use crate::place::remote::client::{status_error, HttpClient};
use crate::place::remote::target::extend_url;
use reqwest::Url;
use tracing::{debug, instrument};

/// Outcome of an evaluation: the value, or the exception raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub ok: bool,
    pub output: String,
}

/// Evaluate `expr` in the release code of `app`, or in `spot` when given.
#[instrument(skip(client, server, expr))]
pub fn evaluate(
    client: &HttpClient,
    server: &Url,
    app: &str,
    spot: Option<&str>,
    expr: &str,
) -> Result<Evaluation, SyncError> {
    let url = extend_url(server, &["apps", app, "eval", ""])?;
    let reply = client.post_form(url, &[("spot", spot.unwrap_or("")), ("expr", expr)])?;
    if !reply.status.is_success() {
        return Err(status_error(&reply, &format!("App \"{}\"", app)));
    }
    let evaluation = parse_evaluation(&reply.text())?;
    debug!(ok = evaluation.ok, "Evaluation finished");
    Ok(evaluation)
}

fn parse_evaluation(body: &str) -> Result<Evaluation, SyncError> {
    let (status, output) = body.split_once('\n').ok_or_else(|| {
        SyncError::Protocol("evaluation response has no status line".to_string())
    })?;
    Ok(Evaluation {
        ok: status == "OK",
        output: output.to_string(),
    })
}
