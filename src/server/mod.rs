//! The entry form served over HTTP. `GET /` shows the day's totals and an empty form with one
//! line per entry of a batch. `POST /` submits the filled lines and shows the page again with the
//! outcome.

mod page;

use crate::error::Res;
use crate::model::{Entry, BATCH_SIZE};
use crate::register::Register;
use anyhow::Context;
use axum::extract::State;
use axum::routing::get;
use axum::{Form, Router};
use maud::Markup;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use page::Banner;

/// Shared by all requests. Submissions are written one at a time.
struct AppState {
    register: Mutex<Register>,
}

/// Serves the form on `addr` until the process receives Ctrl-C.
pub(crate) async fn run(register: Register, addr: SocketAddr) -> Res<()> {
    let state = Arc::new(AppState {
        register: Mutex::new(register),
    });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))?;
    info!("Serving the entry form on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("The form server failed")?;
    info!("Form server stopped");
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_form))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {e}");
    }
}

async fn show_form(State(state): State<Arc<AppState>>) -> Markup {
    let mut register = state.register.lock().await;
    render_page(&mut register, None, &[]).await
}

async fn submit_form(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Markup {
    let entries = entries_from_form(&fields);
    let mut register = state.register.lock().await;
    match register.submit(&entries).await {
        Ok(submission) if submission.count() == 0 => {
            debug!("The form was submitted without any filled line");
            render_page(&mut register, None, &[]).await
        }
        Ok(submission) => {
            let banner = Banner::Success(submission.count());
            render_page(&mut register, Some(&banner), &[]).await
        }
        Err(e) => {
            error!("Submission failed: {e:#}");
            let banner = Banner::Error(format!("{e:#}"));
            // Keep what was typed so that it can be sent again.
            render_page(&mut register, Some(&banner), &entries).await
        }
    }
}

async fn render_page(
    register: &mut Register,
    banner: Option<&Banner>,
    entries: &[Entry],
) -> Markup {
    let date = register.config().now().date_naive();
    match register.today().await {
        Ok(today) => page::render(date, Some(&today), banner, entries),
        Err(e) => {
            error!("Unable to read today's totals: {e:#}");
            let banner = banner
                .cloned()
                .unwrap_or_else(|| Banner::Error(format!("{e:#}")));
            page::render(date, None, Some(&banner), entries)
        }
    }
}

/// Builds the batch from the submitted form fields. The fields of line `i` are named `p{i}`
/// (plate), `q{i}` (quantity), `v{i}` (value), `t{i}` (fee), `a{i}` (addition), `s{i}` (exited)
/// and `f{i}` (payment method). Missing fields are empty and an unknown payment method is read
/// as the default method.
fn entries_from_form(fields: &[(String, String)]) -> Vec<Entry> {
    let fields: HashMap<&str, &str> = fields
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    let field = |letter: char, i: usize| -> String {
        fields
            .get(format!("{letter}{i}").as_str())
            .map(|value| value.to_string())
            .unwrap_or_default()
    };

    (0..BATCH_SIZE)
        .map(|i| Entry {
            plate: field('p', i),
            quantity: field('q', i),
            value: field('v', i),
            fee: field('t', i),
            addition: field('a', i),
            exited: field('s', i),
            method: field('f', i).trim().parse().unwrap_or_default(),
        })
        .collect()
}
