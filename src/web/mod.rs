// Web form: the browser-facing surface of the sentiment pipeline.
//
// GET / renders the form, POST / renders the result below it, and
// POST /api/sentiment speaks JSON. The pipeline uses a blocking HTTP
// client, so every request runs on tokio's blocking pool.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::classifier::SentimentClassifier;
use crate::errors::MoodError;
use crate::services::SentimentService;
use crate::sources::PageFetcher;

const TITLE: &str = "News Article Sentiment Classifier";
const DESCRIPTION: &str = "Classify the sentiment of a news article as positive, negative or \
unrelated with respect to a given person, with a confidence score between 0 and 1 and the \
reasoning behind the classification.";

/// Missing fields arrive as empty strings and are judged by the pipeline
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentInput {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentOutput {
    pub result: String,
}

/// Start the web server and block until it is interrupted.
pub async fn run_server<F, C>(service: Arc<SentimentService<F, C>>, bind: &str) -> anyhow::Result<()>
where
    F: PageFetcher + 'static,
    C: SentimentClassifier + 'static,
{
    let app = build_router(service);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("{} listening on http://{}", TITLE, listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router<F, C>(service: Arc<SentimentService<F, C>>) -> Router
where
    F: PageFetcher + 'static,
    C: SentimentClassifier + 'static,
{
    Router::new()
        .route("/", get(show_form).post(submit_form::<F, C>))
        .route("/api/sentiment", post(api_sentiment::<F, C>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn show_form() -> Html<String> {
    Html(render_page("", "", None))
}

async fn submit_form<F, C>(
    State(service): State<Arc<SentimentService<F, C>>>,
    Form(input): Form<SentimentInput>,
) -> Html<String>
where
    F: PageFetcher + 'static,
    C: SentimentClassifier + 'static,
{
    let page_url = input.url.clone();
    let page_subject = input.subject.clone();
    let result = classify_blocking(service, input).await;
    Html(render_page(&page_url, &page_subject, Some(&result)))
}

async fn api_sentiment<F, C>(
    State(service): State<Arc<SentimentService<F, C>>>,
    Json(input): Json<SentimentInput>,
) -> Json<SentimentOutput>
where
    F: PageFetcher + 'static,
    C: SentimentClassifier + 'static,
{
    let result = classify_blocking(service, input).await;
    Json(SentimentOutput { result })
}

async fn classify_blocking<F, C>(service: Arc<SentimentService<F, C>>, input: SentimentInput) -> String
where
    F: PageFetcher + 'static,
    C: SentimentClassifier + 'static,
{
    tokio::task::spawn_blocking(move || service.get_sentiment(&input.url, &input.subject))
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Sentiment task did not complete");
            MoodError::Classification("request could not be completed".to_string()).user_message()
        })
}

fn render_page(url: &str, subject: &str, result: Option<&str>) -> String {
    let result_block = result
        .map(|r| {
            format!(
                "<section>\n<h2>Sentiment</h2>\n<pre id=\"result\">{}</pre>\n</section>\n",
                escape_html(r)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
label {{ display: block; margin-top: 1rem; }}
input {{ width: 100%; padding: 0.4rem; }}
pre {{ white-space: pre-wrap; background: #f4f4f4; padding: 1rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>{description}</p>
<form method="post" action="/">
<label for="url">Enter URL</label>
<input id="url" name="url" type="url" value="{url}" required>
<label for="subject">Person of Interest</label>
<input id="subject" name="subject" type="text" value="{subject}" required>
<p><button type="submit">Submit</button></p>
</form>
{result_block}</body>
</html>
"#,
        title = TITLE,
        description = DESCRIPTION,
        url = escape_html(url),
        subject = escape_html(subject),
        result_block = result_block,
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
