use axum::{
    Router,
    extract::{Json, Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::core::{
    BuildHoursRollup, EngineError, Field, FieldValue, Line, LineMetrics, PortfolioEngine,
    SubscriptionHoursRollup, TierMetrics,
};

const LOG_ENV: &str = "PORTFOLIO_LOG";
const DEFAULT_LOG_FILTER: &str = "portfolio_explorer=info";

static TRACING: Once = Once::new();

/// Installs the global subscriber. Levels come from `PORTFOLIO_LOG`, e.g.
/// `PORTFOLIO_LOG=portfolio_explorer=debug`. Safe to call more than once.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        // Logs go to stderr so `report` output stays valid JSON.
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    });
}

#[derive(Parser, Debug)]
#[command(
    name = "portfolio-explorer",
    about = "Revenue, capacity and margin explorer for a build-and-retain plus subscription practice"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API for one interactive session.
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print every derived figure for one set of assumptions as JSON.
    Report {
        #[arg(
            long = "set",
            value_name = "FIELD=VALUE",
            value_parser = parse_assignment,
            help = "Override one assumption, e.g. --set hourlyCost=120 or --set teamEnabled=on"
        )]
        set: Vec<(Field, FieldValue)>,
        #[arg(long, help = "Apply a preset mix (AI Heavy, Balanced, NP Heavy, NP Only) first")]
        scenario: Option<String>,
    },
}

fn parse_assignment(raw: &str) -> Result<(Field, FieldValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got `{raw}`"))?;
    let field = name.trim().parse::<Field>().map_err(|e| e.to_string())?;
    let value = value.trim().parse::<FieldValue>()?;
    Ok((field, value))
}

pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve { host, port } => run_http_server(&host, port)
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Report { set, scenario } => {
            let json = run_report(&set, scenario.as_deref())?;
            println!("{json}");
            Ok(())
        }
    }
}

/// The preset is applied before the overrides, so `--set aiClients=4`
/// still wins over the preset's mix.
fn build_report(
    writes: &[(Field, FieldValue)],
    scenario: Option<&str>,
) -> Result<PortfolioEngine, EngineError> {
    let mut engine = PortfolioEngine::default();
    if let Some(name) = scenario {
        engine.apply_scenario(name)?;
    }
    engine.write_many(writes)?;
    Ok(engine)
}

fn run_report(writes: &[(Field, FieldValue)], scenario: Option<&str>) -> Result<String, String> {
    let engine = build_report(writes, scenario).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&engine.snapshot())
        .map_err(|e| format!("Failed to serialize report: {e}"))
}

type SharedEngine = Arc<Mutex<PortfolioEngine>>;

/// A single field write or a list applied atomically.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AssumptionPayload {
    One(AssumptionWrite),
    Many(Vec<AssumptionWrite>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssumptionWrite {
    field: Field,
    value: FieldValue,
}

impl AssumptionPayload {
    fn into_writes(self) -> Vec<(Field, FieldValue)> {
        match self {
            AssumptionPayload::One(write) => vec![(write.field, write.value)],
            AssumptionPayload::Many(writes) => writes
                .into_iter()
                .map(|write| (write.field, write.value))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScenarioPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GridSelectPayload {
    ai: u32,
    np: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LineResponse<'a> {
    metrics: &'a LineMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    tiers: Option<&'a [TierMetrics]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BreakdownResponse<'a> {
    build: &'a BuildHoursRollup,
    subscription: &'a SubscriptionHoursRollup,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn app(engine: SharedEngine) -> Router {
    Router::new()
        .route(
            "/api/assumptions",
            get(assumptions_get_handler).post(assumptions_post_handler),
        )
        .route("/api/scenarios", get(scenarios_handler))
        .route("/api/scenarios/apply", post(scenario_apply_handler))
        .route("/api/grid", get(grid_handler))
        .route("/api/grid/select", post(grid_select_handler))
        .route("/api/breakdown", get(breakdown_handler))
        .route("/api/breakdown/build/commit", post(build_commit_handler))
        .route(
            "/api/breakdown/subscription/commit",
            post(subscription_commit_handler),
        )
        .route("/api/capacity", get(capacity_handler))
        .route("/api/lines/:line", get(line_handler))
        .route("/api/portfolio", get(portfolio_handler))
        .route("/api/timeline", get(timeline_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .fallback(not_found_handler)
        .with_state(engine)
}

pub async fn run_http_server(host: &str, port: u16) -> std::io::Result<()> {
    let engine = Arc::new(Mutex::new(PortfolioEngine::default()));
    let listener = TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "portfolio explorer API listening");
    info!("local access: http://127.0.0.1:{port}/api/snapshot");

    axum::serve(listener, app(engine)).await
}

/// A panicked writer cannot leave the assumptions half-applied, so the
/// engine behind a poisoned lock is still consistent.
fn lock(engine: &SharedEngine) -> MutexGuard<'_, PortfolioEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn assumptions_get_handler(State(engine): State<SharedEngine>) -> Response {
    let engine = lock(&engine);
    json_response(StatusCode::OK, engine.assumptions())
}

async fn assumptions_post_handler(
    State(engine): State<SharedEngine>,
    payload: Result<Json<AssumptionPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    let writes = payload.into_writes();
    let mut engine = lock(&engine);
    match engine.write_many(&writes) {
        Ok(()) => json_response(StatusCode::OK, engine.snapshot()),
        Err(err) => engine_error_response(&err),
    }
}

async fn scenarios_handler(State(engine): State<SharedEngine>) -> Response {
    let engine = lock(&engine);
    json_response(StatusCode::OK, engine.scenarios())
}

async fn scenario_apply_handler(
    State(engine): State<SharedEngine>,
    payload: Result<Json<ScenarioPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    let mut engine = lock(&engine);
    match engine.apply_scenario(&payload.name) {
        Ok(()) => json_response(StatusCode::OK, engine.snapshot()),
        Err(err) => engine_error_response(&err),
    }
}

async fn grid_handler(State(engine): State<SharedEngine>) -> Response {
    let engine = lock(&engine);
    json_response(StatusCode::OK, engine.sensitivity_grid())
}

async fn grid_select_handler(
    State(engine): State<SharedEngine>,
    payload: Result<Json<GridSelectPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    let mut engine = lock(&engine);
    match engine.select_grid_cell(payload.ai, payload.np) {
        Ok(()) => json_response(StatusCode::OK, engine.snapshot()),
        Err(err) => engine_error_response(&err),
    }
}

async fn breakdown_handler(State(engine): State<SharedEngine>) -> Response {
    let engine = lock(&engine);
    json_response(
        StatusCode::OK,
        BreakdownResponse {
            build: engine.build_breakdown(),
            subscription: engine.subscription_breakdown(),
        },
    )
}

async fn build_commit_handler(State(engine): State<SharedEngine>) -> Response {
    let mut engine = lock(&engine);
    match engine.commit_build_breakdown() {
        Ok(()) => json_response(StatusCode::OK, engine.snapshot()),
        Err(err) => engine_error_response(&err),
    }
}

async fn subscription_commit_handler(State(engine): State<SharedEngine>) -> Response {
    let mut engine = lock(&engine);
    match engine.commit_subscription_breakdown() {
        Ok(()) => json_response(StatusCode::OK, engine.snapshot()),
        Err(err) => engine_error_response(&err),
    }
}

async fn capacity_handler(State(engine): State<SharedEngine>) -> Response {
    let engine = lock(&engine);
    json_response(StatusCode::OK, engine.capacity())
}

async fn line_handler(
    State(engine): State<SharedEngine>,
    Path(line): Path<String>,
) -> Response {
    let line = match line.parse::<Line>() {
        Ok(line) => line,
        Err(err) => return engine_error_response(&err),
    };
    let engine = lock(&engine);
    let tiers = match line {
        Line::BuildRetain => None,
        Line::Subscription => Some(engine.subscription_metrics().tiers.as_slice()),
    };
    json_response(
        StatusCode::OK,
        LineResponse {
            metrics: engine.line_metrics(line),
            tiers,
        },
    )
}

async fn portfolio_handler(State(engine): State<SharedEngine>) -> Response {
    let engine = lock(&engine);
    json_response(StatusCode::OK, engine.portfolio())
}

async fn timeline_handler(State(engine): State<SharedEngine>) -> Response {
    let engine = lock(&engine);
    json_response(StatusCode::OK, engine.monthly_timeline())
}

async fn snapshot_handler(State(engine): State<SharedEngine>) -> Response {
    let engine = lock(&engine);
    json_response(StatusCode::OK, engine.snapshot())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

/// Every engine rejection is a problem with the request, never the server.
fn engine_error_response(err: &EngineError) -> Response {
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}
