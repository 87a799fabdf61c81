use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{Inputs, Projection, Recommendation, YearResult, project};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const CSV_COLUMNS: [&str; 5] = [
    "Year",
    "Home Value",
    "Home Equity",
    "Rent Paid (Cumulative)",
    "Rent + Invest Wealth",
];

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Buy vs rent vs invest wealth projection (mortgage with a year-3 refinance vs renting while investing the difference)"
)]
struct Cli {
    #[arg(long, default_value_t = 950_000.0, help = "Home purchase price")]
    home_price: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Down payment in percent, between 5 and 30"
    )]
    down_payment_percent: f64,
    #[arg(
        long,
        default_value_t = 6.75,
        help = "Initial mortgage rate in percent, between 3 and 8"
    )]
    initial_mortgage_rate: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Refinance rate applied at year 3 in percent, between 3 and 6"
    )]
    refinance_rate: f64,
    #[arg(long, default_value_t = 10, help = "Years to project, between 5 and 30")]
    years_projection: u32,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual home appreciation in percent, between 0 and 6"
    )]
    home_appreciation_rate: f64,
    #[arg(long, default_value_t = 3_500.0, help = "Starting monthly rent")]
    monthly_rent: f64,
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        help = "Rent control caps annual rent increases at 3% instead of 5%"
    )]
    rent_control: bool,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Investment return while renting in percent, between 0 and 10"
    )]
    investment_return_rate: f64,
    #[arg(
        long,
        default_value_t = 2_800.0,
        help = "Monthly amount invested while renting (rent cheaper than buying)"
    )]
    monthly_saving: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    home_price: Option<f64>,
    down_payment_percent: Option<f64>,
    initial_mortgage_rate: Option<f64>,
    refinance_rate: Option<f64>,
    years_projection: Option<u32>,
    home_appreciation_rate: Option<f64>,
    monthly_rent: Option<f64>,
    rent_control: Option<bool>,
    investment_return_rate: Option<f64>,
    monthly_saving: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    years: Vec<YearResult>,
    final_home_value: f64,
    final_home_equity: f64,
    final_cumulative_rent_paid: f64,
    final_investment_wealth: f64,
    recommendation: Recommendation,
    headline: String,
    naive_compound_wealth: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    if !cli.home_price.is_finite() || cli.home_price <= 0.0 {
        return Err("--home-price must be > 0".to_string());
    }

    if !(5.0..=30.0).contains(&cli.down_payment_percent) {
        return Err("--down-payment-percent must be between 5 and 30".to_string());
    }

    if !(3.0..=8.0).contains(&cli.initial_mortgage_rate) {
        return Err("--initial-mortgage-rate must be between 3 and 8".to_string());
    }

    if !(3.0..=6.0).contains(&cli.refinance_rate) {
        return Err("--refinance-rate must be between 3 and 6".to_string());
    }

    if !(5..=30).contains(&cli.years_projection) {
        return Err("--years-projection must be between 5 and 30".to_string());
    }

    if !(0.0..=6.0).contains(&cli.home_appreciation_rate) {
        return Err("--home-appreciation-rate must be between 0 and 6".to_string());
    }

    if !cli.monthly_rent.is_finite() || cli.monthly_rent <= 0.0 {
        return Err("--monthly-rent must be > 0".to_string());
    }

    if !(0.0..=10.0).contains(&cli.investment_return_rate) {
        return Err("--investment-return-rate must be between 0 and 10".to_string());
    }

    if !cli.monthly_saving.is_finite() || cli.monthly_saving < 0.0 {
        return Err("--monthly-saving must be >= 0".to_string());
    }

    Ok(Inputs {
        home_price: cli.home_price,
        down_payment: cli.down_payment_percent / 100.0,
        initial_mortgage_rate: cli.initial_mortgage_rate / 100.0,
        refinance_rate: cli.refinance_rate / 100.0,
        years_projection: cli.years_projection,
        home_appreciation_rate: cli.home_appreciation_rate / 100.0,
        monthly_rent: cli.monthly_rent,
        rent_control: cli.rent_control,
        investment_return_rate: cli.investment_return_rate / 100.0,
        monthly_saving: cli.monthly_saving,
    })
}

fn inputs_from_payload(payload: ProjectPayload) -> Result<Inputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.home_price {
        cli.home_price = v;
    }
    if let Some(v) = payload.down_payment_percent {
        cli.down_payment_percent = v;
    }
    if let Some(v) = payload.initial_mortgage_rate {
        cli.initial_mortgage_rate = v;
    }
    if let Some(v) = payload.refinance_rate {
        cli.refinance_rate = v;
    }
    if let Some(v) = payload.years_projection {
        cli.years_projection = v;
    }
    if let Some(v) = payload.home_appreciation_rate {
        cli.home_appreciation_rate = v;
    }
    if let Some(v) = payload.monthly_rent {
        cli.monthly_rent = v;
    }
    if let Some(v) = payload.rent_control {
        cli.rent_control = v;
    }
    if let Some(v) = payload.investment_return_rate {
        cli.investment_return_rate = v;
    }
    if let Some(v) = payload.monthly_saving {
        cli.monthly_saving = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        home_price: 950_000.0,
        down_payment_percent: 10.0,
        initial_mortgage_rate: 6.75,
        refinance_rate: 5.0,
        years_projection: 10,
        home_appreciation_rate: 3.0,
        monthly_rent: 3_500.0,
        rent_control: true,
        investment_return_rate: 7.0,
        monthly_saving: 2_800.0,
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/project.csv", get(project_csv_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("nestegg HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

/// One-shot mode: parse the scenario flags, run the projection, print the
/// final-year summary and the full yearly table as CSV.
pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    let years_projection = cli.years_projection;
    let inputs = build_inputs(cli)?;
    let projection = project(&inputs).map_err(|e| e.to_string())?;

    let last = projection.final_year();
    println!("Results after {years_projection} years:");
    println!("  Estimated home value:          {:>14.0}", last.home_value);
    println!("  Home equity if buying:         {:>14.0}", last.home_equity);
    println!(
        "  Cumulative rent paid:          {:>14.0}",
        last.cumulative_rent_paid
    );
    println!(
        "  Wealth if renting + investing: {:>14.0}",
        last.investment_wealth
    );
    println!(
        "  {}",
        headline(projection.recommendation, years_projection)
    );
    println!();
    print!("{}", render_csv(&projection)?);
    Ok(())
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let projection = match project(&inputs) {
        Ok(projection) => projection,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    json_response(StatusCode::OK, build_project_response(&inputs, &projection))
}

async fn project_csv_handler(Query(payload): Query<ProjectPayload>) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let projection = match project(&inputs) {
        Ok(projection) => projection,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    match render_csv(&projection) {
        Ok(body) => with_cache_control((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"wealth_projection.csv\"",
                ),
            ],
            body,
        )),
        Err(msg) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &msg),
    }
}

fn build_project_response(inputs: &Inputs, projection: &Projection) -> ProjectResponse {
    let last = projection.final_year();
    ProjectResponse {
        final_home_value: last.home_value,
        final_home_equity: last.home_equity,
        final_cumulative_rent_paid: last.cumulative_rent_paid,
        final_investment_wealth: last.investment_wealth,
        recommendation: projection.recommendation,
        headline: headline(projection.recommendation, inputs.years_projection),
        naive_compound_wealth: naive_compound_wealth(inputs),
        years: projection.years.clone(),
    }
}

fn headline(recommendation: Recommendation, years_projection: u32) -> String {
    match recommendation {
        Recommendation::BuyStronger => format!(
            "Buying looks financially stronger over the next {years_projection} years."
        ),
        Recommendation::RentInvestStronger => "Renting plus investing could create more wealth, \
             but requires discipline to save and invest monthly."
            .to_string(),
        Recommendation::TooClose => "It's close: weigh lifestyle, emotional goals, and cash \
             flow comfort."
            .to_string(),
    }
}

/// The original app's chart recomputed the rent+invest line with a simple
/// compound-interest formula that ignores principal accumulated in earlier
/// years. Kept as a caller-side overlay only: it intentionally disagrees
/// with the engine's recurrence and never feeds the recommendation.
fn naive_compound_wealth(inputs: &Inputs) -> Vec<f64> {
    (1..=inputs.years_projection)
        .map(|year| {
            inputs.monthly_saving * 12.0 * (1.0 + inputs.investment_return_rate).powi(year as i32)
        })
        .collect()
}

/// One row per projected year, values unrounded; rounding is left to
/// whatever opens the file.
fn render_csv(projection: &Projection) -> Result<String, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| e.to_string())?;
    for row in &projection.years {
        writer
            .write_record(&[
                row.year.to_string(),
                row.home_value.to_string(),
                row.home_equity.to_string(),
                row.cumulative_rent_paid.to_string(),
                row.investment_wealth.to_string(),
            ])
            .map_err(|e| e.to_string())?;
    }
    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
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

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}
