use crate::application::use_cases::prediction::format_prediction;
use crate::domain::error::AppError;
use crate::domain::features::{Classes, FeatureVector, Region, NUMERIC_FIELDS};
use crate::infrastructure::bootstrap::AppState;
use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub temperature: i32,
    pub relative_humidity: i32,
    pub wind_speed: i32,
    pub rain: f64,
    pub ffmc: f64,
    pub dmc: f64,
    pub isi: f64,
    pub region: Region,
    pub classes: Classes,
}

impl PredictRequest {
    fn into_features(self) -> FeatureVector {
        FeatureVector {
            temperature: self.temperature,
            relative_humidity: self.relative_humidity,
            wind_speed: self.wind_speed,
            rain: self.rain,
            ffmc: self.ffmc,
            dmc: self.dmc,
            isi: self.isi,
            region: self.region,
            classes: self.classes,
        }
    }
}

/// Echo of the submitted inputs, including the encoded categorical values.
#[derive(Debug, Serialize)]
pub struct InputsEcho {
    pub temperature: i32,
    pub relative_humidity: i32,
    pub wind_speed: i32,
    pub rain: f64,
    pub ffmc: f64,
    pub dmc: f64,
    pub isi: f64,
    pub region: &'static str,
    pub region_encoded: f64,
    pub classes: &'static str,
    pub classes_encoded: f64,
}

impl InputsEcho {
    fn from_features(features: &FeatureVector) -> Self {
        Self {
            temperature: features.temperature,
            relative_humidity: features.relative_humidity,
            wind_speed: features.wind_speed,
            rain: features.rain,
            ffmc: features.ffmc,
            dmc: features.dmc,
            isi: features.isi,
            region: features.region.label(),
            region_encoded: features.region.encoded(),
            classes: features.classes.label(),
            classes_encoded: features.classes.encoded(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: f64,
    pub display: String,
    pub inputs: InputsEcho,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[post("/predict")]
async fn predict(data: web::Data<HttpState>, req: web::Json<PredictRequest>) -> impl Responder {
    let features = req.into_inner().into_features();

    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Predicting FWI (region={} classes={})",
            features.region.label(),
            features.classes.label()
        ),
    );

    match data.app.predict_use_case.execute(&features) {
        Ok(prediction) => HttpResponse::Ok().json(PredictResponse {
            prediction,
            display: format_prediction(prediction),
            inputs: InputsEcho::from_features(&features),
        }),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Prediction failed: {}", e),
            );
            let body = ErrorResponse {
                error: e.to_string(),
            };
            match e {
                AppError::ArtifactsUnavailable(_)
                | AppError::ArtifactNotFound(_)
                | AppError::ArtifactCorrupt(_) => HttpResponse::ServiceUnavailable().json(body),
                AppError::ValidationError(_) => HttpResponse::BadRequest().json(body),
                _ => HttpResponse::InternalServerError().json(body),
            }
        }
    }
}

#[get("/health")]
async fn health(data: web::Data<HttpState>) -> impl Responder {
    let status = data.app.artifacts.status();
    if status.all_loaded() {
        HttpResponse::Ok().json(status)
    } else {
        HttpResponse::ServiceUnavailable().json(status)
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap();
    HttpResponse::Ok().json(&*logs)
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_form_page())
}

fn render_numeric_input(field: &crate::domain::features::NumericField) -> String {
    let max_attr = field
        .max
        .map(|max| format!(" max=\"{}\"", max))
        .unwrap_or_default();
    format!(
        "<label for=\"{name}\">{label}</label>\n\
         <input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"{min}\"{max_attr} \
         step=\"{step}\" value=\"{default}\" required>",
        name = field.name,
        label = field.label,
        min = field.min,
        max_attr = max_attr,
        step = field.step,
        default = field.default,
    )
}

fn render_form_page() -> String {
    let climatic: String = NUMERIC_FIELDS[..4]
        .iter()
        .map(render_numeric_input)
        .collect::<Vec<_>>()
        .join("\n");
    let components: String = NUMERIC_FIELDS[4..]
        .iter()
        .map(render_numeric_input)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Algerian Forest Fire (FWI) Prediction</title>
<style>
body {{ font-family: sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; }}
fieldset {{ margin-bottom: 1rem; }}
label {{ display: block; margin-top: 0.5rem; }}
input, select {{ width: 12rem; }}
#result {{ margin-top: 1rem; font-weight: bold; }}
#result.error {{ color: #b00020; }}
</style>
</head>
<body>
<h1>Algerian Forest Fire (FWI) Prediction</h1>
<p>Provide the feature values to predict the Fire Weather Index (FWI).
The inputs will be scaled before prediction.</p>
<form id="prediction-form">
<fieldset>
<legend>Climatic Data</legend>
{climatic}
</fieldset>
<fieldset>
<legend>FWI System Components</legend>
{components}
</fieldset>
<fieldset>
<legend>Area</legend>
<label for="region">Region</label>
<select id="region" name="region">
<option value="Bejaia" selected>Bejaia</option>
<option value="Sidi-Bel Abbes">Sidi-Bel Abbes</option>
</select>
<label for="classes">Classes</label>
<select id="classes" name="classes">
<option value="Not Fire" selected>Not Fire</option>
<option value="Fire">Fire</option>
</select>
</fieldset>
<button type="submit">Predict FWI</button>
</form>
<div id="result"></div>
<div id="inputs-echo"></div>
<script>
document.getElementById('prediction-form').addEventListener('submit', async (event) => {{
  event.preventDefault();
  const form = event.target;
  const body = {{
    temperature: parseInt(form.temperature.value, 10),
    relative_humidity: parseInt(form.relative_humidity.value, 10),
    wind_speed: parseInt(form.wind_speed.value, 10),
    rain: parseFloat(form.rain.value),
    ffmc: parseFloat(form.ffmc.value),
    dmc: parseFloat(form.dmc.value),
    isi: parseFloat(form.isi.value),
    region: form.region.value,
    classes: form.classes.value,
  }};
  const result = document.getElementById('result');
  const echo = document.getElementById('inputs-echo');
  result.textContent = '';
  result.classList.remove('error');
  echo.textContent = '';
  try {{
    const response = await fetch('/api/predict', {{
      method: 'POST',
      headers: {{ 'Content-Type': 'application/json' }},
      body: JSON.stringify(body),
    }});
    const payload = await response.json();
    if (!response.ok) {{
      result.classList.add('error');
      result.textContent = payload.error || 'Prediction failed.';
      return;
    }}
    result.textContent = 'Predicted FWI: ' + payload.display;
    const inputs = payload.inputs;
    echo.textContent =
      'Climatic: Temp: ' + inputs.temperature + ', RH: ' + inputs.relative_humidity +
      ', Ws: ' + inputs.wind_speed + ', Rain: ' + inputs.rain +
      ' | Components: FFMC: ' + inputs.ffmc + ', DMC: ' + inputs.dmc + ', ISI: ' + inputs.isi +
      ' | Area: Classes: ' + inputs.classes + ' (' + inputs.classes_encoded + ')' +
      ', Region: ' + inputs.region + ' (' + inputs.region_encoded + ')';
  }} catch (err) {{
    result.classList.add('error');
    result.textContent = 'Request failed: ' + err;
  }}
}});
</script>
</body>
</html>
"#,
        climatic = climatic,
        components = components,
    )
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap();
    logs.push(entry.clone());
    if logs.len() > 100 {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> std::io::Result<Server> {
    let bind = (
        app_state.settings.host.clone(),
        app_state.settings.port,
    );
    let state = web::Data::new(HttpState {
        app: app_state,
        logs,
    });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .service(index)
            .service(
                web::scope("/api")
                    .service(predict)
                    .service(health)
                    .service(get_logs),
            )
    })
    .bind(bind)?
    .run();

    Ok(server)
}
