// HTTP Server Task - Web-Oberfläche und REST-artige Befehls-Routen
use alloc::string::String;

use defmt::{info, warn};
use embassy_net::Stack;
use embassy_time::Duration;
use picoserve::extract::Query;
use picoserve::response::{IntoResponse, Response, StatusCode};
use picoserve::routing::get;
use serde::Deserialize;
use wakeup_core::{AlarmConfig, Color, Command};

use crate::AppContext;
use crate::config::*;
use crate::web::INDEX_HTML;

/// Query für `/set_rgbw?r=..&g=..&b=..&w=..`
#[derive(Debug, Deserialize)]
struct RgbwQuery {
    r: u8,
    g: u8,
    b: u8,
    #[serde(default)]
    w: u8,
}

/// Query für `/set_alarm_time?hr=..&mn=..&duration_min=..`
#[derive(Debug, Deserialize)]
struct AlarmTimeQuery {
    hr: u8,
    mn: u8,
    #[serde(default)]
    duration_min: Option<u32>,
}

/// Query für `/toggle_alarm?on=0|1` (ohne `on`: umschalten)
#[derive(Debug, Deserialize)]
struct ToggleAlarmQuery {
    #[serde(default)]
    on: Option<u8>,
}

/// Query für `/sunrise?seconds=..` und `/sunset?seconds=..`
#[derive(Debug, Deserialize)]
struct SequenceQuery {
    #[serde(default)]
    seconds: Option<u32>,
}

/// HTTP Server Task - läuft parallel zu anderen Tasks
///
/// Routen:
/// - `GET /`: Web-Oberfläche
/// - `GET /on`, `/off`, `/toggle`, `/sunrise`, `/sunset`, `/set_rgbw`,
///   `/set_alarm_time`, `/toggle_alarm`: Befehle an den Command Task
/// - `GET /status`: Status als JSON
/// - `GET /get_localtime`: Lokalzeit als `HH:MM:SS`
///
/// **Task Pool:** mehrere Instanzen für parallele Verbindungen
#[embassy_executor::task(pool_size = 2)]
pub async fn http_server_task(task_id: usize, stack: Stack<'static>, context: AppContext) {
    info!("HTTP: Server task {} starting on port 80...", task_id);

    let app = picoserve::Router::new()
        .route("/", get(serve_html))
        .route(
            "/on",
            get(move || submit(context, Command::TurnOn { full: true })),
        )
        .route("/off", get(move || submit(context, Command::TurnOff)))
        .route("/toggle", get(move || submit(context, Command::Toggle)))
        .route(
            "/sunrise",
            get(move |Query(query): Query<SequenceQuery>| {
                submit(context, Command::Sunrise(query.seconds))
            }),
        )
        .route(
            "/sunset",
            get(move |Query(query): Query<SequenceQuery>| {
                submit(context, Command::Sunset(query.seconds))
            }),
        )
        .route(
            "/set_rgbw",
            get(move |Query(query): Query<RgbwQuery>| {
                submit(
                    context,
                    Command::SetColor(Color::new(query.r, query.g, query.b, query.w)),
                )
            }),
        )
        .route(
            "/set_alarm_time",
            get(move |Query(query): Query<AlarmTimeQuery>| set_alarm_time(context, query)),
        )
        .route(
            "/toggle_alarm",
            get(move |Query(query): Query<ToggleAlarmQuery>| {
                let command = match query.on {
                    Some(on) => Command::SetAlarmEnabled(on != 0),
                    None => Command::ToggleAlarm,
                };
                submit(context, command)
            }),
        )
        .route("/status", get(move || serve_status(context)))
        .route("/get_localtime", get(move || serve_localtime(context)));

    let config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(1)),
        persistent_start_read_request: Some(Duration::from_secs(5)),
    })
    .keep_connection_alive();

    let mut http_buffer = [0u8; HTTP_BUFFER_SIZE];
    let mut rx_buffer = [0u8; TCP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_TX_BUFFER_SIZE];

    let server = picoserve::Server::new(&app, &config, &mut http_buffer);

    let _ = server
        .listen_and_serve(task_id, stack, 80, &mut rx_buffer, &mut tx_buffer)
        .await;

    info!("HTTP: Server task {} ended", task_id);
}

fn text(status: u16, body: &'static str) -> impl IntoResponse {
    Response::new(StatusCode::new(status), body)
}

/// Reiht einen Befehl beim Command Task ein
///
/// Die Antwort kommt sofort; Wertebereiche prüft der Core beim Anwenden.
async fn submit(context: AppContext, command: Command) -> impl IntoResponse {
    info!("HTTP: {}", defmt::Debug2Format(&command));
    context.commands.send(command).await;
    text(200, "OK")
}

async fn set_alarm_time(context: AppContext, query: AlarmTimeQuery) -> impl IntoResponse {
    let current = context.app.scheduler.lock().await.config();
    let duration_seconds = match query.duration_min {
        Some(minutes) => minutes.checked_mul(60),
        None => Some(current.alarm_duration_seconds),
    };

    // Vorab prüfen, damit der Browser einen 400 statt "OK" bekommt
    let valid = duration_seconds
        .is_some_and(|seconds| AlarmConfig::validate_alarm(query.hr, query.mn, seconds).is_ok());
    if !valid {
        warn!("HTTP: rejected alarm time {}:{}", query.hr, query.mn);
        return text(400, "Invalid alarm time");
    }

    context
        .commands
        .send(Command::SetAlarm {
            hour: query.hr,
            minute: query.mn,
            duration_seconds,
            enabled: None,
        })
        .await;
    text(200, "OK")
}

/// Serviert die HTML-Hauptseite
async fn serve_html() -> impl IntoResponse {
    Response::new(StatusCode::OK, INDEX_HTML).with_header("Content-Type", "text/html; charset=utf-8")
}

/// Status als JSON (gleiche Felder wie die MQTT-Topics)
async fn serve_status(context: AppContext) -> impl IntoResponse {
    let status = context.app.status().await;
    let mut json_buffer = [0u8; JSON_STATUS_BUFFER_SIZE];

    let (code, body) = match serde_json_core::to_slice(&status, &mut json_buffer)
        .ok()
        .and_then(|n| core::str::from_utf8(&json_buffer[..n]).ok())
    {
        Some(json) => (StatusCode::OK, String::from(json)),
        None => {
            warn!("HTTP: status does not fit into JSON buffer");
            (StatusCode::new(500), String::from("{}"))
        }
    };

    Response::new(code, body).with_header("Content-Type", "application/json")
}

/// Lokalzeit als `HH:MM:SS`, 503 solange die Uhr nicht gestellt ist
async fn serve_localtime(context: AppContext) -> impl IntoResponse {
    let local = context.app.scheduler.lock().await.local_time(context.app.clock);

    let (code, body) = match local {
        Some(time) => (
            StatusCode::OK,
            alloc::format!("{:02}:{:02}:{:02}", time.hour, time.minute, time.second),
        ),
        None => (StatusCode::new(503), String::from("clock not synced")),
    };
    Response::new(code, body)
}
