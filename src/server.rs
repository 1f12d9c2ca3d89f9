use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::{
    cmp::Ordering,
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
    time::{Instant, SystemTime, UNIX_EPOCH},
};
use tower_http::services::{ServeDir, ServeFile};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "dist";
const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;
const PORT_BOUNDS: (u64, u64) = (1, 65_535);
const REQUEST_ID_HEADER: &str = "x-request-id";

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LogLevel {
    Debug,
    Info,
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(level: LogLevel) -> u8 {
            match level {
                LogLevel::Debug => 0,
                LogLevel::Info => 1,
            }
        }

        rank(*self).cmp(&rank(*other))
    }
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct ServerConfig {
    port: u16,
    static_dir: PathBuf,
    log_level: LogLevel,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_u64_with_bounds(lookup("PORT"), u64::from(DEFAULT_PORT), PORT_BOUNDS);
        let static_dir = non_empty(lookup("STATIC_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));
        let log_level = non_empty(lookup("LOG_LEVEL"))
            .and_then(|value| LogLevel::parse(&value))
            .unwrap_or(DEFAULT_LOG_LEVEL);

        Self {
            port: u16::try_from(port).unwrap_or(DEFAULT_PORT),
            static_dir,
            log_level,
        }
    }

    fn index_file(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }
}

#[derive(Clone)]
struct AppState {
    config: ServerConfig,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();
    let bind_address = format!("0.0.0.0:{}", config.port);
    let state = AppState { config };

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log_event(
        &state.config,
        LogLevel::Info,
        "server_started",
        serde_json::json!({
            "address": format!("http://127.0.0.1:{}", state.config.port),
            "staticDir": state.config.static_dir.display().to_string(),
        }),
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    // Unknown paths get the shell so client-side routes survive a reload.
    let static_service = ServeDir::new(&state.config.static_dir)
        .fallback(ServeFile::new(state.config.index_file()));

    Router::new()
        .fallback_service(static_service)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn log_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = resolve_request_id(request.headers());
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    log_event(
        &state.config,
        LogLevel::Debug,
        "request_received",
        serde_json::json!({ "requestId": request_id, "method": method, "path": path }),
    );

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    log_event(
        &state.config,
        LogLevel::Info,
        "request_completed",
        serde_json::json!({
            "requestId": request_id,
            "method": method,
            "path": path,
            "status": response.status().as_u16(),
            "durationMs": started.elapsed().as_millis() as u64,
        }),
    );

    response
}

fn parse_u64_with_bounds(value: Option<String>, default: u64, bounds: (u64, u64)) -> u64 {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn now_unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis())
        .unwrap_or(0)
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}

fn generate_request_id() -> String {
    let counter = REQUEST_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    format!("req-{}-{counter}", now_unix_millis())
}

fn resolve_request_id(headers: &HeaderMap) -> String {
    let value = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|raw| raw.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string);

    value.unwrap_or_else(generate_request_id)
}

fn log_event(config: &ServerConfig, level: LogLevel, event: &str, fields: serde_json::Value) {
    if let Some(line) = format_log_line(config, level, event, fields) {
        println!("{line}");
    }
}

fn format_log_line(
    config: &ServerConfig,
    level: LogLevel,
    event: &str,
    fields: serde_json::Value,
) -> Option<String> {
    if level < config.log_level {
        return None;
    }

    let mut payload = serde_json::Map::new();
    payload.insert(
        "ts".to_string(),
        serde_json::Value::Number(serde_json::Number::from(now_unix_seconds())),
    );
    payload.insert("level".to_string(), serde_json::Value::String(level.as_str().to_string()));
    payload.insert("event".to_string(), serde_json::Value::String(event.to_string()));

    if let serde_json::Value::Object(extra) = fields {
        for (key, value) in extra {
            payload.insert(key, value);
        }
    }

    Some(serde_json::Value::Object(payload).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, fs};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    fn test_config(static_dir: PathBuf) -> ServerConfig {
        ServerConfig {
            port: 0,
            static_dir,
            log_level: DEFAULT_LOG_LEVEL,
        }
    }

    #[test]
    fn config_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[]));

        assert_eq!(config.port, 8080);
        assert_eq!(config.static_dir, PathBuf::from("dist"));
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.index_file(), PathBuf::from("dist/index.html"));
    }

    #[test]
    fn config_reads_valid_values() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", " 3000 "),
            ("STATIC_DIR", "public"),
            ("LOG_LEVEL", "DEBUG"),
        ]));

        assert_eq!(config.port, 3000);
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn config_rejects_out_of_bounds_and_garbage() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", "70000"),
            ("STATIC_DIR", "   "),
            ("LOG_LEVEL", "verbose"),
        ]));
        assert_eq!(config, ServerConfig::from_lookup(lookup_from(&[])));

        let zero_port = ServerConfig::from_lookup(lookup_from(&[("PORT", "0")]));
        assert_eq!(zero_port.port, 8080);
    }

    #[test]
    fn debug_events_are_filtered_at_info() {
        let config = test_config(PathBuf::from("dist"));
        assert!(LogLevel::Debug < LogLevel::Info);

        let skipped = format_log_line(&config, LogLevel::Debug, "noise", serde_json::json!({}));
        assert!(skipped.is_none());

        let line = format_log_line(
            &config,
            LogLevel::Info,
            "request_completed",
            serde_json::json!({ "status": 200 }),
        )
        .expect("info events are emitted");
        let parsed: serde_json::Value = serde_json::from_str(&line).expect("valid JSON line");

        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "request_completed");
        assert_eq!(parsed["status"], 200);
        assert!(parsed["ts"].is_u64());
    }

    #[test]
    fn request_id_prefers_incoming_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("  abc-123 "));
        assert_eq!(resolve_request_id(&headers), "abc-123");

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("   "));
        let generated = resolve_request_id(&headers);
        assert!(generated.starts_with("req-"));
        assert_ne!(generated, resolve_request_id(&HeaderMap::new()));
    }

    #[tokio::test]
    async fn serves_assets_and_falls_back_to_shell() {
        let static_dir = std::env::temp_dir().join(format!("jungle-portfolio-{}", generate_request_id()));
        fs::create_dir_all(&static_dir).expect("create static dir");
        fs::write(static_dir.join("index.html"), "<div id=\"app\"></div>").expect("write index");
        fs::write(static_dir.join("app.js"), "console.log('jungle');").expect("write asset");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let address = listener.local_addr().expect("local address");
        let router = app(AppState {
            config: test_config(static_dir.clone()),
        });
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let client = reqwest::Client::new();

        let asset = client
            .get(format!("http://{address}/app.js"))
            .header(REQUEST_ID_HEADER, "trace-1")
            .send()
            .await
            .expect("asset request");
        assert!(asset.status().is_success());
        assert_eq!(
            asset.headers().get(REQUEST_ID_HEADER).and_then(|value| value.to_str().ok()),
            Some("trace-1")
        );
        assert_eq!(asset.text().await.expect("asset body"), "console.log('jungle');");

        let route = client
            .get(format!("http://{address}/projects"))
            .send()
            .await
            .expect("route request");
        assert!(route.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(route.text().await.expect("shell body"), "<div id=\"app\"></div>");

        let _ = fs::remove_dir_all(static_dir);
    }
}
