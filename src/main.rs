//! Application entry point: interactive query shell.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run) and apply
//!    the `QUERY_API_URL` environment override.
//! 3. Build the HTTP API client and the application controller.
//! 4. Run the startup health probe.
//! 5. Read stdin line by line: plain text is submitted as a question;
//!    `:voice`, `:sql`, `:schema`, `:examples`, `:health`, `:clear` and
//!    `:quit` drive everything else.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use query_assistant::{
    api::{ApiService, HttpApiClient, QueryResult},
    app::AppController,
    config::AppConfig,
    notify::{Notifier, Severity},
    voice::{CpalRecorder, RecorderBackend, VoiceCaptureController},
};

// ---------------------------------------------------------------------------
// ConsoleNotifier
// ---------------------------------------------------------------------------

/// Notification sink that prints transient messages to the terminal.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        let tag = match severity {
            Severity::Info => "--",
            Severity::Success => "ok",
            Severity::Error => "!!",
        };
        println!("[{tag}] {message}");
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Print a query result: header info followed by an aligned text table.
fn render_result(result: &QueryResult) {
    println!("Original query: {}", result.original_query);
    if let Some(text) = &result.transcribed_text {
        println!("Transcribed:    {text}");
    }
    println!("SQL query:      {}", result.sql_query);
    println!("Intent:         {}", result.intent);
    println!("Results:        {} row(s) found", result.row_count);

    if result.columns.is_empty() {
        return;
    }

    // Column widths from header and data.
    let mut widths: Vec<usize> = result.columns.iter().map(String::len).collect();
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .map(|col| row.get(col).map(value_to_string).unwrap_or_default())
                .collect()
        })
        .collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header: Vec<String> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
        .collect();
    println!("{}", header.join(" | "));
    println!("{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
            .collect();
        println!("{}", line.join(" | "));
    }
}

fn render_snapshot(ctrl: &AppController) {
    let snapshot = ctrl.snapshot();
    if let Some(error) = &snapshot.error {
        println!("Error: {error}");
    } else if let Some(result) = &snapshot.result {
        render_result(result);
    }
}

async fn render_schema(api: &dyn ApiService) {
    match api.fetch_schema().await {
        Ok(resp) if resp.success => {
            let Some(schema) = resp.schema else {
                println!("Server returned no schema.");
                return;
            };
            for table in &schema.tables {
                println!("{}", table.name);
                for col in &table.columns {
                    let mut flags = Vec::new();
                    if col.primary_key {
                        flags.push("primary key");
                    }
                    if !col.nullable {
                        flags.push("not null");
                    }
                    let suffix = if flags.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", flags.join(", "))
                    };
                    println!("  {} {}{suffix}", col.name, col.column_type);
                }
            }
        }
        Ok(resp) => println!(
            "Schema unavailable: {}",
            resp.error.unwrap_or_else(|| "unknown error".into())
        ),
        Err(e) => println!("Schema unavailable: {e}"),
    }
}

async fn render_examples(api: &dyn ApiService) {
    match api.fetch_examples().await {
        Ok(resp) if resp.success => {
            for example in resp.examples.unwrap_or_default() {
                println!("  \"{}\"  ({})", example.text, example.description);
            }
        }
        Ok(resp) => println!(
            "Examples unavailable: {}",
            resp.error.unwrap_or_else(|| "unknown error".into())
        ),
        Err(e) => println!("Examples unavailable: {e}"),
    }
}

fn print_help() {
    println!("Type a question about the database, or:");
    println!("  :voice       record a spoken question (Enter stops recording)");
    println!("  :sql <stmt>  execute a raw SQL statement");
    println!("  :schema      show the database schema");
    println!("  :examples    show example questions");
    println!("  :health      re-probe the backend");
    println!("  :clear       clear the last result and error");
    println!("  :quit        exit");
}

// ---------------------------------------------------------------------------
// Voice flow
// ---------------------------------------------------------------------------

/// Record until the user presses Enter, then submit the payload.
async fn voice_flow(
    recorder: &mut VoiceCaptureController,
    ctrl: &AppController,
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
) {
    if let Err(e) = recorder.start() {
        println!("[!!] {e}");
        return;
    }
    println!("Recording... press Enter to stop.");
    let _ = lines.next_line().await;

    if let Some(e) = recorder.poll() {
        println!("[!!] {e}");
        return;
    }

    match recorder.stop() {
        Ok(Some(payload)) => {
            ctrl.submit_voice(payload).await;
            render_snapshot(ctrl);
        }
        Ok(None) => {}
        Err(e) => println!("[!!] {e}"),
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        let mut fallback = AppConfig::default();
        fallback.apply_env();
        fallback
    });
    log::info!("query assistant starting, API at {}", config.api.base_url);

    // 3. Wiring
    let api: Arc<dyn ApiService> = Arc::new(HttpApiClient::from_config(&config.api));
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let ctrl = AppController::new(Arc::clone(&api), notifier);

    let backend: Arc<dyn RecorderBackend> = Arc::new(CpalRecorder::from_config(&config.audio));
    let mut recorder = VoiceCaptureController::new(backend);

    // 4. Startup health probe
    ctrl.check_health().await;
    println!("{}", ctrl.snapshot().connectivity.label());
    print_help();

    // 5. Shell loop
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        use std::io::Write as _;
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "" => {}
            ":quit" | ":q" => break,
            ":help" => print_help(),
            ":health" => {
                ctrl.check_health().await;
                println!("{}", ctrl.snapshot().connectivity.label());
            }
            ":clear" => ctrl.clear_results(),
            ":schema" => render_schema(api.as_ref()).await,
            ":examples" => render_examples(api.as_ref()).await,
            ":voice" => voice_flow(&mut recorder, &ctrl, &mut lines).await,
            _ if line.starts_with(":sql") => {
                let stmt = line.trim_start_matches(":sql").trim();
                if ctrl.submit_sql(stmt).await {
                    render_snapshot(&ctrl);
                } else if stmt.is_empty() {
                    println!("Usage: :sql <statement>");
                }
            }
            _ if line.starts_with(':') => {
                println!("Unknown command: {line}");
                print_help();
            }
            question => {
                if ctrl.submit_text(question).await {
                    render_snapshot(&ctrl);
                } else if ctrl.snapshot().connectivity
                    != query_assistant::app::Connectivity::Connected
                {
                    println!("Not connected. Try :health to re-probe the backend.");
                }
            }
        }
    }

    Ok(())
}
