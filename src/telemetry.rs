//! Telemetry & Logging
//!
//! Structured logging for the quiz client.
//! - Configurable log levels via RUST_LOG
//! - Quiet by default so log lines do not interleave with the quiz screen
//! - Secret redaction for anything echoed from the backend

use regex::Regex;
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing from `RUST_LOG`, or at `info` when `verbose` is set.
///
/// Without either, tracing stays uninitialized and nothing is printed.
pub fn init_tracing(verbose: bool) {
    match std::env::var("RUST_LOG") {
        Ok(filter) => init_tracing_with_filter(&filter),
        Err(_) if verbose => init_tracing_with_filter("lms_quiz=info,warn"),
        Err(_) => {}
    }
}

/// Initialize with custom filter string
pub fn init_tracing_with_filter(filter: &str) {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .compact()
            .with_writer(std::io::stderr); // stdout belongs to the quiz screen

        let filter_layer = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}

/// Sanitize a string for safe log output by escaping control characters.
/// Prevents log injection where a backend message embeds newlines.
pub fn sanitize_for_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x1b' => out.push_str("\\e"),
            '\x00' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn secret_patterns() -> &'static [Regex] {
    SECRET_PATTERNS.get_or_init(|| {
        [
            r"(?i)Bearer\s+[A-Za-z0-9_\-\.=]{8,}",
            r#"(?i)"?(password|refreshToken|token)"?\s*[:=]\s*"?[^\s",}]+"?"#,
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Replace bearer tokens and credential fields with `[REDACTED]`.
pub fn redact_secrets(s: &str) -> String {
    secret_patterns()
        .iter()
        .fold(s.to_string(), |acc, re| {
            re.replace_all(&acc, "[REDACTED]").into_owned()
        })
}
