//! Diagnostic logging
//!
//! Operator output (tables, prompts, status lines) owns stdout, so every
//! `tracing` event goes to stderr.
//!
//! | Variable | Effect |
//! |---|---|
//! | `XMAN_LOG_FORMAT` | `text` or `json` when `--log-format` is absent |
//! | `XMAN_LOG` | Filter directives, read before `RUST_LOG` |
//! | `XMAN_LOG_SPAN_EVENTS` | Span events such as `new,close` |

use anyhow::Result;
use std::{io, sync::Once};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

const DEFAULT_DIRECTIVES: &str = "info";

static INSTALLED: Once = Once::new();

/// Install the stderr subscriber. Later calls do nothing.
///
/// `format` is `"json"` for one JSON object per event and anything else for
/// plain text.
pub fn init(format: Option<&str>) -> Result<()> {
    INSTALLED.call_once(|| {
        let env_format = std::env::var("XMAN_LOG_FORMAT").ok();
        let json = format.or(env_format.as_deref()) == Some("json");
        let span_events = std::env::var("XMAN_LOG_SPAN_EVENTS")
            .map(|raw| parse_span_events(&raw))
            .unwrap_or(if json { FmtSpan::NEW | FmtSpan::CLOSE } else { FmtSpan::NONE });

        let output: Box<dyn Layer<Registry> + Send + Sync> = if json {
            fmt::layer()
                .json()
                .with_span_events(span_events)
                .with_writer(io::stderr)
                .boxed()
        } else {
            fmt::layer()
                .with_span_events(span_events)
                .with_writer(io::stderr)
                .boxed()
        };

        let xman_log = std::env::var("XMAN_LOG").ok();
        tracing_subscriber::registry()
            .with(output)
            .with(filter(xman_log.as_deref()))
            .init();
        tracing::debug!(json, "Diagnostics enabled");
    });

    Ok(())
}

/// `XMAN_LOG` directives, else `RUST_LOG`, else `info`.
fn filter(xman_log: Option<&str>) -> EnvFilter {
    match xman_log {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing::warn!("Ignoring XMAN_LOG '{}', it is not a valid filter", directives);
            EnvFilter::new(DEFAULT_DIRECTIVES)
        }),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES)),
    }
}

fn parse_span_events(raw: &str) -> FmtSpan {
    raw.split([',', '|'])
        .map(|token| match token.trim().to_ascii_lowercase().as_str() {
            "new" => FmtSpan::NEW,
            "close" => FmtSpan::CLOSE,
            "enter" => FmtSpan::ENTER,
            "exit" => FmtSpan::EXIT,
            "active" => FmtSpan::ACTIVE,
            "full" => FmtSpan::FULL,
            _ => FmtSpan::NONE,
        })
        .fold(FmtSpan::NONE, |acc, event| acc | event)
}

pub fn is_initialized() -> bool {
    INSTALLED.is_completed()
}
