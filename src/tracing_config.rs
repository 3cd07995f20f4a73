//! Tracing configuration.
//!
//! `ESM_SPECIFIERS_LOG` holds `EnvFilter` directives. A bare level such as
//! `debug` is scoped to this crate, so the parser and codegen stay quiet
//! unless asked for by target. `RUST_LOG` is used verbatim as a fallback.
//!
//! `ESM_SPECIFIERS_LOG_FORMAT` picks the output:
//!
//! - `text` (default): one line per rewrite or resolution event
//! - `tree`: events nested under their `esm_transform` file span
//! - `json`: one object per event, with the current file span attached
//!
//! ```bash
//! # Every rewrite and every unresolved specifier
//! ESM_SPECIFIERS_LOG=debug host-compiler src/app.ts
//!
//! # Every probed candidate path, grouped per file
//! ESM_SPECIFIERS_LOG=esm_specifiers::module_resolver=trace ESM_SPECIFIERS_LOG_FORMAT=tree host-compiler src/app.ts
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const LOG_ENV: &str = "ESM_SPECIFIERS_LOG";
const LOG_FORMAT_ENV: &str = "ESM_SPECIFIERS_LOG_FORMAT";
const CRATE_TARGET: &str = "esm_specifiers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn layer(self) -> Box<dyn Layer<Registry> + Send + Sync> {
        match self {
            Self::Tree => tracing_tree::HierarchicalLayer::new(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(false)
                .with_writer(std::io::stderr)
                .boxed(),
            Self::Json => fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(std::io::stderr)
                .boxed(),
            Self::Text => fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .boxed(),
        }
    }
}

/// Scope bare level directives (`debug`, `trace`, ...) to this crate.
fn scoped_directives(value: &str) -> String {
    value
        .split(',')
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .map(|directive| {
            if is_level(directive) {
                format!("{CRATE_TARGET}={directive}")
            } else {
                directive.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn is_level(directive: &str) -> bool {
    matches!(
        directive.to_lowercase().as_str(),
        "off" | "error" | "warn" | "info" | "debug" | "trace"
    )
}

fn build_filter() -> Option<EnvFilter> {
    if let Ok(val) = std::env::var(LOG_ENV) {
        return Some(EnvFilter::builder().parse_lossy(scoped_directives(&val)));
    }
    std::env::var("RUST_LOG")
        .is_ok()
        .then(EnvFilter::from_default_env)
}

/// Install the global subscriber on stderr.
///
/// Does nothing when neither `ESM_SPECIFIERS_LOG` nor `RUST_LOG` is set, or
/// when the host already installed a subscriber.
pub fn init_tracing() {
    let Some(filter) = build_filter() else {
        return;
    };
    let format = LogFormat::parse(&std::env::var(LOG_FORMAT_ENV).unwrap_or_default());

    let _ = Registry::default()
        .with(format.layer())
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("tree"), LogFormat::Tree);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
        assert_eq!(LogFormat::parse("yaml"), LogFormat::Text);
    }

    #[test]
    fn test_bare_level_is_scoped_to_crate() {
        assert_eq!(scoped_directives("debug"), "esm_specifiers=debug");
        assert_eq!(
            scoped_directives("swc_ecma_parser=trace, info"),
            "swc_ecma_parser=trace,esm_specifiers=info"
        );
        assert_eq!(
            scoped_directives("esm_specifiers::module_resolver=trace"),
            "esm_specifiers::module_resolver=trace"
        );
        assert_eq!(scoped_directives(""), "");
    }
}
