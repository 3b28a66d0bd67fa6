//! Configuration validation with unknown field detection.

use serde_json::Value;

use super::Config;

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &["service", "packages", "restart", "probe", "status", "logging"];

/// A validation diagnostic.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum DiagnosticLevel {
    Warn,
    Error,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        if self.path.is_empty() {
            write!(f, "{} {}", prefix, self.message)
        } else {
            write!(f, "{} {}: {}", prefix, self.path, self.message)
        }
    }
}

/// Simple Levenshtein distance for "did you mean?" suggestions.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_len = a.len();
    let b_len = b.len();
    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(a_len + 1) {
        row[0] = i;
    }
    for (j, val) in matrix[0].iter_mut().enumerate().take(b_len + 1) {
        *val = j;
    }

    for (i, ca) in a.chars().enumerate() {
        for (j, cb) in b.chars().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            matrix[i + 1][j + 1] = std::cmp::min(
                std::cmp::min(matrix[i][j + 1] + 1, matrix[i + 1][j] + 1),
                matrix[i][j] + cost,
            );
        }
    }
    matrix[a_len][b_len]
}

/// Suggest the closest known field name (if distance <= 3).
fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| k.to_string())
}

/// Validate a parsed config plus its raw JSON for unknown fields.
///
/// Returns all diagnostics; the config is usable iff none are `Error`.
pub fn validate(config: &Config, raw: Option<&Value>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if config.service.command.trim().is_empty() {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Error,
            path: "service.command".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if config.service.port == 0 {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Error,
            path: "service.port".to_string(),
            message: "must be a non-zero listening port".to_string(),
        });
    }
    if !config.service.liveness_path.starts_with('/') {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Error,
            path: "service.liveness_path".to_string(),
            message: "must start with '/'".to_string(),
        });
    }

    if config.probe.failure_threshold == 0 {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Error,
            path: "probe.failure_threshold".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    if config.probe.interval_secs == 0 {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Error,
            path: "probe.interval_secs".to_string(),
            message: "must be at least 1 second".to_string(),
        });
    }
    if config.probe.staleness_secs < config.probe.interval_secs {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Warn,
            path: "probe.staleness_secs".to_string(),
            message: "shorter than the probe interval; status will read unknown between probes"
                .to_string(),
        });
    }

    if !config.restart.enabled {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Warn,
            path: "restart.enabled".to_string(),
            message: "restarts disabled; the service will stay down after its first exit"
                .to_string(),
        });
    }
    if let Some(backoff) = &config.restart.backoff {
        if backoff.factor < 1.0 {
            diagnostics.push(Diagnostic {
                level: DiagnosticLevel::Error,
                path: "restart.backoff.factor".to_string(),
                message: "must be >= 1.0".to_string(),
            });
        }
    }

    if config.status.port == config.service.port {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Error,
            path: "status.port".to_string(),
            message: "collides with service.port".to_string(),
        });
    }

    // Unknown top-level fields in the raw JSON.
    if let Some(Value::Object(map)) = raw {
        for key in map.keys() {
            if !KNOWN_TOP_LEVEL.contains(&key.as_str()) {
                let message = match suggest_field(key, KNOWN_TOP_LEVEL) {
                    Some(suggestion) => {
                        format!("unknown field (did you mean '{}'?)", suggestion)
                    }
                    None => "unknown field".to_string(),
                };
                diagnostics.push(Diagnostic {
                    level: DiagnosticLevel::Warn,
                    path: key.clone(),
                    message,
                });
            }
        }
    }

    diagnostics
}

/// Whether any diagnostic is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics
        .iter()
        .any(|d| d.level == DiagnosticLevel::Error)
}
