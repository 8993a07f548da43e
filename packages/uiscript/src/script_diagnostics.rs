//! Structured script diagnostics.
//!
//! Every failure the bridge reports is recorded as a JSON-serializable
//! diagnostic next to the log line, so hosts and tests can inspect what
//! went wrong without scraping logs.

use serde::Serialize;

use crate::error::BridgeError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptDiagnosticKind {
    /// Syntax/parse errors (compile time).
    ParseError,
    /// Runtime errors in user code.
    RuntimeError,
    /// Script used a host type incorrectly (missing members, wrong types, etc).
    HostApiMisuse,
    /// Host code broke the call protocol (non-callable slot, stale reference).
    CallerError,
    /// Host-side failure: unreadable file, runtime not running.
    HostError,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPhase {
    Compile,
    Execute,
    Call,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScriptLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptDiagnostic {
    pub kind: ScriptDiagnosticKind,
    pub phase: ScriptPhase,
    /// Chunk (file or inline name) the error came from.
    pub chunk: Option<String>,
    pub message: String,
    pub location: Option<ScriptLocation>,
}

fn classify_message(message: &str) -> ScriptDiagnosticKind {
    // Rhai error strings are fairly stable; this provides a pragmatic
    // classification without depending on Rhai's internal enum variants.
    let lower = message.to_ascii_lowercase();

    if lower.contains("property not found")
        || lower.contains("variable not found")
        || lower.contains("function not found")
        || lower.contains("indexer")
        || lower.contains("mismatched types")
    {
        return ScriptDiagnosticKind::HostApiMisuse;
    }

    ScriptDiagnosticKind::RuntimeError
}

fn location_of(pos: rhai::Position) -> Option<ScriptLocation> {
    let line = pos.line()? as u32;
    let column = pos.position().unwrap_or(0) as u32;
    Some(ScriptLocation {
        line,
        column: column.max(1),
    })
}

pub fn from_parse_error(chunk: &str, err: &rhai::ParseError) -> ScriptDiagnostic {
    ScriptDiagnostic {
        kind: ScriptDiagnosticKind::ParseError,
        phase: ScriptPhase::Compile,
        chunk: Some(chunk.to_string()),
        message: err.to_string(),
        location: location_of(err.position()),
    }
}

pub fn from_eval_error(phase: ScriptPhase, chunk: &str, err: &rhai::EvalAltResult) -> ScriptDiagnostic {
    let message = err.to_string();
    ScriptDiagnostic {
        kind: classify_message(&message),
        phase,
        chunk: Some(chunk.to_string()),
        message,
        location: location_of(err.position()),
    }
}

pub fn from_bridge_error(phase: ScriptPhase, err: &BridgeError) -> ScriptDiagnostic {
    match err {
        BridgeError::Compile { chunk, source } => from_parse_error(chunk, source),
        BridgeError::Runtime { chunk, source } => from_eval_error(phase, chunk, source),
        BridgeError::TooDeep(_) => ScriptDiagnostic {
            kind: ScriptDiagnosticKind::RuntimeError,
            phase,
            chunk: None,
            message: err.to_string(),
            location: None,
        },
        BridgeError::NotCallable { .. } | BridgeError::InvalidReference(_) => ScriptDiagnostic {
            kind: ScriptDiagnosticKind::CallerError,
            phase,
            chunk: None,
            message: err.to_string(),
            location: None,
        },
        BridgeError::NotRunning | BridgeError::Io { .. } => ScriptDiagnostic {
            kind: ScriptDiagnosticKind::HostError,
            phase,
            chunk: None,
            message: err.to_string(),
            location: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_location() {
        let engine = rhai::Engine::new();
        let err = engine.compile("let x = 1;\nlet y = ;").unwrap_err();
        let diag = from_parse_error("ui.rhai", &err);
        assert_eq!(diag.kind, ScriptDiagnosticKind::ParseError);
        assert_eq!(diag.chunk.as_deref(), Some("ui.rhai"));
        assert_eq!(diag.location.unwrap().line, 2);
    }

    #[test]
    fn test_runtime_classification() {
        let engine = rhai::Engine::new();
        let err = engine.run("missing_fn(1)").unwrap_err();
        let diag = from_eval_error(ScriptPhase::Execute, "t", &err);
        assert_eq!(diag.kind, ScriptDiagnosticKind::HostApiMisuse);

        let err = engine.run(r#"throw "boom""#).unwrap_err();
        let diag = from_eval_error(ScriptPhase::Execute, "t", &err);
        assert_eq!(diag.kind, ScriptDiagnosticKind::RuntimeError);
        assert!(diag.message.contains("boom"));
    }

    #[test]
    fn test_protocol_errors_have_no_location() {
        let err = BridgeError::NotCallable {
            index: 0,
            found: "i64".into(),
        };
        let diag = from_bridge_error(ScriptPhase::Call, &err);
        assert_eq!(diag.kind, ScriptDiagnosticKind::CallerError);
        assert!(diag.location.is_none());
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"caller_error\""));
    }
}
