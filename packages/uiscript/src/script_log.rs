//! Script logging: the `log` global and its `Log` type.
//!
//! Scripts log through `log.info(value)`, `log.warn(value)`,
//! `log.error(value)` or `log.message(level, value)` with a level from
//! `log.logtype`. Everything is forwarded to the `log` facade under the
//! `script` target.

use rhai::{Dynamic, Engine, EvalAltResult, Map};

use crate::bindings::BindingContext;

/// Log target used for everything scripts emit.
pub const SCRIPT_TARGET: &str = "script";

/// Log level for script messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Always,
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Always,
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Debug,
    ];

    /// Script-visible name, used as key in `log.logtype`.
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Always => "always",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<LogLevel> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    fn facade_level(self) -> log::Level {
        match self {
            // Always-level messages must survive the default filter.
            LogLevel::Always | LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}

/// Emit a script message at the given level.
pub fn script_log(level: LogLevel, message: &str) {
    log::log!(target: SCRIPT_TARGET, level.facade_level(), "{}", message);
}

/// Convert a Rhai Dynamic value to a string safely.
/// Never panics, handles all types gracefully.
pub fn stringify_dynamic(value: &Dynamic) -> String {
    if let Ok(s) = value.clone().into_string() {
        return s;
    }

    if value.is_array() {
        if let Some(arr) = value.clone().try_cast::<rhai::Array>() {
            let parts: Vec<String> = arr.iter().map(stringify_dynamic).collect();
            return parts.join(" ");
        }
    }

    if value.is_map() {
        if let Some(map) = value.clone().try_cast::<Map>() {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, stringify_dynamic(v)))
                .collect();
            return format!("{{{}}}", parts.join(", "));
        }
    }

    if value.is_unit() {
        return "()".to_string();
    }

    // Numbers, booleans and host types all implement Display.
    value.to_string()
}

/// The script-side `log` object. Holds no state.
#[derive(Debug, Clone, Default)]
pub struct ScriptLogger;

impl ScriptLogger {
    pub fn info(&self, value: Dynamic) {
        script_log(LogLevel::Info, &stringify_dynamic(&value));
    }

    pub fn warn(&self, value: Dynamic) {
        script_log(LogLevel::Warning, &stringify_dynamic(&value));
    }

    pub fn error(&self, value: Dynamic) {
        script_log(LogLevel::Error, &stringify_dynamic(&value));
    }

    pub fn message(&self, level: i64, value: Dynamic) -> Result<(), Box<EvalAltResult>> {
        let level = LogLevel::from_code(level)
            .ok_or_else(|| format!("Unknown log level {level}; use log.logtype"))?;
        script_log(level, &stringify_dynamic(&value));
        Ok(())
    }

    pub fn logtype(&self) -> Map {
        let mut map = Map::new();
        for level in LogLevel::ALL {
            map.insert(level.name().into(), Dynamic::from(level.code()));
        }
        map
    }
}

/// Register the `Log` type and the `log` global.
pub fn register_log_api(engine: &mut Engine, ctx: &mut BindingContext) {
    engine
        .register_type_with_name::<ScriptLogger>("Log")
        .register_fn("info", |l: &mut ScriptLogger, value: Dynamic| l.info(value))
        .register_fn("warn", |l: &mut ScriptLogger, value: Dynamic| l.warn(value))
        .register_fn("error", |l: &mut ScriptLogger, value: Dynamic| l.error(value))
        .register_fn("message", |l: &mut ScriptLogger, level: i64, value: Dynamic| {
            l.message(level, value)
        })
        .register_get("logtype", |l: &mut ScriptLogger| l.logtype())
        .register_fn("to_string", |_: &mut ScriptLogger| "Log".to_string());

    ctx.define_global("log", ScriptLogger);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringify_string() {
        let value = Dynamic::from("hello");
        assert_eq!(stringify_dynamic(&value), "hello");
    }

    #[test]
    fn test_stringify_int() {
        let value = Dynamic::from(42_i64);
        assert_eq!(stringify_dynamic(&value), "42");
    }

    #[test]
    fn test_stringify_float() {
        let value = Dynamic::from(3.5_f32);
        assert_eq!(stringify_dynamic(&value), "3.5");
    }

    #[test]
    fn test_stringify_array() {
        let arr: rhai::Array = vec![Dynamic::from("width"), Dynamic::from(0.5_f32)];
        assert_eq!(stringify_dynamic(&Dynamic::from(arr)), "width 0.5");
    }

    #[test]
    fn test_level_codes_round_trip() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::from_code(level.code()), Some(level));
        }
        assert_eq!(LogLevel::from_code(99), None);
    }

    #[test]
    fn test_message_rejects_unknown_level() {
        let logger = ScriptLogger;
        assert!(logger.message(LogLevel::Info.code(), Dynamic::from("ok")).is_ok());
        assert!(logger.message(42, Dynamic::from("nope")).is_err());
    }

    #[test]
    fn test_logtype_lists_every_level() {
        let map = ScriptLogger.logtype();
        assert_eq!(map.len(), 5);
        assert_eq!(map["warning"].as_int().unwrap(), LogLevel::Warning.code());
    }
}
