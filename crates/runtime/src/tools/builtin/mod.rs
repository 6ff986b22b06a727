//! Builtin tools.
//!
//! The set of tools is fixed at compile time: [`construct`] maps every
//! [`ToolKind`] to its constructor.

mod calculator;
mod kb;
mod text_analyzer;
mod unit_converter;
mod weather;

pub use calculator::{Calculator, EvalError, Number, calculate};
pub use kb::{EMPTY_KNOWLEDGE_BASE, Entry, KnowledgeBase, NOT_FOUND};
pub use text_analyzer::TextAnalyzer;
pub use unit_converter::UnitConverter;
pub use weather::{Observation, WeatherTool};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::{Tool, ToolError, ToolKind};
use crate::model::Backend;

pub const DEFAULT_KB_PATH: &str = "data/kb.json";
pub const DEFAULT_WEATHER_URL: &str = "http://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_WEATHER_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for the builtin tools.
#[derive(Debug, Clone)]
pub struct BuiltinConfig {
    /// Knowledge base JSON file.
    pub knowledge_base: PathBuf,
    pub weather: WeatherConfig,
}

impl Default for BuiltinConfig {
    fn default() -> Self {
        Self {
            knowledge_base: PathBuf::from(DEFAULT_KB_PATH),
            weather: WeatherConfig::default(),
        }
    }
}

/// Weather provider settings.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// Checked when the tool runs, not at startup.
    pub api_key: Option<String>,
    pub url: String,
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            url: DEFAULT_WEATHER_URL.to_string(),
            timeout: DEFAULT_WEATHER_TIMEOUT,
        }
    }
}

/// Build the builtin tool for `kind`.
pub fn construct<B: Backend + 'static>(
    kind: ToolKind,
    config: &BuiltinConfig,
    backend: &Arc<B>,
) -> Result<Box<dyn Tool>, ToolError> {
    let tool: Box<dyn Tool> = match kind {
        ToolKind::Calc => Box::new(Calculator),
        ToolKind::Weather => Box::new(WeatherTool::new(&config.weather, Some(backend.clone()))?),
        ToolKind::Kb => Box::new(KnowledgeBase::load(
            &config.knowledge_base,
            Some(backend.clone()),
        )),
        ToolKind::UnitConverter => Box::new(UnitConverter),
        ToolKind::TextAnalyzer => Box::new(TextAnalyzer),
    };
    Ok(tool)
}

/// Render a float with a trailing `.0` when it is integral, switching to
/// exponent notation outside `[1e-4, 1e16)`.
pub(crate) fn render_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{value:e}");
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
