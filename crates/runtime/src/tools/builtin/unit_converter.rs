use async_trait::async_trait;
use serde_json::Value;

use super::render_float;
use crate::tools::{Tool, ToolArgs, ToolError, ToolSchema, UNIT_CONVERTER};

/// The `unit_converter` tool: Celsius to Fahrenheit.
#[derive(Debug, Default)]
pub struct UnitConverter;

impl UnitConverter {
    pub fn fahrenheit(celsius: f64) -> f64 {
        celsius * 9.0 / 5.0 + 32.0
    }
}

#[async_trait]
impl Tool for UnitConverter {
    fn schema(&self) -> &ToolSchema {
        &UNIT_CONVERTER
    }

    async fn execute(&self, args: &ToolArgs, _question: &str) -> Result<Value, ToolError> {
        let celsius = args.number("celsius")?;
        let fahrenheit = Self::fahrenheit(celsius);
        Ok(Value::String(format!(
            "{}°C = {}°F",
            render_float(celsius),
            render_float(fahrenheit)
        )))
    }
}
