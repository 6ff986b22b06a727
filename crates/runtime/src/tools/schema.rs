//! Static tool schema registry.
//!
//! Every builtin tool has exactly one [`ToolSchema`], declared here as a
//! `static`. Schemas drive both local argument validation and the function
//! declarations advertised to the model.

use super::{ToolArgs, ToolError};
use crate::model::ToolSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

/// Tool category. One per builtin tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Calc,
    Weather,
    Kb,
    UnitConverter,
    TextAnalyzer,
}

impl ToolKind {
    /// Every builtin tool, in registration order.
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Calc,
        ToolKind::Weather,
        ToolKind::Kb,
        ToolKind::UnitConverter,
        ToolKind::TextAnalyzer,
    ];

    /// The immutable schema for this tool.
    pub fn schema(self) -> &'static ToolSchema {
        match self {
            ToolKind::Calc => &CALC,
            ToolKind::Weather => &WEATHER,
            ToolKind::Kb => &KB,
            ToolKind::UnitConverter => &UNIT_CONVERTER,
            ToolKind::TextAnalyzer => &TEXT_ANALYZER,
        }
    }
}

/// Primitive type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default value of an optional parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Str(&'static str),
    Number(f64),
}

impl From<DefaultValue> for Value {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::Str(s) => Value::from(s),
            DefaultValue::Number(n) => Value::from(n),
        }
    }
}

/// A declared tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolParameter {
    pub name: &'static str,
    pub kind: ParamType,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<DefaultValue>,
}

impl ToolParameter {
    pub const fn required(name: &'static str, kind: ParamType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
            default: None,
        }
    }

    pub const fn optional(
        name: &'static str,
        kind: ParamType,
        description: &'static str,
        default: DefaultValue,
    ) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            default: Some(default),
        }
    }
}

/// Declarative description of a tool.
#[derive(Debug, PartialEq)]
pub struct ToolSchema {
    pub name: &'static str,
    pub kind: ToolKind,
    pub description: &'static str,
    pub parameters: &'static [ToolParameter],
}

impl ToolSchema {
    /// Check presence and primitive type of every declared parameter.
    ///
    /// Parameters are checked in declaration order and the first problem is
    /// returned. Undeclared arguments are ignored.
    pub fn validate(&self, args: &ToolArgs) -> Result<(), ToolError> {
        for param in self.parameters {
            match args.get(param.name) {
                None if param.required => {
                    return Err(ToolError::MissingParameter(param.name.to_string()));
                }
                None => {}
                Some(value) if !param.kind.accepts(value) => {
                    return Err(ToolError::InvalidType {
                        name: param.name.to_string(),
                        expected: param.kind,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Fill absent optional parameters with their declared defaults.
    pub fn apply_defaults(&self, args: &mut ToolArgs) {
        for param in self.parameters {
            if let Some(default) = param.default {
                args.0
                    .entry(param.name)
                    .or_insert_with(|| Value::from(default));
            }
        }
    }

    /// JSON-schema-like parameter object used in function declarations.
    pub fn parameters_json(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.parameters {
            properties.insert(
                param.name.to_string(),
                json!({
                    "type": param.kind.as_str(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(param.name);
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// The function declaration advertised to the model.
    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.to_string(),
            description: self.description.to_string(),
            schema: self.parameters_json(),
        }
    }
}

pub static CALC: ToolSchema = ToolSchema {
    name: "calc",
    kind: ToolKind::Calc,
    description: "Evaluate a mathematical expression",
    parameters: &[ToolParameter::required(
        "expr",
        ParamType::String,
        "Mathematical expression to evaluate",
    )],
};

pub static WEATHER: ToolSchema = ToolSchema {
    name: "weather",
    kind: ToolKind::Weather,
    description: "Get weather information for a city",
    parameters: &[ToolParameter::required("city", ParamType::String, "City name")],
};

pub static KB: ToolSchema = ToolSchema {
    name: "kb",
    kind: ToolKind::Kb,
    description: "Look up information in knowledge base",
    parameters: &[ToolParameter::required("q", ParamType::String, "Query string")],
};

pub static UNIT_CONVERTER: ToolSchema = ToolSchema {
    name: "unit_converter",
    kind: ToolKind::UnitConverter,
    description: "Convert Celsius to Fahrenheit",
    parameters: &[ToolParameter::required(
        "celsius",
        ParamType::Number,
        "Temperature in Celsius",
    )],
};

pub static TEXT_ANALYZER: ToolSchema = ToolSchema {
    name: "text_analyzer",
    kind: ToolKind::TextAnalyzer,
    description: "Analyze text for word count, character count, and sentiment",
    parameters: &[
        ToolParameter::required("text", ParamType::String, "Text to analyze"),
        ToolParameter::optional(
            "analysis_type",
            ParamType::String,
            "Type of analysis: 'basic' or 'sentiment'",
            DefaultValue::Str("basic"),
        ),
    ],
};
