use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Number, Value};
use tracing::warn;

use super::WeatherConfig;
use crate::model::Backend;
use crate::tools::{Tool, ToolArgs, ToolError, ToolSchema, WEATHER};

const API_KEY_VAR: &str = "WEATHER_API_KEY";

#[derive(Debug, Deserialize)]
struct ApiWeather {
    main: ApiMain,
    #[serde(default)]
    weather: Vec<ApiCondition>,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: Number,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    description: String,
}

/// Current conditions for a city.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub city: String,
    /// Degrees Celsius, as reported. Integral floats keep their `.0`.
    pub temp: Number,
    pub description: String,
}

impl Observation {
    fn from_api(city: &str, api: ApiWeather) -> Result<Self, ToolError> {
        let description = api
            .weather
            .into_iter()
            .next()
            .map(|c| c.description.to_lowercase())
            .ok_or_else(|| ToolError::Execution("weather response has no conditions".into()))?;
        Ok(Self {
            city: city.to_string(),
            temp: api.main.temp,
            description,
        })
    }

    /// Deterministic one-line summary.
    pub fn sentence(&self) -> String {
        format!(
            "The temperature in {} is {}°C with {}.",
            title_case(&self.city),
            self.temp,
            self.description
        )
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// The `weather` tool.
///
/// Looks up current conditions over HTTP and, when a model is available,
/// has it phrase the answer to the user's question.
pub struct WeatherTool<B> {
    http: reqwest::Client,
    api_key: Option<String>,
    url: String,
    model: Option<Arc<B>>,
}

impl<B: Backend> WeatherTool<B> {
    pub fn new(config: &WeatherConfig, model: Option<Arc<B>>) -> Result<Self, ToolError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ToolError::Execution(format!("weather client: {e}")))?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            url: config.url.clone(),
            model,
        })
    }

    /// Fetch current conditions for `city`.
    pub async fn fetch(&self, city: &str) -> Result<Observation, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ToolError::MissingCredential(API_KEY_VAR.to_string()))?;

        let url = reqwest::Url::parse_with_params(
            &self.url,
            &[("q", city), ("appid", api_key), ("units", "metric")],
        )
        .map_err(|e| ToolError::Execution(format!("invalid weather url: {e}")))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("weather request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Execution(format!(
                "weather service returned {status}"
            )));
        }

        let api: ApiWeather = response.json().await.map_err(|e| {
            ToolError::Execution(format!("invalid weather response: {}", e.without_url()))
        })?;
        Observation::from_api(city, api)
    }

    /// Phrase an observation as an answer to `question`.
    ///
    /// Falls back to [`Observation::sentence`] whenever the model is missing,
    /// fails, or says nothing.
    pub async fn phrase(&self, observation: &Observation, question: &str) -> String {
        let Some(model) = &self.model else {
            return observation.sentence();
        };
        if question.trim().is_empty() {
            return observation.sentence();
        }

        let prompt = format!(
            "User asked: '{question}'. Weather data for {city}: temperature is {temp}°C, \
             description is '{description}'. Generate a natural response addressing the \
             user's prompt using this weather data.",
            city = observation.city,
            temp = observation.temp,
            description = observation.description,
        );

        match model.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => observation.sentence(),
            Err(e) => {
                warn!(error = %e, "weather phrasing failed, using template");
                observation.sentence()
            }
        }
    }
}

#[async_trait]
impl<B: Backend + 'static> Tool for WeatherTool<B> {
    fn schema(&self) -> &ToolSchema {
        &WEATHER
    }

    async fn execute(&self, args: &ToolArgs, question: &str) -> Result<Value, ToolError> {
        let city = args.str("city")?;
        let observation = self.fetch(city).await?;
        Ok(Value::String(self.phrase(&observation, question).await))
    }
}
