use rmcp::{
    handler::server::{router::tool::ToolRouter, ServerHandler, wrapper::Parameters},
    model::*,
    ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

pub const NWS_API_BASE: &str = "https://api.weather.gov";
const USER_AGENT: &str = "weather-app/1.0";

#[derive(Debug)]
pub struct WeatherServer {
    pub tool_router: ToolRouter<Self>,
    client: reqwest::Client,
    base_url: String,
}

impl Default for WeatherServer {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherServer {
    pub fn new() -> Self {
        Self::with_base_url(NWS_API_BASE)
    }

    /// Point the server at another NWS-compatible endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// GET a NWS document. Failures are logged and collapse to `None`; the
    /// tools turn that into a readable message rather than a protocol error.
    async fn fetch_nws<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let response = match self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/geo+json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url, error = %e, "NWS request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::error!(url, status = %response.status(), "NWS returned an error status");
            return None;
        }

        match response.json::<T>().await {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::error!(url, error = %e, "failed to parse NWS response");
                None
            }
        }
    }
}

// api.weather.gov response structures
#[derive(Debug, Deserialize)]
pub struct AlertsResponse {
    #[serde(default)]
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
pub struct AlertFeature {
    pub properties: AlertProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertProperties {
    pub event: Option<String>,
    pub area_desc: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub headline: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PointsResponse {
    pub properties: PointProperties,
}

#[derive(Debug, Deserialize)]
pub struct PointProperties {
    pub forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub properties: ForecastProperties,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastProperties {
    #[serde(default)]
    pub periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    pub name: Option<String>,
    pub temperature: Option<Value>,
    pub temperature_unit: Option<String>,
    pub short_forecast: Option<String>,
    pub wind_speed: Option<String>,
    pub wind_direction: Option<String>,
}

fn or_unknown(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("Unknown")
}

pub fn format_alert(props: &AlertProperties) -> String {
    [
        format!("Event: {}", or_unknown(props.event.as_deref())),
        format!("Area: {}", or_unknown(props.area_desc.as_deref())),
        format!("Severity: {}", or_unknown(props.severity.as_deref())),
        format!("Status: {}", or_unknown(props.status.as_deref())),
        format!(
            "Headline: {}",
            props
                .headline
                .as_deref()
                .filter(|h| !h.is_empty())
                .unwrap_or("No headline available")
        ),
        "---".to_string(),
    ]
    .join("\n")
}

pub fn format_period(period: &ForecastPeriod) -> String {
    let temperature = match &period.temperature {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Object(q)) => q
            .get("value")
            .and_then(Value::as_f64)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
        _ => "Unknown".to_string(),
    };

    [
        format!("{}:", or_unknown(period.name.as_deref())),
        format!(
            "Temperature: {}{}",
            temperature,
            period.temperature_unit.as_deref().unwrap_or("F")
        ),
        format!(
            "Wind: {} {}",
            or_unknown(period.wind_speed.as_deref()),
            period.wind_direction.as_deref().unwrap_or("")
        ),
        period
            .short_forecast
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| "No forecast available".to_string()),
        "---".to_string(),
    ]
    .join("\n")
}

pub fn format_alerts(state_code: &str, alerts: &AlertsResponse) -> String {
    let formatted: Vec<String> = alerts
        .features
        .iter()
        .map(|f| format_alert(&f.properties))
        .collect();
    let body = if formatted.is_empty() {
        "No active alerts.".to_string()
    } else {
        formatted.join("\n")
    };
    format!("Active alerts for {}:\n\n{}", state_code, body)
}

fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

// Tool parameter structs
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AlertsParams {
    #[schemars(description = "Two-letter state code (eg. CA, NY)")]
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ForecastParams {
    #[schemars(description = "Latitude of the location")]
    pub latitude: f64,
    #[schemars(description = "Longitude of the location")]
    pub longitude: f64,
}

#[rmcp::tool_router]
impl WeatherServer {
    #[rmcp::tool(description = "Get weather alerts for a state")]
    pub async fn get_alerts(
        &self,
        Parameters(params): Parameters<AlertsParams>,
    ) -> Result<CallToolResult, McpError> {
        let state = params.state.trim();
        if state.chars().count() != 2 {
            return Err(McpError::invalid_params(
                format!("state must be a two-letter code, got '{}'", state),
                None,
            ));
        }

        let state_code = state.to_uppercase();
        let url = format!(
            "{}/alerts?area={}",
            self.base_url,
            urlencoding::encode(&state_code)
        );
        let Some(alerts) = self.fetch_nws::<AlertsResponse>(&url).await else {
            return Ok(text_result("Failed to retrieve alerts data"));
        };

        Ok(text_result(format_alerts(&state_code, &alerts)))
    }

    #[rmcp::tool(description = "Get weather forecast for a location")]
    pub async fn get_forecast(
        &self,
        Parameters(params): Parameters<ForecastParams>,
    ) -> Result<CallToolResult, McpError> {
        let ForecastParams { latitude, longitude } = params;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(McpError::invalid_params(
                format!(
                    "coordinates out of range: latitude must be in [-90, 90], longitude in [-180, 180] (got {}, {})",
                    latitude, longitude
                ),
                None,
            ));
        }

        let points_url = format!("{}/points/{:.4},{:.4}", self.base_url, latitude, longitude);
        let Some(points) = self.fetch_nws::<PointsResponse>(&points_url).await else {
            return Ok(text_result(format!(
                "Failed to retrieve grid point data for ({}, {})",
                latitude, longitude
            )));
        };

        let Some(forecast_url) = points.properties.forecast else {
            return Ok(text_result(
                "Failed to get forecast URL from the grid point data",
            ));
        };

        let Some(forecast) = self.fetch_nws::<ForecastResponse>(&forecast_url).await else {
            return Ok(text_result("Failed to retrieve forecast data"));
        };

        let periods = forecast.properties.periods;
        if periods.is_empty() {
            return Ok(text_result("No forecast periods available"));
        }

        let formatted: Vec<String> = periods.iter().map(format_period).collect();
        Ok(text_result(format!(
            "Forecast for {}, {}:\n\n{}",
            latitude,
            longitude,
            formatted.join("\n")
        )))
    }
}

#[rmcp::tool_handler]
impl ServerHandler for WeatherServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some("US weather alerts and forecasts from the National Weather Service (api.weather.gov)".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn first_text(result: &CallToolResult) -> String {
        let value = serde_json::to_value(result).unwrap();
        value["content"][0]["text"].as_str().unwrap().to_string()
    }

    #[test]
    fn alert_fields_default_when_missing() {
        let props = AlertProperties {
            event: Some("Flood Warning".into()),
            ..Default::default()
        };
        assert_eq!(
            format_alert(&props),
            "Event: Flood Warning\nArea: Unknown\nSeverity: Unknown\nStatus: Unknown\nHeadline: No headline available\n---"
        );
    }

    #[test]
    fn period_is_formatted_with_default_unit() {
        let period = ForecastPeriod {
            name: Some("Tonight".into()),
            temperature: Some(json!(58)),
            wind_speed: Some("5 mph".into()),
            wind_direction: Some("SW".into()),
            short_forecast: Some("Partly Cloudy".into()),
            ..Default::default()
        };
        assert_eq!(
            format_period(&period),
            "Tonight:\nTemperature: 58F\nWind: 5 mph SW\nPartly Cloudy\n---"
        );
    }

    #[test]
    fn empty_alert_list_says_so() {
        let alerts = AlertsResponse { features: vec![] };
        assert_eq!(format_alerts("CA", &alerts), "Active alerts for CA:\n\nNo active alerts.");
    }

    #[tokio::test]
    async fn alerts_are_fetched_for_uppercased_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alerts"))
            .and(query_param("area", "CA"))
            .and(header("User-Agent", "weather-app/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "features": [{
                    "properties": {
                        "event": "Heat Advisory",
                        "areaDesc": "Sacramento Valley",
                        "severity": "Moderate",
                        "status": "Actual",
                        "headline": "Heat Advisory until 8 PM"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let weather = WeatherServer::with_base_url(server.uri());
        let result = weather
            .get_alerts(Parameters(AlertsParams { state: "ca".into() }))
            .await
            .unwrap();

        let text = first_text(&result);
        assert!(text.starts_with("Active alerts for CA:\n\nEvent: Heat Advisory"));
        assert!(text.contains("Area: Sacramento Valley"));
    }

    #[tokio::test]
    async fn failed_request_is_reported_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let weather = WeatherServer::with_base_url(server.uri());
        let result = weather
            .get_alerts(Parameters(AlertsParams { state: "NY".into() }))
            .await
            .unwrap();

        assert_eq!(first_text(&result), "Failed to retrieve alerts data");
    }

    #[tokio::test]
    async fn invalid_state_is_rejected() {
        let weather = WeatherServer::new();
        let result = weather
            .get_alerts(Parameters(AlertsParams { state: "Cal".into() }))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn forecast_follows_grid_point_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/points/40.7128,-74.0060"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": { "forecast": format!("{}/gridpoints/OKX/33,35/forecast", server.uri()) }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gridpoints/OKX/33,35/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": {
                    "periods": [{
                        "name": "Today",
                        "temperature": 75,
                        "temperatureUnit": "F",
                        "windSpeed": "10 mph",
                        "windDirection": "NW",
                        "shortForecast": "Sunny"
                    }]
                }
            })))
            .mount(&server)
            .await;

        let weather = WeatherServer::with_base_url(server.uri());
        let result = weather
            .get_forecast(Parameters(ForecastParams {
                latitude: 40.7128,
                longitude: -74.006,
            }))
            .await
            .unwrap();

        assert_eq!(
            first_text(&result),
            "Forecast for 40.7128, -74.006:\n\nToday:\nTemperature: 75F\nWind: 10 mph NW\nSunny\n---"
        );
    }

    #[tokio::test]
    async fn missing_forecast_link_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "properties": {} })))
            .mount(&server)
            .await;

        let weather = WeatherServer::with_base_url(server.uri());
        let result = weather
            .get_forecast(Parameters(ForecastParams {
                latitude: 35.0,
                longitude: -120.0,
            }))
            .await
            .unwrap();

        assert_eq!(
            first_text(&result),
            "Failed to get forecast URL from the grid point data"
        );
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_rejected() {
        let weather = WeatherServer::new();
        let result = weather
            .get_forecast(Parameters(ForecastParams {
                latitude: 91.0,
                longitude: 0.0,
            }))
            .await;
        assert!(result.is_err());
    }
}
