//! Statement action handler.
//!
//! Resolves the date range of an account statement so it can be rendered
//! client-side as a workspace action.

use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate};

use crate::error::ActionError;
use crate::handler::ClientActionHandler;
use crate::types::{ClientAction, ClientActionOutcome};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Handler for `display_statement`.
///
/// Uses the `start`/`end` dates from the payload when present, otherwise the
/// previous calendar month.
pub struct StatementHandler {
    today: Option<NaiveDate>,
}

impl StatementHandler {
    pub fn new() -> Self {
        Self { today: None }
    }

    /// Pin "today", for deterministic defaults.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Default for StatementHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientActionHandler for StatementHandler {
    fn name(&self) -> &str {
        "display_statement"
    }

    async fn execute(&self, action: &ClientAction) -> Result<ClientActionOutcome, ActionError> {
        let (default_start, default_end) = previous_month(self.today())?;
        let start = parse_date_field(&action.payload, "start")?.unwrap_or(default_start);
        let end = parse_date_field(&action.payload, "end")?.unwrap_or(default_end);

        if start > end {
            return Err(ActionError::InvalidPayload(format!(
                "Statement start {} is after end {}",
                start, end
            )));
        }

        tracing::info!(%start, %end, "Statement range resolved");

        Ok(ClientActionOutcome::statement(serde_json::json!({
            "start": start.format(DATE_FORMAT).to_string(),
            "end": end.format(DATE_FORMAT).to_string(),
        })))
    }

    fn describe(&self, action: &ClientAction) -> String {
        let start = action
            .payload
            .get("start")
            .and_then(|v| v.as_str())
            .unwrap_or("<last month>");
        format!("Display statement from {}", start)
    }
}

fn parse_date_field(
    payload: &serde_json::Value,
    field: &str,
) -> Result<Option<NaiveDate>, ActionError> {
    match payload.get(field).and_then(|v| v.as_str()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|e| {
                ActionError::InvalidPayload(format!("Invalid {} date '{}': {}", field, raw, e))
            }),
    }
}

/// First and last day of the month before `today`.
fn previous_month(today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ActionError> {
    let out_of_range = || ActionError::HandlerFailed(format!("No previous month for {}", today));
    let end = today
        .with_day(1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(out_of_range)?;
    let start = end.with_day(1).ok_or_else(out_of_range)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClientActionResult;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_statement_explicit_range() {
        let handler = StatementHandler::with_today(date(2024, 5, 10));
        let action = ClientAction::new(
            "display_statement",
            json!({"start": "2024-03-01", "end": "2024-03-31"}),
        );
        let outcome = handler.execute(&action).await.unwrap();
        assert_eq!(outcome.result, ClientActionResult::Statement);
        assert_eq!(
            outcome.dates,
            Some(json!({"start": "2024-03-01", "end": "2024-03-31"}))
        );
    }

    #[tokio::test]
    async fn test_statement_defaults_to_previous_month() {
        let handler = StatementHandler::with_today(date(2024, 3, 15));
        let action = ClientAction::new("display_statement", json!({}));
        let outcome = handler.execute(&action).await.unwrap();
        assert_eq!(
            outcome.dates,
            Some(json!({"start": "2024-02-01", "end": "2024-02-29"}))
        );
    }

    #[tokio::test]
    async fn test_statement_january_wraps_year() {
        let handler = StatementHandler::with_today(date(2025, 1, 3));
        let outcome = handler
            .execute(&ClientAction::new("display_statement", json!(null)))
            .await
            .unwrap();
        assert_eq!(
            outcome.dates,
            Some(json!({"start": "2024-12-01", "end": "2024-12-31"}))
        );
    }

    #[tokio::test]
    async fn test_statement_invalid_date() {
        let handler = StatementHandler::new();
        let action = ClientAction::new("display_statement", json!({"start": "March 1st"}));
        let err = handler.execute(&action).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_statement_start_after_end() {
        let handler = StatementHandler::new();
        let action = ClientAction::new(
            "display_statement",
            json!({"start": "2024-04-01", "end": "2024-03-01"}),
        );
        let err = handler.execute(&action).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidPayload(_)));
    }

    #[test]
    fn test_statement_name() {
        assert_eq!(StatementHandler::new().name(), "display_statement");
    }

    #[test]
    fn test_statement_describe() {
        let action = ClientAction::new("display_statement", json!({"start": "2024-01-01"}));
        assert_eq!(
            StatementHandler::new().describe(&action),
            "Display statement from 2024-01-01"
        );
        let action = ClientAction::new("display_statement", json!({}));
        assert_eq!(
            StatementHandler::new().describe(&action),
            "Display statement from <last month>"
        );
    }
}
