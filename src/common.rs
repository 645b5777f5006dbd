/// Common types and utilities shared across handlers, commands and services
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::errors::ServiceError;

/// Optional `from` / `to` filter on `created_at`, both inclusive, `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DateRangeParams {
    /// Converts the date strings into a UTC range covering whole days.
    pub fn to_datetime_range(
        &self,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ServiceError> {
        let start = match non_blank(self.from.as_deref()) {
            Some(raw) => Some(
                parse_date(raw, "from")?
                    .and_hms_opt(0, 0, 0)
                    .ok_or_else(|| ServiceError::ValidationError("Invalid from date".to_string()))?
                    .and_utc(),
            ),
            None => None,
        };
        let end = match non_blank(self.to.as_deref()) {
            Some(raw) => Some(
                parse_date(raw, "to")?
                    .and_hms_milli_opt(23, 59, 59, 999)
                    .ok_or_else(|| ServiceError::ValidationError("Invalid to date".to_string()))?
                    .and_utc(),
            ),
            None => None,
        };

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ServiceError::ValidationError(
                    "from date must not be after to date".to_string(),
                ));
            }
        }
        Ok((start, end))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(raw: &str, name: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ServiceError::ValidationError(format!("Invalid {} date format: {}", name, e)))
}

/// Money as sent by clients: a JSON number, a numeric string, `""` or `null`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientMoney {
    Number(serde_json::Number),
    Text(String),
}

fn parse_money<E: de::Error>(raw: Option<LenientMoney>) -> Result<Option<Decimal>, E> {
    let text = match raw {
        None => return Ok(None),
        Some(LenientMoney::Number(n)) => n.to_string(),
        Some(LenientMoney::Text(s)) => s,
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map(Some)
        .map_err(|_| E::custom(format!("'{}' is not a valid amount", text)))
}

/// Missing, `null` and `""` read as zero. Use with `#[serde(default)]`.
pub fn deserialize_money<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LenientMoney>::deserialize(deserializer)?;
    Ok(parse_money::<D::Error>(raw)?.unwrap_or(Decimal::ZERO))
}

/// Missing, `null` and `""` read as `None`. Use with `#[serde(default)]`.
pub fn deserialize_optional_money<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LenientMoney>::deserialize(deserializer)?;
    parse_money::<D::Error>(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Debug, Deserialize)]
    struct Line {
        #[serde(default, deserialize_with = "deserialize_money")]
        unit_price: Decimal,
        #[serde(default, deserialize_with = "deserialize_optional_money")]
        exchange_rate: Option<Decimal>,
    }

    fn parse(json: &str) -> Line {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn blank_money_reads_as_zero() {
        assert_eq!(parse(r#"{}"#).unit_price, Decimal::ZERO);
        assert_eq!(parse(r#"{"unit_price": null}"#).unit_price, Decimal::ZERO);
        assert_eq!(parse(r#"{"unit_price": ""}"#).unit_price, Decimal::ZERO);
        assert_eq!(parse(r#"{"exchange_rate": ""}"#).exchange_rate, None);
    }

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        assert_eq!(parse(r#"{"unit_price": 12.5}"#).unit_price, dec!(12.5));
        assert_eq!(parse(r#"{"unit_price": "1500000"}"#).unit_price, dec!(1500000));
        assert_eq!(
            parse(r#"{"exchange_rate": "15750.25"}"#).exchange_rate,
            Some(dec!(15750.25))
        );
    }

    #[test]
    fn garbage_amount_is_rejected() {
        assert!(serde_json::from_str::<Line>(r#"{"unit_price": "abc"}"#).is_err());
    }

    #[test]
    fn date_range_covers_whole_days() {
        let range = DateRangeParams {
            from: Some("2024-03-01".into()),
            to: Some("2024-03-01".into()),
        };
        let (start, end) = range.to_datetime_range().unwrap();
        assert!(start.unwrap() < end.unwrap());

        let inverted = DateRangeParams {
            from: Some("2024-03-02".into()),
            to: Some("2024-03-01".into()),
        };
        assert!(inverted.to_datetime_range().is_err());
        assert!(DateRangeParams::default().to_datetime_range().unwrap().0.is_none());
    }
}
