use serde::{de, Deserialize, Deserializer};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime, Time,
};
use uuid::Uuid;

/// Query string of the expense listing. Date bounds take RFC 3339 or a bare
/// `YYYY-MM-DD`; a bare end date covers the whole day.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseQuery {
    pub search_term: Option<String>,
    pub category_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    #[serde(default, deserialize_with = "start_bound")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "end_bound")]
    pub end_date: Option<OffsetDateTime>,
    pub receiver: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    pub amount: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub payment_date: OffsetDateTime,
    pub receiver: String,
    pub user_id: Uuid,
    pub category_id: Uuid,
}

fn parse_bound(raw: &str, end_of_day: bool) -> Result<OffsetDateTime, String> {
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(at);
    }
    let invalid = || format!("invalid date `{raw}`, expected RFC 3339 or YYYY-MM-DD");
    let date = Date::parse(raw, format_description!("[year]-[month]-[day]")).map_err(|_| invalid())?;
    let time = if end_of_day {
        Time::from_hms_nano(23, 59, 59, 999_999_999).map_err(|_| invalid())?
    } else {
        Time::MIDNIGHT
    };
    Ok(PrimitiveDateTime::new(date, time).assume_utc())
}

fn bound<'de, D: Deserializer<'de>>(
    deserializer: D,
    end_of_day: bool,
) -> Result<Option<OffsetDateTime>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_bound(s, end_of_day))
        .transpose()
        .map_err(de::Error::custom)
}

fn start_bound<'de, D: Deserializer<'de>>(d: D) -> Result<Option<OffsetDateTime>, D::Error> {
    bound(d, false)
}

fn end_bound<'de, D: Deserializer<'de>>(d: D) -> Result<Option<OffsetDateTime>, D::Error> {
    bound(d, true)
}
