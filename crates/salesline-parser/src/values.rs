use chrono::NaiveDate;

use crate::model::DateOrder;

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Parses an order/ship date. ISO dates are accepted regardless of `order`;
/// everything else uses the configured day/month field order. A two-digit
/// year is recognised by the width of the year field, not by its value.
pub(crate) fn parse_date(value: &str, order: DateOrder) -> Result<NaiveDate, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("empty date".to_string());
    }
    // Drop a trailing time-of-day such as `2016-11-08 00:00:00`.
    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);

    let fields: Vec<&str> = date_part.split(['/', '-', '.']).collect();
    if fields.len() != 3 {
        return Err(format!("expected three date fields, found {}", fields.len()));
    }

    if fields[0].len() == 4 {
        return NaiveDate::parse_from_str(date_part, ISO_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(&fields.join("-"), ISO_FORMAT))
            .map_err(|err| format!("invalid ISO date: {err}"));
    }

    let year_token = if fields[2].len() == 2 { "%y" } else { "%Y" };
    let format = match order {
        DateOrder::DayFirst => format!("%d-%m-{year_token}"),
        DateOrder::MonthFirst => format!("%m-%d-{year_token}"),
    };
    NaiveDate::parse_from_str(&fields.join("-"), &format)
        .map_err(|err| format!("invalid {order} date: {err}"))
}

fn is_missing(trimmed: &str) -> bool {
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("na")
}

pub(crate) fn parse_optional_f64(value: &str) -> Result<Option<f64>, String> {
    let trimmed = value.trim();
    if is_missing(trimmed) {
        return Ok(None);
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',' && *c != '$').collect();
    let parsed = cleaned
        .parse::<f64>()
        .map_err(|err| format!("not a number: {err}"))?;
    if parsed.is_finite() {
        Ok(Some(parsed))
    } else {
        Err("not a finite number".to_string())
    }
}

/// Quantities are counts; `3.0` is accepted, `2.5` is not.
pub(crate) fn parse_optional_i64(value: &str) -> Result<Option<i64>, String> {
    let trimmed = value.trim();
    if is_missing(trimmed) {
        return Ok(None);
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Ok(Some(parsed));
    }
    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed.fract() == 0.0 => Ok(Some(parsed as i64)),
        Ok(_) => Err("not a whole number".to_string()),
        Err(err) => Err(format!("not an integer: {err}")),
    }
}

pub(crate) fn clean_text(value: &str) -> String {
    value.trim().to_string()
}
