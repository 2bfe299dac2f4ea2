//! Translation of MET Norway symbol codes into display text.

/// Summary used when the forecast carries no condition code at all.
pub const NO_SUMMARY: &str = "No summary available";

/// Human-readable text for an upstream symbol code.
///
/// Known codes come from a fixed table; anything else is prettified so new
/// upstream codes still read sensibly.
pub fn symbol_to_text(symbol_code: &str) -> String {
    let known = match symbol_code {
        "clearsky_day" | "clearsky_night" => Some("Clear sky"),
        "cloudy" => Some("Cloudy"),
        "fair_day" | "fair_night" => Some("Fair"),
        "partlycloudy_day" | "partlycloudy_night" => Some("Partly cloudy"),
        "rain" => Some("Rain"),
        "heavyrain" => Some("Heavy rain"),
        "lightrain" => Some("Light rain"),
        "snow" => Some("Snow"),
        "heavysnow" => Some("Heavy snow"),
        "lightsnow" => Some("Light snow"),
        "fog" => Some("Fog"),
        _ => None,
    };

    match known {
        Some(text) => text.to_string(),
        None => prettify(symbol_code),
    }
}

fn prettify(symbol_code: &str) -> String {
    let words = symbol_code
        .replace("_day", "")
        .replace("_night", "")
        .replace('_', " ");

    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
