//! Server-rendered HTML pages.
//!
//! Values interpolated into element content go through [`encode_text`];
//! values inside `"`-quoted attributes go through
//! [`encode_double_quoted_attribute`].

use brolly_weather::{Address, HourlyForecast, TemperatureUnit};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

pub const POSTCODE_ERROR_TITLE: &str = "Postcode error!";
pub const POSTCODE_ERROR_DETAIL: &str =
    "That postcode doesn't seem to be a valid UK postcode, please try again...";
pub const SIGN_IN_ERROR_TITLE: &str = "Sign-in error!";

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Brolly</title>
<script src="/static/scripts/clock.js"></script>
</head>
<body onload="startTime()">
<header>
<nav><a href="/">Postcode weather</a> | <a href="/user">My postcodes</a></nav>
<div id="clock"></div>
</header>
<main>
{body}
</main>
</body>
</html>
"#,
        title = encode_text(title),
    )
}

pub fn postcode_entry() -> String {
    layout(
        "Weather by postcode",
        r#"<h1>Weather by postcode</h1>
<form method="post" action="/">
<label for="postcode">UK postcode</label>
<input type="text" id="postcode" name="postcode" placeholder="SW1A 1AA" required>
<button type="submit">Get forecast</button>
</form>"#,
    )
}

/// Forecast table: one row per hour label, paired with the matching entry.
pub fn forecast(
    address: &Address,
    hours: &[(String, HourlyForecast)],
    unit: TemperatureUnit,
) -> String {
    let place = address.summary();
    let mut body = format!("<h1>Forecast for {}</h1>\n", encode_text(&place));

    if let Some(road) = address.road.as_deref() {
        let _ = writeln!(body, "<p class=\"road\">Near {}</p>", encode_text(road));
    }

    body.push_str(
        "<table>\n<tr><th>Time</th><th></th><th>Conditions</th><th>Temp</th>\
         <th>Feels like</th><th>Rain</th><th>Humidity</th><th>Wind</th></tr>\n",
    );

    for (label, hour) in hours {
        let conditions = if hour.description.is_empty() {
            hour.condition.description().to_string()
        } else {
            hour.description.clone()
        };
        let icon = if hour.icon.is_empty() {
            String::new()
        } else {
            format!(
                "<img src=\"{}\" alt=\"{}\" width=\"50\" height=\"50\">",
                encode_double_quoted_attribute(&hour.icon_url()),
                encode_double_quoted_attribute(&conditions)
            )
        };

        let _ = writeln!(
            body,
            "<tr><td>{label}</td><td>{icon}</td><td>{conditions}</td>\
             <td>{temp:.0}{sym}</td><td>{feels:.0}{sym}</td><td>{rain}%</td>\
             <td>{humidity}%</td><td>{wind:.1} {wind_sym}</td></tr>",
            label = encode_text(label),
            conditions = encode_text(&conditions),
            temp = hour.temperature,
            feels = hour.feels_like,
            sym = unit.symbol(),
            rain = hour.precipitation_chance,
            humidity = hour.humidity,
            wind = hour.wind_speed,
            wind_sym = unit.wind_symbol(),
        );
    }
    body.push_str("</table>");

    layout(&format!("Forecast for {place}"), &body)
}

/// Saved postcodes, each a button that opens its forecast.
pub fn user_page(email: &str, display_name: &str, postcodes: &[String]) -> String {
    let mut body = format!(
        "<h1>Hello, {}</h1>\n<p>Signed in as {}</p>\n<form method=\"post\" action=\"/user\">\n",
        encode_text(display_name),
        encode_text(email)
    );

    if postcodes.is_empty() {
        body.push_str("<p>You have no saved postcodes yet.</p>\n");
    } else {
        body.push_str("<ul class=\"postcodes\">\n");
        for postcode in postcodes {
            let _ = writeln!(
                body,
                "<li><button type=\"submit\" name=\"button\" value=\"{}\">{}</button></li>",
                encode_double_quoted_attribute(postcode),
                encode_text(postcode)
            );
        }
        body.push_str("</ul>\n");
    }

    body.push_str(
        r#"<label for="entered-postcode">Add a postcode</label>
<input type="text" id="entered-postcode" name="entered-postcode" placeholder="SW1A 1AA">
<button type="submit" name="button" value="addpostcode">Add</button>
<button type="submit" name="button" value="logout">Log out</button>
</form>"#,
    );

    layout("My postcodes", &body)
}

pub fn general_error(main: &str, detail: &str) -> String {
    layout(
        main,
        &format!(
            "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to the start</a></p>",
            encode_text(main),
            encode_text(detail)
        ),
    )
}

/// Page for HTTP failures such as 404 and 500.
pub fn status_error(status: u16, detail: &str) -> String {
    layout(
        &format!("Error {status}"),
        &format!(
            "<h1>{status}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to the start</a></p>",
            encode_text(detail)
        ),
    )
}
