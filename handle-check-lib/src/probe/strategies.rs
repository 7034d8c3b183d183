//! Classifiers for each probe strategy.
//!
//! Every function here is pure: it looks at the platform definition and the
//! captured response and returns exactly one [`Availability`].

use super::ProbeResponse;
use crate::catalog::PlatformDefinition;
use crate::types::Availability;
use reqwest::Url;
use scraper::{Html, Selector};
use serde_json::Value;

/// Title phrases that mark a missing account on markup-probed platforms.
const TITLE_NOT_FOUND_PHRASES: &[&str] = &["not found", "doesn't exist", "user not found"];

lazy_static::lazy_static! {
    static ref TITLE_SELECTOR: Selector =
        Selector::parse("title").expect("static selector is valid");
}

/// Plain status mapping: 404 available, 200 taken, anything else unknown.
pub fn status_verdict(status: u16) -> Availability {
    match status {
        200 => Availability::Taken,
        404 => Availability::Available,
        _ => Availability::Unknown,
    }
}

pub fn classify_status(
    _platform: &str,
    _definition: &PlatformDefinition,
    response: &ProbeResponse,
) -> Availability {
    status_verdict(response.status)
}

/// Keyword search over the case-folded body.
///
/// A not-found marker wins regardless of status. Found markers only count
/// on a 200.
pub fn classify_content(
    _platform: &str,
    definition: &PlatformDefinition,
    response: &ProbeResponse,
) -> Availability {
    let content = response.body_text().to_lowercase();

    if contains_any(&content, &definition.not_found_markers()) {
        return Availability::Available;
    }

    match response.status {
        200 if contains_any(&content, &definition.found_markers()) => Availability::Taken,
        200 => Availability::Unknown,
        404 => Availability::Available,
        _ => Availability::Unknown,
    }
}

/// JSON API lookup.
///
/// A 200 with a payload lacking the existence field counts as taken: any
/// payload is treated as evidence the account exists.
pub fn classify_api(
    _platform: &str,
    definition: &PlatformDefinition,
    response: &ProbeResponse,
) -> Availability {
    match response.status {
        200 => match serde_json::from_str::<Value>(response.body_text()) {
            Ok(Value::Object(map)) => match map.get(definition.exists_field()) {
                Some(value) if is_truthy(value) => Availability::Taken,
                Some(_) => Availability::Available,
                None => Availability::Taken,
            },
            Ok(_) => Availability::Taken,
            Err(_) => Availability::Unknown,
        },
        404 => Availability::Available,
        _ => Availability::Unknown,
    }
}

/// Compare where the request ended up with where it started.
pub fn classify_redirect(
    _platform: &str,
    definition: &PlatformDefinition,
    response: &ProbeResponse,
) -> Availability {
    if normalize_url(&response.final_url) == normalize_url(&response.requested_url) {
        return status_verdict(response.status);
    }

    let final_url = response.final_url.to_lowercase();
    if contains_any(&final_url, &definition.redirect_markers()) {
        Availability::Available
    } else {
        Availability::Taken
    }
}

/// Title inspection for platforms that answer 200 whether or not the
/// account exists, followed by fixed per-platform body overrides.
pub fn classify_markup(
    platform: &str,
    _definition: &PlatformDefinition,
    response: &ProbeResponse,
) -> Availability {
    match response.status {
        200 => {
            let body = response.body_text();
            let document = Html::parse_document(body);
            let title = document
                .select(&TITLE_SELECTOR)
                .next()
                .map(|element| element.text().collect::<String>().to_lowercase());

            let verdict = match title {
                Some(title) if contains_any(&title, TITLE_NOT_FOUND_PHRASES) => {
                    Availability::Available
                }
                Some(_) => Availability::Taken,
                None => Availability::Unknown,
            };

            platform_override(platform, &body.to_lowercase()).unwrap_or(verdict)
        }
        404 => Availability::Available,
        _ => Availability::Unknown,
    }
}

fn platform_override(platform: &str, body: &str) -> Option<Availability> {
    match platform.to_lowercase().as_str() {
        // suspended accounts still hold the name
        "twitter" | "x" if body.contains("account suspended") => Some(Availability::Taken),
        "instagram" if body.contains("sorry, this page isn't available") => {
            Some(Availability::Available)
        }
        "tiktok" if body.contains("couldn't find this account") => Some(Availability::Available),
        _ => None,
    }
}

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers
        .iter()
        .any(|marker| haystack.contains(&marker.to_lowercase()))
}

fn normalize_url(raw: &str) -> String {
    Url::parse(raw.trim())
        .map(|url| url.to_string())
        .unwrap_or_else(|_| raw.trim().to_string())
}

/// JSON truthiness: null, false, zero and empty containers are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def() -> PlatformDefinition {
        PlatformDefinition::new("https://x.test/{username}")
    }

    fn page(status: u16, body: &str) -> ProbeResponse {
        ProbeResponse::new("https://x.test/alice", status, Some(body.to_string()))
    }

    #[test]
    fn test_status_strategy() {
        let d = def();
        assert_eq!(classify_status("X", &d, &page(404, "")), Availability::Available);
        assert_eq!(classify_status("X", &d, &page(200, "")), Availability::Taken);
        assert_eq!(classify_status("X", &d, &page(500, "")), Availability::Unknown);
        assert_eq!(classify_status("X", &d, &page(301, "")), Availability::Unknown);
    }

    #[test]
    fn test_content_not_found_marker_wins_on_200() {
        let d = def();
        let response = page(200, "<h1>User Not Found</h1> followers");
        assert_eq!(classify_content("X", &d, &response), Availability::Available);
    }

    #[test]
    fn test_content_found_marker() {
        let d = def();
        assert_eq!(
            classify_content("X", &d, &page(200, "1,204 Followers")),
            Availability::Taken
        );
        assert_eq!(
            classify_content("X", &d, &page(200, "<html>nothing here</html>")),
            Availability::Unknown
        );
    }

    #[test]
    fn test_content_non_200_fallback() {
        let d = def();
        assert_eq!(classify_content("X", &d, &page(404, "")), Availability::Available);
        assert_eq!(
            classify_content("X", &d, &page(503, "followers")),
            Availability::Unknown
        );
    }

    #[test]
    fn test_content_custom_markers() {
        let mut d = def();
        d.not_found_indicators = Some(vec!["No Such User".to_string()]);
        d.found_indicators = Some(vec!["karma".to_string()]);

        assert_eq!(
            classify_content("X", &d, &page(200, "no such user")),
            Availability::Available
        );
        assert_eq!(classify_content("X", &d, &page(200, "karma: 12")), Availability::Taken);
        // defaults no longer apply once markers are configured
        assert_eq!(
            classify_content("X", &d, &page(200, "user not found, followers")),
            Availability::Unknown
        );
    }

    #[test]
    fn test_api_existence_field() {
        let d = def();
        assert_eq!(
            classify_api("X", &d, &page(200, r#"{"exists": false}"#)),
            Availability::Available
        );
        assert_eq!(
            classify_api("X", &d, &page(200, r#"{"exists": true}"#)),
            Availability::Taken
        );
        assert_eq!(
            classify_api("X", &d, &page(200, r#"{"login": "alice"}"#)),
            Availability::Taken
        );
        assert_eq!(
            classify_api("X", &d, &page(200, "<html>not json</html>")),
            Availability::Unknown
        );
    }

    #[test]
    fn test_api_custom_field_and_falsy_values() {
        let mut d = def();
        d.exists_field = Some("user".to_string());

        let falsy_bodies = [
            r#"{"user": null}"#,
            r#"{"user": 0}"#,
            r#"{"user": ""}"#,
            r#"{"user": []}"#,
            r#"{"user": {}}"#,
        ];
        for falsy in falsy_bodies {
            assert_eq!(
                classify_api("X", &d, &page(200, falsy)),
                Availability::Available,
                "{} should be falsy",
                falsy
            );
        }
        assert_eq!(
            classify_api("X", &d, &page(200, r#"{"user": {"id": 7}}"#)),
            Availability::Taken
        );
    }

    #[test]
    fn test_api_status_fallback() {
        let d = def();
        assert_eq!(classify_api("X", &d, &page(404, "")), Availability::Available);
        assert_eq!(classify_api("X", &d, &page(429, "{}")), Availability::Unknown);
    }

    #[test]
    fn test_redirect_to_marker_is_available() {
        let d = def();
        let response = page(200, "").redirected_to("https://x.test/login");
        assert_eq!(classify_redirect("X", &d, &response), Availability::Available);
    }

    #[test]
    fn test_redirect_to_profile_is_taken() {
        let d = def();
        let response = page(200, "").redirected_to("https://x.test/alice/profile");
        assert_eq!(classify_redirect("X", &d, &response), Availability::Taken);
    }

    #[test]
    fn test_redirect_marker_is_case_insensitive() {
        let d = def();
        let response = page(200, "").redirected_to("https://x.test/Accounts/LOGIN?next=alice");
        assert_eq!(classify_redirect("X", &d, &response), Availability::Available);
    }

    #[test]
    fn test_no_redirect_uses_status() {
        let d = def();
        assert_eq!(classify_redirect("X", &d, &page(200, "")), Availability::Taken);
        assert_eq!(classify_redirect("X", &d, &page(404, "")), Availability::Available);
        assert_eq!(classify_redirect("X", &d, &page(500, "")), Availability::Unknown);
    }

    #[test]
    fn test_redirect_ignores_url_normalization() {
        let d = def();
        let response = ProbeResponse::new("https://X.test", 404, None).redirected_to("https://x.test/");
        assert_eq!(classify_redirect("X", &d, &response), Availability::Available);
    }

    #[test]
    fn test_markup_title() {
        let d = def();
        let missing = page(200, "<html><head><title>Page Not Found</title></head></html>");
        assert_eq!(classify_markup("Site", &d, &missing), Availability::Available);

        let present = page(200, "<html><head><title>alice (@alice)</title></head></html>");
        assert_eq!(classify_markup("Site", &d, &present), Availability::Taken);

        let untitled = page(200, "<html><body>hello</body></html>");
        assert_eq!(classify_markup("Site", &d, &untitled), Availability::Unknown);
    }

    #[test]
    fn test_markup_platform_overrides() {
        let d = def();

        let suspended = page(200, "<title>Page not found</title><p>Account suspended</p>");
        assert_eq!(classify_markup("Twitter", &d, &suspended), Availability::Taken);

        let instagram = page(
            200,
            "<title>Instagram</title><h2>Sorry, this page isn't available.</h2>",
        );
        assert_eq!(classify_markup("Instagram", &d, &instagram), Availability::Available);

        let tiktok = page(200, "<body>Couldn't find this account</body>");
        assert_eq!(classify_markup("TikTok", &d, &tiktok), Availability::Available);

        // overrides are tied to the platform name
        assert_eq!(classify_markup("Other", &d, &instagram), Availability::Taken);
    }

    #[test]
    fn test_markup_status_fallback() {
        let d = def();
        assert_eq!(classify_markup("Site", &d, &page(404, "")), Availability::Available);
        assert_eq!(classify_markup("Site", &d, &page(403, "")), Availability::Unknown);
    }
}
