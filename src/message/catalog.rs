//! Localized text for message kinds.
//!
//! Templates use `{name}` placeholders filled from the message's vars. Only
//! English ships today; other locales fall back to it.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

use super::MessageKind;

/// Summary and detail templates of one kind.
#[derive(Debug, Clone, Copy)]
pub struct MessageText {
    pub summary: &'static str,
    pub detail: &'static str,
}

pub const DEFAULT_LOCALE: &str = "en";

const EN: &[(&str, MessageText)] = &[
    (
        "DATE_MISSING",
        MessageText {
            summary: "The response doesn't have a Date header.",
            detail: "Origin servers with a clock must send a Date header. Caches use it to \
                     calculate the age of stored responses, so leaving it out makes freshness \
                     unpredictable.",
        },
    ),
    (
        "LM_FUTURE",
        MessageText {
            summary: "The Last-Modified time is in the future.",
            detail: "Last-Modified ({last_modified}) is later than the response's Date \
                     ({date}). Caches and conditional requests rely on it being in the past.",
        },
    ),
    (
        "CL_CORRECT",
        MessageText {
            summary: "The Content-Length header is correct.",
            detail: "Content-Length ({length} bytes) matches the body that was actually \
                     received.",
        },
    ),
    (
        "TRANSFER_CODING_CHUNKED",
        MessageText {
            summary: "The response body was delivered in {segments} chunks.",
            detail: "The response used chunked transfer-coding, so its length wasn't known \
                     up front. {bytes} bytes arrived in {segments} separately delivered \
                     segments.",
        },
    ),
    (
        "REQUEST_CHUNKED",
        MessageText {
            summary: "The request body was sent chunked.",
            detail: "No Content-Length was supplied for the {bytes}-byte request body, so it \
                     was sent with chunked transfer-coding. Some servers refuse chunked \
                     requests.",
        },
    ),
    (
        "CT_MISSING",
        MessageText {
            summary: "The response doesn't have a Content-Type header.",
            detail: "A {bytes}-byte body was sent without a Content-Type. Clients have to \
                     guess how to interpret it, which can be a security problem.",
        },
    ),
    (
        "REDIRECT_LOCATION",
        MessageText {
            summary: "The response redirects to {location}.",
            detail: "Status {status} tells the client to look for the resource at \
                     {location}.",
        },
    ),
    (
        "REDIRECT_NO_LOCATION",
        MessageText {
            summary: "The {status} response doesn't have a Location header.",
            detail: "Redirect responses must say where the client should go next; without \
                     Location the redirect can't be followed.",
        },
    ),
    (
        "FRESHNESS_FRESH",
        MessageText {
            summary: "The response is fresh for {lifetime} seconds.",
            detail: "Explicit freshness information allows caches to reuse this response for \
                     {lifetime} seconds without checking back with the server.",
        },
    ),
    (
        "FRESHNESS_STALE",
        MessageText {
            summary: "The response is already stale.",
            detail: "The explicit freshness lifetime is zero or in the past, so caches have \
                     to revalidate before reusing it.",
        },
    ),
    (
        "FRESHNESS_HEURISTIC",
        MessageText {
            summary: "Caches may assign this response a heuristic freshness lifetime.",
            detail: "The response has Last-Modified but no Cache-Control max-age or Expires. \
                     Caches are allowed to guess a freshness lifetime from Last-Modified, \
                     which can serve outdated content. Set an explicit lifetime instead.",
        },
    ),
    (
        "FRESHNESS_NONE",
        MessageText {
            summary: "The response has no freshness information.",
            detail: "Without Cache-Control, Expires or Last-Modified, caches can't reuse \
                     this response without revalidating it.",
        },
    ),
    (
        "INM_304",
        MessageText {
            summary: "If-None-Match conditional requests are supported.",
            detail: "A request with If-None-Match: {validator} received 304 Not Modified.",
        },
    ),
    (
        "IMS_304",
        MessageText {
            summary: "If-Modified-Since conditional requests are supported.",
            detail: "A request with If-Modified-Since: {validator} received 304 Not \
                     Modified.",
        },
    ),
    (
        "INM_FULL",
        MessageText {
            summary: "An If-None-Match conditional request returned the full content.",
            detail: "The ETag {validator} was sent back in If-None-Match but the server \
                     answered with a full response instead of 304 Not Modified.",
        },
    ),
    (
        "IMS_FULL",
        MessageText {
            summary: "An If-Modified-Since conditional request returned the full content.",
            detail: "The Last-Modified time {validator} was sent back in If-Modified-Since \
                     but the server answered with a full response instead of 304 Not \
                     Modified.",
        },
    ),
    (
        "MISSING_HDRS_304",
        MessageText {
            summary: "The 304 response is missing the {header} header.",
            detail: "The full response carried {header}, but the 304 Not Modified response \
                     to a conditional request didn't. Caches updating their stored response \
                     from the 304 will lose it.",
        },
    ),
    (
        "VALIDATION_FAILED",
        MessageText {
            summary: "The conditional request could not be evaluated.",
            detail: "Revalidating with {validator} produced {outcome}.",
        },
    ),
];

static LOCALES: Lazy<HashMap<&'static str, HashMap<&'static str, MessageText>>> =
    Lazy::new(|| {
        let mut locales = HashMap::new();
        locales.insert(DEFAULT_LOCALE, EN.iter().copied().collect());
        locales
    });

/// Find the text for a kind, falling back to the default locale.
pub fn lookup(kind: &MessageKind, locale: &str) -> Option<&'static MessageText> {
    let language = locale.split(['-', '_']).next().unwrap_or(DEFAULT_LOCALE);
    LOCALES
        .get(language)
        .and_then(|texts| texts.get(kind.as_str()))
        .or_else(|| {
            LOCALES
                .get(DEFAULT_LOCALE)
                .and_then(|texts| texts.get(kind.as_str()))
        })
}

/// Substitute `{name}` placeholders. Unknown placeholders are left as-is.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
