//! Link codec
//!
//! Pure string/URL logic shared by both sides of a handoff:
//! - Validate that an inbound link targets this app (`scheme://host`)
//! - Decode its query into [`Parameters`]
//! - Extract the return target carried by the link
//! - Build percent-encoded query strings and assemble outbound URLs
//!
//! Nothing here touches the launch context; callers mutate state only after
//! every step has succeeded.

use crate::error::{HandoffError, Result};
use crate::types::{InboundLink, Parameters};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, warn};
use url::Url;

/// Everything except RFC 3986 unreserved characters gets escaped
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Return target carried by an inbound link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTargets {
    /// Where to send the handoff response (`returnUrl`)
    pub return_url: Option<String>,

    /// Correlation id to echo back (`requestId`)
    pub request_id: Option<String>,
}

/// Validates and decodes links addressed to one `scheme://host`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCodec {
    scheme: String,
    host: String,
}

impl LinkCodec {
    /// Create a codec for the links this app accepts
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `scheme://host` this codec accepts
    pub fn expected(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// Check that `raw` targets this app
    ///
    /// Scheme and host are compared ASCII case-insensitively. A string that is
    /// not a URL at all is a parse error rather than a mismatch.
    pub fn validate(&self, raw: &str) -> Result<Url> {
        let url = Url::parse(raw.trim())?;
        let host = url.host_str().unwrap_or("");

        if !url.scheme().eq_ignore_ascii_case(&self.scheme)
            || !host.eq_ignore_ascii_case(&self.host)
        {
            return Err(HandoffError::InvalidLink {
                expected: self.expected(),
                actual: format!("{}://{}", url.scheme(), host),
            });
        }

        Ok(url)
    }

    /// Decode the query of an already validated link
    pub fn parse(&self, url: &Url) -> Result<Parameters> {
        parse_query(url.query().unwrap_or(""))
    }

    /// Validate and parse in one step
    pub fn decode(&self, raw: &str) -> Result<InboundLink> {
        let url = self.validate(raw)?;
        let parameters = self.parse(&url)?;
        debug!("Decoded {} parameter(s) from {}", parameters.len(), self.expected());
        Ok(InboundLink::new(raw, parameters))
    }
}

/// Decode a query string into parameters
///
/// - `+` decodes to a space, `%XX` escapes are decoded and must form UTF-8
/// - a key without `=` maps to the empty string
/// - on duplicate keys the last occurrence wins
pub fn parse_query(query: &str) -> Result<Parameters> {
    let mut parameters = Parameters::new();

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key)?;
        if key.is_empty() {
            warn!("Ignoring query pair with empty key: {}", pair);
            continue;
        }
        let value = decode_component(value)?;
        parameters.insert(key, value);
    }

    Ok(parameters)
}

fn decode_component(component: &str) -> Result<String> {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            HandoffError::Parse(format!(
                "query component '{}' is not valid UTF-8 once decoded: {}",
                component, e
            ))
        })
}

fn encode_component(component: &str) -> String {
    utf8_percent_encode(component, QUERY_COMPONENT).to_string()
}

/// Pull the return target out of decoded parameters
///
/// Absent or empty keys stay unset; nothing is defaulted here. A `returnUrl`
/// that is present must be an absolute URL.
pub fn extract(parameters: &Parameters) -> Result<LinkTargets> {
    let non_empty = |key: &str| parameters.get(key).filter(|v| !v.is_empty()).cloned();

    let return_url = non_empty("returnUrl");
    if let Some(target) = &return_url {
        Url::parse(target).map_err(|e| {
            HandoffError::Parse(format!("returnUrl '{}' is not an absolute URL: {}", target, e))
        })?;
    }

    Ok(LinkTargets {
        return_url,
        request_id: non_empty("requestId"),
    })
}

/// Join ordered fields as `key=value` pairs with `&`, percent-encoding both sides
pub fn build_query<I, K, V>(fields: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    build_query_verbatim(fields, &[])
}

/// Like [`build_query`], except values of `verbatim_keys` are written as-is
/// when they only contain unreserved characters and `:`
pub fn build_query_verbatim<I, K, V>(fields: I, verbatim_keys: &[&str]) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    fields
        .into_iter()
        .map(|(k, v)| {
            let (key, value) = (k.as_ref(), v.as_ref());
            let value = if verbatim_keys.contains(&key) && is_query_safe(value) {
                value.to_string()
            } else {
                encode_component(value)
            };
            format!("{}={}", encode_component(key), value)
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn is_query_safe(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | ':'))
}

/// Append a query string to a target URL
///
/// A target that already carries a query is merged into with `&` instead of
/// gaining a second `?`. A `#fragment` on the target stays at the end.
pub fn assemble_url(target: &str, query: &str) -> String {
    let (base, fragment) = match target.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (target, None),
    };

    let mut url = String::with_capacity(target.len() + query.len() + 2);
    url.push_str(base);

    if !query.is_empty() {
        if !base.contains('?') {
            url.push('?');
        } else if !base.ends_with('?') && !base.ends_with('&') {
            debug!("Return URL already has a query, merging: {}", base);
            url.push('&');
        }
        url.push_str(query);
    }

    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }

    url
}
