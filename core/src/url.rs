//! URL construction for the service endpoints.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Path prefix of the newsletter JSON endpoints.
pub const NEWSLETTER_PATH: &str = "de.pinuts.cmsbs.restapi.";
/// Path of the event-file XML endpoint.
pub const EVENT_FILE_PATH: &str = "de.pinuts.cmsbs.restsend.EventFile/";

/// Query parameter carrying the API key on newsletter endpoints.
pub const NEWSLETTER_KEY_PARAM: &str = "umopen";
/// Query parameter carrying the API key on the event-file endpoint.
pub const EVENT_FILE_KEY_PARAM: &str = "open";

/// Characters left alone when embedding a caller-supplied path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Percent-encode a caller-supplied value for use as one path segment.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Join `base`, the path parts and the query pairs into one URL.
///
/// Pairs with an empty value are dropped; without remaining pairs no `?` is
/// appended. Path parts are taken as they are, so callers encode untrusted
/// segments with [`encode_segment`] first.
pub fn build_url(base: &str, paths: &[&str], query: &[(&str, &str)]) -> String {
    let mut url = format!("{}/", base.trim_end_matches('/'));
    for path in paths {
        url.push_str(path);
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut has_pairs = false;
    for (key, value) in query.iter().filter(|(_, value)| !value.is_empty()) {
        serializer.append_pair(key, value);
        has_pairs = true;
    }
    if has_pairs {
        url.push('?');
        url.push_str(&serializer.finish());
    }
    url
}

/// Replace the value of `param` in `url` with a fixed mask, for log output.
pub fn redact_param(url: &str, param: &str) -> String {
    let Some((path, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let pairs: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key == param => format!("{key}=***"),
            _ => pair.to_string(),
        })
        .collect();
    format!("{path}?{}", pairs.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_paths_and_query() {
        let url = build_url(
            "https://um.example.com",
            &[NEWSLETTER_PATH, "Channels/index"],
            &[(NEWSLETTER_KEY_PARAM, "KEY")],
        );
        assert_eq!(url, "https://um.example.com/de.pinuts.cmsbs.restapi.Channels/index?umopen=KEY");
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let url = build_url("https://um.example.com//", &[EVENT_FILE_PATH], &[("open", "KEY")]);
        assert_eq!(url, "https://um.example.com/de.pinuts.cmsbs.restsend.EventFile/?open=KEY");
    }

    #[test]
    fn empty_values_are_dropped() {
        let url = build_url("https://um.example.com", &["x"], &[("open", ""), ("a", "1")]);
        assert_eq!(url, "https://um.example.com/x?a=1");
        let url = build_url("https://um.example.com", &["x"], &[("open", "")]);
        assert_eq!(url, "https://um.example.com/x");
    }

    #[test]
    fn query_values_are_form_encoded() {
        let url = build_url("http://h", &[], &[("umopen", "a b&c")]);
        assert_eq!(url, "http://h/?umopen=a+b%26c");
    }

    #[test]
    fn segments_are_percent_encoded() {
        assert_eq!(encode_segment("EVT-1_a.b~"), "EVT-1_a.b~");
        assert_eq!(encode_segment("a/b c?"), "a%2Fb%20c%3F");
    }

    #[test]
    fn redacts_only_the_named_param() {
        let url = "http://h/x?umopen=secret&page=2";
        assert_eq!(redact_param(url, "umopen"), "http://h/x?umopen=***&page=2");
        assert_eq!(redact_param("http://h/x", "umopen"), "http://h/x");
    }
}
