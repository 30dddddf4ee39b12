//! DATA payload parsing.
//!
//! Converts one raw SMTP DATA payload (CRLF-delimited, dot-stuffing already
//! undone by the protocol layer) into a [`StructuredMessage`], the
//! provider-agnostic representation the adapters consume.
//!
//! The parser is deliberately small and compatibility-driven:
//! - lines are scanned for a fixed set of header prefixes, first match wins
//! - `Subject`/`From`/`Reply-To` are single-valued, later lines overwrite
//! - `To`/`Cc` accumulate in order of appearance
//! - the last non-empty line of the payload is the body, even when that line
//!   is itself a header line (callers must send a trailing body line)

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{RelayError, RelayResult};

const SUBJECT_PREFIX: &str = "Subject: ";
const FROM_PREFIX: &str = "From: ";
const REPLY_TO_PREFIX: &str = "Reply-To: ";
const TO_PREFIX: &str = "To: ";
const CC_PREFIX: &str = "Cc: ";

/// The message body, classified once at parse time.
///
/// Exactly one of the two forms holds the final content block; the variants
/// make the text/html exclusivity invariant unrepresentable to violate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Tag-free prose.
    Text(String),
    /// Tag-bearing markup.
    Html(String),
}

impl MessageBody {
    /// Classifies a body line and wraps it in the matching variant.
    fn classify(body: &str) -> Self {
        if is_html(body) {
            MessageBody::Html(body.to_string())
        } else {
            MessageBody::Text(body.to_string())
        }
    }

    /// The plain-text content, if this body is text.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageBody::Text(s) => Some(s),
            MessageBody::Html(_) => None,
        }
    }

    /// The HTML content, if this body is markup.
    pub fn html(&self) -> Option<&str> {
        match self {
            MessageBody::Html(s) => Some(s),
            MessageBody::Text(_) => None,
        }
    }

    /// The content regardless of classification.
    pub fn as_str(&self) -> &str {
        match self {
            MessageBody::Text(s) | MessageBody::Html(s) => s,
        }
    }
}

/// Parsed representation of one relay transaction.
///
/// Produced by [`StructuredMessage::parse`]; consumed by the provider
/// adapters. The parser performs no address validation — `from` holds
/// whatever the `From: ` line carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredMessage {
    /// Message subject; empty when no `Subject: ` line was present.
    pub subject: String,
    /// Raw sender string from the last `From: ` line.
    pub from: String,
    /// Raw reply-to string, when a `Reply-To: ` line was present.
    pub reply_to: Option<String>,
    /// Raw recipient strings in order of appearance.
    pub to: Vec<String>,
    /// Raw carbon-copy strings in order of appearance.
    pub cc: Vec<String>,
    /// The classified body.
    pub body: MessageBody,
}

impl StructuredMessage {
    /// Parses one DATA payload.
    ///
    /// Splits on CRLF, discards empty lines (bytes are decoded lossily as
    /// UTF-8), scans header prefixes in precedence order, and takes the last
    /// non-empty line as the body. A payload with no non-empty lines is a
    /// parse error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use smtp_relay::message::StructuredMessage;
    ///
    /// let payload = b"From: a@x.com\r\nTo: b@y.com\r\nSubject: Hi\r\nHello there\r\n";
    /// let message = StructuredMessage::parse(payload).unwrap();
    /// assert_eq!(message.from, "a@x.com");
    /// assert_eq!(message.body.text(), Some("Hello there"));
    /// ```
    pub fn parse(payload: &[u8]) -> RelayResult<Self> {
        let decoded = String::from_utf8_lossy(payload);
        let lines: Vec<&str> = decoded.split("\r\n").filter(|l| !l.is_empty()).collect();

        let mut subject = String::new();
        let mut from = String::new();
        let mut reply_to = None;
        let mut to = Vec::new();
        let mut cc = Vec::new();

        for line in &lines {
            if let Some(rest) = line.strip_prefix(SUBJECT_PREFIX) {
                subject = rest.to_string();
                continue;
            }
            if let Some(rest) = line.strip_prefix(FROM_PREFIX) {
                from = rest.to_string();
                continue;
            }
            if let Some(rest) = line.strip_prefix(REPLY_TO_PREFIX) {
                reply_to = Some(rest.to_string());
                continue;
            }
            if let Some(rest) = line.strip_prefix(TO_PREFIX) {
                to.push(rest.to_string());
                continue;
            }
            if let Some(rest) = line.strip_prefix(CC_PREFIX) {
                cc.push(rest.to_string());
                continue;
            }
        }

        // The last non-empty line is the body even when it matched a header
        // prefix above. Compatibility behavior, kept as documented.
        let body_line = *lines
            .last()
            .ok_or_else(|| RelayError::parse("empty message payload"))?;

        let message = Self {
            subject,
            from,
            reply_to,
            to,
            cc,
            body: MessageBody::classify(body_line),
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            from = %message.from,
            to = message.to.len(),
            cc = message.cc.len(),
            subject = %message.subject,
            "parsed message payload"
        );

        Ok(message)
    }

    /// Reads a payload stream to its end and parses it.
    ///
    /// A read failure is surfaced as a parse error carrying the I/O source.
    pub async fn read_from<R>(mut reader: R) -> RelayResult<Self>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut payload = Vec::new();
        reader
            .read_to_end(&mut payload)
            .await
            .map_err(RelayError::payload_read)?;
        Self::parse(&payload)
    }
}

/// Deterministic HTML fragment detection.
///
/// A body is HTML iff it contains at least one complete tag: `<`, an
/// optional `/`, an ASCII-alphabetic tag name, then a `>` before any other
/// `<`. Prose containing stray angle brackets stays text.
fn is_html(body: &str) -> bool {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            let mut j = i + 1;
            if j < bytes.len() && bytes[j] == b'/' {
                j += 1;
            }
            if j < bytes.len() && bytes[j].is_ascii_alphabetic() {
                let mut k = j + 1;
                while k < bytes.len() && bytes[k] != b'<' && bytes[k] != b'>' {
                    k += 1;
                }
                if k < bytes.len() && bytes[k] == b'>' {
                    return true;
                }
                i = k;
                continue;
            }
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn payload(lines: &[&str]) -> Vec<u8> {
        let mut joined = lines.join("\r\n");
        joined.push_str("\r\n");
        joined.into_bytes()
    }

    #[test]
    fn parses_documented_round_trip() {
        let raw = payload(&["From: a@x.com", "To: b@y.com", "Subject: Hi", "Hello there"]);
        let message = StructuredMessage::parse(&raw).unwrap();

        assert_eq!(message.from, "a@x.com");
        assert_eq!(message.to, vec!["b@y.com"]);
        assert_eq!(message.subject, "Hi");
        assert_eq!(message.reply_to, None);
        assert!(message.cc.is_empty());
        assert_eq!(message.body, MessageBody::Text("Hello there".to_string()));
    }

    #[test]
    fn collects_multiple_recipients_in_order() {
        let raw = payload(&[
            "From: a@x.com",
            "To: first@y.com",
            "Cc: copy@z.com",
            "To: second@y.com",
            "body",
        ]);
        let message = StructuredMessage::parse(&raw).unwrap();

        assert_eq!(message.to, vec!["first@y.com", "second@y.com"]);
        assert_eq!(message.cc, vec!["copy@z.com"]);
    }

    #[test]
    fn later_single_valued_headers_overwrite() {
        let raw = payload(&[
            "Subject: first",
            "Subject: second",
            "From: old@x.com",
            "From: new@x.com",
            "Reply-To: a@x.com",
            "Reply-To: b@x.com",
            "body",
        ]);
        let message = StructuredMessage::parse(&raw).unwrap();

        assert_eq!(message.subject, "second");
        assert_eq!(message.from, "new@x.com");
        assert_eq!(message.reply_to, Some("b@x.com".to_string()));
    }

    #[test]
    fn last_header_line_doubles_as_body() {
        // No trailing body line: the last header line is reinterpreted as
        // content. Documented sharp edge, preserved for compatibility.
        let raw = payload(&["From: a@x.com", "To: b@y.com"]);
        let message = StructuredMessage::parse(&raw).unwrap();

        assert_eq!(message.to, vec!["b@y.com"]);
        assert_eq!(message.body.text(), Some("To: b@y.com"));
    }

    #[test]
    fn empty_lines_are_discarded_before_body_selection() {
        let raw = b"From: a@x.com\r\n\r\nHello\r\n\r\n\r\n".to_vec();
        let message = StructuredMessage::parse(&raw).unwrap();
        assert_eq!(message.body.text(), Some("Hello"));
    }

    #[test]
    fn empty_payload_is_a_parse_error() {
        let err = StructuredMessage::parse(b"").unwrap_err();
        assert!(err.fails_transaction_only());

        let err = StructuredMessage::parse(b"\r\n\r\n").unwrap_err();
        assert!(matches!(err, RelayError::Parse { .. }));
    }

    #[test]
    fn prefix_precedence_is_first_match_per_line() {
        // "Subject: " wins before the embedded "From: " is ever considered.
        let raw = payload(&["Subject: From: x@y.com", "body"]);
        let message = StructuredMessage::parse(&raw).unwrap();
        assert_eq!(message.subject, "From: x@y.com");
        assert!(message.from.is_empty());
    }

    #[rstest]
    #[case("<html><body>hi</body></html>", true)]
    #[case("<p>hello</p>", true)]
    #[case("</div>", true)]
    #[case("plain text only", false)]
    #[case("a < b and b > c", false)]
    #[case("5<6> is not markup", false)]
    #[case("", false)]
    fn classifies_html_deterministically(#[case] body: &str, #[case] html: bool) {
        assert_eq!(is_html(body), html, "body: {body:?}");
    }

    #[test]
    fn html_body_lands_in_html_variant() {
        let raw = payload(&["From: a@x.com", "<html><body>hi</body></html>"]);
        let message = StructuredMessage::parse(&raw).unwrap();
        assert_eq!(message.body.html(), Some("<html><body>hi</body></html>"));
        assert_eq!(message.body.text(), None);
    }

    #[tokio::test]
    async fn read_from_consumes_a_stream() {
        let raw = payload(&["From: a@x.com", "To: b@y.com", "Subject: Hi", "Hello"]);
        let message = StructuredMessage::read_from(raw.as_slice()).await.unwrap();
        assert_eq!(message.subject, "Hi");
        assert_eq!(message.body.text(), Some("Hello"));
    }
}
