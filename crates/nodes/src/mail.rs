//! MIME message parsing.

use chrono::{DateTime, SecondsFormat, Utc};
use mail_parser::{Address, HeaderValue, MessageParser, MimeHeaders};
use serde_json::{json, Map, Value};

/// Parses raw RFC 5322 / MIME bytes into a structured record.
pub trait MimeParser: Send + Sync {
    /// Parse a message. Errors describe why the bytes are not a message.
    fn parse(&self, raw: &[u8]) -> Result<Map<String, Value>, String>;
}

/// [`MimeParser`] backed by the `mail-parser` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailParser;

impl MimeParser for MailParser {
    fn parse(&self, raw: &[u8]) -> Result<Map<String, Value>, String> {
        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| "Unable to parse message".to_string())?;

        if message
            .headers()
            .iter()
            .all(|header| matches!(header.value(), HeaderValue::Empty))
        {
            return Err("Message has no headers".to_string());
        }

        let mut headers = Map::new();
        for header in message.headers() {
            let Some(value) = header_value_json(header.value()) else {
                continue;
            };
            let name = header.name().to_ascii_lowercase();
            match headers.get_mut(&name) {
                Some(Value::Array(existing)) => existing.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    headers.insert(name, value);
                }
            }
        }

        let attachments: Vec<Value> = message
            .attachments()
            .map(|part| {
                let content_type = part.content_type().map(|ct| match ct.subtype() {
                    Some(sub) => format!("{}/{}", ct.ctype(), sub),
                    None => ct.ctype().to_string(),
                });
                json!({
                    "filename": part.attachment_name(),
                    "contentType": content_type,
                    "contentId": part.content_id(),
                    "size": part.contents().len(),
                })
            })
            .collect();

        let mut out = Map::new();
        out.insert("attachments".to_string(), Value::Array(attachments));
        out.insert("headers".to_string(), Value::Object(headers));
        out.insert("html".to_string(), opt_string(message.body_html(0).map(|b| b.into_owned())));
        out.insert("text".to_string(), opt_string(message.body_text(0).map(|b| b.into_owned())));
        out.insert("subject".to_string(), opt_string(message.subject().map(str::to_string)));
        out.insert(
            "date".to_string(),
            opt_string(message.date().and_then(|d| normalize_date(&d.to_rfc3339()))),
        );
        out.insert("from".to_string(), address_field(message.from()));
        out.insert("to".to_string(), address_field(message.to()));
        out.insert("cc".to_string(), address_field(message.cc()));
        out.insert("bcc".to_string(), address_field(message.bcc()));
        out.insert("replyTo".to_string(), address_field(message.reply_to()));
        out.insert(
            "messageId".to_string(),
            opt_string(message.message_id().map(str::to_string)),
        );
        out.insert(
            "inReplyTo".to_string(),
            header_value_json(message.in_reply_to()).unwrap_or(Value::Null),
        );
        out.insert(
            "references".to_string(),
            header_value_json(message.references()).unwrap_or(Value::Null),
        );

        Ok(out)
    }
}

fn opt_string(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

/// Normalize an RFC 3339 timestamp to UTC with millisecond precision.
fn normalize_date(rfc3339: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(rfc3339)
        .ok()
        .map(|d| d.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn address_field(address: Option<&Address<'_>>) -> Value {
    let Some(address) = address else {
        return Value::Null;
    };

    let addrs: Vec<(String, String)> = match address {
        Address::List(list) => list
            .iter()
            .map(|a| addr_pair(a.name.as_deref(), a.address.as_deref()))
            .collect(),
        Address::Group(groups) => groups
            .iter()
            .flat_map(|g| g.addresses.iter())
            .map(|a| addr_pair(a.name.as_deref(), a.address.as_deref()))
            .collect(),
    };

    let text = addrs
        .iter()
        .map(|(name, address)| match (name.is_empty(), address.is_empty()) {
            (true, _) => address.clone(),
            (false, true) => name.clone(),
            (false, false) => format!("{} <{}>", name, address),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let value: Vec<Value> = addrs
        .into_iter()
        .map(|(name, address)| json!({ "address": address, "name": name }))
        .collect();

    json!({ "value": value, "text": text })
}

fn addr_pair(name: Option<&str>, address: Option<&str>) -> (String, String) {
    (
        name.unwrap_or_default().to_string(),
        address.unwrap_or_default().to_string(),
    )
}

fn header_value_json(value: &HeaderValue<'_>) -> Option<Value> {
    match value {
        HeaderValue::Text(text) => Some(Value::String(text.to_string())),
        HeaderValue::TextList(list) => Some(Value::Array(
            list.iter().map(|t| Value::String(t.to_string())).collect(),
        )),
        HeaderValue::DateTime(dt) => normalize_date(&dt.to_rfc3339()).map(Value::String),
        HeaderValue::Address(address) => Some(address_field(Some(address))),
        HeaderValue::ContentType(ct) => Some(Value::String(match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub),
            None => ct.ctype().to_string(),
        })),
        _ => None,
    }
}
