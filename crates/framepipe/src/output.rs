use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use framepipe_frame::{code_name, Message, RawMessage};
use framepipe_transport::PipeName;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct IdentifierOutput {
    identifier: u32,
    pipe: String,
}

/// Announce the identifier a host is listening on.
///
/// Printed as one line so another process can pick it up from a pipe.
pub fn print_identifier(id: u32, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = IdentifierOutput {
                identifier: id,
                pipe: PipeName::new(id).to_string(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("identifier: {id}"),
        OutputFormat::Raw => println!("{id}"),
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    peer: &'a str,
    code: u32,
    name: &'static str,
    size: usize,
    message: Option<Message>,
    timestamp: String,
}

/// Print one received frame.
pub fn print_message(frame: &[u8], peer: &str, format: OutputFormat) {
    let code = RawMessage::from_bytes(frame).map(|raw| raw.code()).ok();
    let message = Message::decode(frame).ok();
    let name = code.map(code_name).unwrap_or("UNKNOWN");

    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                peer,
                code: code.unwrap_or_default(),
                name,
                size: frame.len(),
                message,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CODE", "NAME", "PEER", "FIELDS"])
                .add_row(vec![
                    format_code(code),
                    name.to_string(),
                    peer.to_string(),
                    fields_preview(message.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "code={} ({}) peer={} fields={}",
                format_code(code),
                name,
                peer,
                fields_preview(message.as_ref())
            );
        }
        OutputFormat::Raw => print_raw(frame),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn format_code(code: Option<u32>) -> String {
    code.map(|code| format!("{code:#04x}"))
        .unwrap_or_else(|| "-".to_string())
}

fn fields_preview(message: Option<&Message>) -> String {
    match message {
        Some(message) => serde_json::to_value(message)
            .ok()
            .and_then(|mut value| {
                let fields = value.as_object_mut()?;
                fields.remove("kind");
                Some(serde_json::Value::Object(fields.clone()).to_string())
            })
            .unwrap_or_default(),
        None => "<undecodable>".to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use framepipe_frame::Resize;

    use super::*;

    #[test]
    fn fields_preview_drops_kind_tag() {
        let message = Message::Resize(Resize {
            width: 3,
            height: 4,
        });
        assert_eq!(
            fields_preview(Some(&message)),
            r#"{"height":4,"width":3}"#
        );
        assert_eq!(fields_preview(Some(&Message::Quit)), "{}");
        assert_eq!(fields_preview(None), "<undecodable>");
    }

    #[test]
    fn codes_render_in_hex() {
        assert_eq!(format_code(Some(0x11)), "0x11");
        assert_eq!(format_code(Some(0x3)), "0x03");
        assert_eq!(format_code(None), "-");
    }
}
