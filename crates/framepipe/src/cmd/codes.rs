use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use framepipe_frame::{
    code_name, is_input, AxisEvent, BufferCommit, FrameComplete, KeyboardEvent, MessageKind,
    PointerEvent, Quit, RawTouchEvent, Resize, SetSizeAndStyle, TouchEvent, AXIS, BUFFER_COMMIT, FRAME_COMPLETE, KEYBOARD,
    KNOWN_CODES, POINTER, QUIT, RAW_TOUCH, RESIZE, SET_SIZE_AND_STYLE, TOUCH,
};
use serde::Serialize;

use crate::cmd::CodesArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct CodeOutput {
    code: u32,
    name: &'static str,
    category: &'static str,
    payload_offset: usize,
    payload_len: usize,
}

pub fn run(_args: CodesArgs, format: OutputFormat) -> CliResult<i32> {
    let rows: Vec<CodeOutput> = KNOWN_CODES.iter().copied().map(describe).collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CODE", "NAME", "CATEGORY", "OFFSET", "LENGTH"]);
            for row in &rows {
                table.add_row(vec![
                    format!("{:#04x}", row.code),
                    row.name.to_string(),
                    row.category.to_string(),
                    row.payload_offset.to_string(),
                    row.payload_len.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!(
                    "{:#04x} {:<20} {:<8} offset={} len={}",
                    row.code, row.name, row.category, row.payload_offset, row.payload_len
                );
            }
        }
    }

    Ok(SUCCESS)
}

fn describe(code: u32) -> CodeOutput {
    let (payload_offset, payload_len) = layout(code);
    CodeOutput {
        code,
        name: code_name(code),
        category: if is_input(code) { "input" } else { "control" },
        payload_offset,
        payload_len,
    }
}

fn layout(code: u32) -> (usize, usize) {
    fn of<K: MessageKind>() -> (usize, usize) {
        (K::OFFSET, K::ENCODED_LEN)
    }

    match code {
        SET_SIZE_AND_STYLE => of::<SetSizeAndStyle>(),
        RESIZE => of::<Resize>(),
        AXIS => of::<AxisEvent>(),
        POINTER => of::<PointerEvent>(),
        TOUCH => of::<TouchEvent>(),
        RAW_TOUCH => of::<RawTouchEvent>(),
        KEYBOARD => of::<KeyboardEvent>(),
        BUFFER_COMMIT => of::<BufferCommit>(),
        FRAME_COMPLETE => of::<FrameComplete>(),
        QUIT => of::<Quit>(),
        _ => (0, 0),
    }
}
