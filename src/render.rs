//! Canonical text rendering of configuration trees.
//!
//! The output is deterministic: the same entries in the same insertion order
//! with the same identity state produce byte-identical text. The format is
//! block-style YAML restricted to the scalar kinds a tree can hold, so the
//! file-format collaborator reads it back unchanged. The identity key always
//! renders first; the line is omitted entirely while no identity is attached.

use crate::config::{Config, CFG_ID_KEY};
use crate::value::{Sequence, Value};

/// Render the whole tree. Top-level entries become `key:` blocks separated
/// by blank lines, in insertion order, after the identity line.
pub fn to_text(cfg: &Config) -> String {
    let mut blocks = Vec::new();
    if let Some(id) = cfg.identity() {
        blocks.push(format!("{CFG_ID_KEY}: {id}\n"));
    }
    for (key, value) in cfg.iter() {
        if key == CFG_ID_KEY {
            continue;
        }
        blocks.push(render_entry(key, value));
    }
    blocks.join("\n")
}

fn render_entry(key: &str, value: &Value) -> String {
    let mut block = String::new();
    let key_text = quote_if_needed(key);
    match value {
        Value::Map(map) if !map.is_empty() => {
            block.push_str(&key_text);
            block.push_str(":\n");
            render_map(map, 1, &mut block);
        }
        Value::Seq(seq) if !seq.is_empty() => {
            block.push_str(&key_text);
            block.push_str(":\n");
            render_seq(seq, 0, &mut block);
        }
        Value::Map(_) => block.push_str(&format!("{key_text}: {{}}\n")),
        Value::Seq(_) => block.push_str(&format!("{key_text}: []\n")),
        scalar => block.push_str(&format!("{key_text}: {}\n", scalar_text(scalar))),
    }
    block
}

fn render_map(cfg: &Config, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    for (key, value) in cfg.iter() {
        let key_text = quote_if_needed(key);
        match value {
            Value::Map(map) if !map.is_empty() => {
                out.push_str(&format!("{pad}{key_text}:\n"));
                render_map(map, indent + 1, out);
            }
            Value::Seq(seq) if !seq.is_empty() => {
                out.push_str(&format!("{pad}{key_text}:\n"));
                // sequence items sit at the key's own indent
                render_seq(seq, indent, out);
            }
            Value::Map(_) => out.push_str(&format!("{pad}{key_text}: {{}}\n")),
            Value::Seq(_) => out.push_str(&format!("{pad}{key_text}: []\n")),
            scalar => out.push_str(&format!("{pad}{key_text}: {}\n", scalar_text(scalar))),
        }
    }
}

fn render_seq(seq: &Sequence, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    let deeper = "  ".repeat(indent + 1);
    for item in seq.iter() {
        match item {
            Value::Map(map) if !map.is_empty() => {
                let mut nested = String::new();
                render_map(map, indent + 1, &mut nested);
                splice_dash(&pad, &deeper, &nested, out);
            }
            Value::Seq(inner) if !inner.is_empty() => {
                let mut nested = String::new();
                render_seq(inner, indent + 1, &mut nested);
                splice_dash(&pad, &deeper, &nested, out);
            }
            Value::Map(_) => out.push_str(&format!("{pad}- {{}}\n")),
            Value::Seq(_) => out.push_str(&format!("{pad}- []\n")),
            scalar => out.push_str(&format!("{pad}- {}\n", scalar_text(scalar))),
        }
    }
}

/// The first line of a nested block rides on its dash line.
fn splice_dash(pad: &str, deeper: &str, nested: &str, out: &mut String) {
    let mut lines = nested.split_inclusive('\n');
    if let Some(first) = lines.next() {
        let first = first.strip_prefix(deeper).unwrap_or(first);
        out.push_str(pad);
        out.push_str("- ");
        out.push_str(first);
    }
    for line in lines {
        out.push_str(line);
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Str(text) => quote_if_needed(text),
        other => other.to_string(),
    }
}

fn quote_if_needed(text: &str) -> String {
    if !needs_quoting(text) {
        return text.to_string();
    }
    if text.contains('\n') || text.chars().any(char::is_control) {
        let mut quoted = String::from("\"");
        for ch in text.chars() {
            match ch {
                '"' => quoted.push_str("\\\""),
                '\\' => quoted.push_str("\\\\"),
                '\n' => quoted.push_str("\\n"),
                '\t' => quoted.push_str("\\t"),
                c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
                c => quoted.push(c),
            }
        }
        quoted.push('"');
        quoted
    } else {
        format!("'{}'", text.replace('\'', "''"))
    }
}

fn needs_quoting(text: &str) -> bool {
    if text.is_empty() || text != text.trim() {
        return true;
    }
    if text.contains('\n') || text.chars().any(char::is_control) {
        return true;
    }
    let first = text.chars().next().unwrap_or(' ');
    if matches!(
        first,
        '!' | '&' | '*' | '?' | '|' | '>' | '%' | '@' | '`' | '"' | '\'' | '#' | ',' | '[' | ']'
            | '{' | '}'
    ) {
        return true;
    }
    if matches!(first, '-' | ':') && (text.len() == 1 || text.as_bytes()[1] == b' ') {
        return true;
    }
    if text.contains(": ") || text.ends_with(':') || text.contains(" #") {
        return true;
    }
    // A plain string must not read back as a different scalar kind.
    matches!(
        text,
        "null" | "Null" | "NULL" | "~" | "true" | "True" | "TRUE" | "false" | "False" | "FALSE"
    ) || looks_numeric(text)
}

fn looks_numeric(text: &str) -> bool {
    text.parse::<i64>().is_ok()
        || text.parse::<f64>().is_ok()
        || matches!(text, ".inf" | "-.inf" | "+.inf" | ".nan")
}
