use std::borrow::Cow;

use crate::plan::RelocationPlan;

/// Manifest attributes whose value is a fully-qualified class name.
const CLASS_ATTRIBUTES: [&str; 4] = [
    "Main-Class",
    "Launcher-Agent-Class",
    "Premain-Class",
    "Agent-Class",
];

const MANIFEST_LINE_LIMIT: usize = 72;

/// Rewrites provider class names in a `META-INF/services/*` file.
pub(crate) fn relocate_service_lines(plan: &RelocationPlan, content: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(content).ok()?;
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    for line in text.split_inclusive('\n') {
        let (body, comment) = line.split_at(line.find('#').unwrap_or(line.len()));
        let name = body.trim();
        if !name.is_empty()
            && let Cow::Owned(relocated) = plan.relocate_class_name(name)
        {
            let start = body.len() - body.trim_start().len();
            out.push_str(&body[..start]);
            out.push_str(&relocated);
            out.push_str(&body[start + name.len()..]);
            out.push_str(comment);
            changed = true;
            continue;
        }
        out.push_str(line);
    }
    changed.then(|| out.into_bytes())
}

/// One logical manifest line: its raw physical lines and the unwrapped text.
struct LogicalLine<'a> {
    raw: &'a str,
    text: String,
}

fn logical_lines(text: &str) -> Vec<LogicalLine<'_>> {
    let mut lines: Vec<LogicalLine<'_>> = Vec::new();
    let mut offset = 0;
    let mut start = 0;
    for physical in text.split_inclusive('\n') {
        let content = physical.trim_end_matches(['\n', '\r']);
        if let Some(continued) = content.strip_prefix(' ')
            && let Some(last) = lines.last_mut()
        {
            last.text.push_str(continued);
            last.raw = &text[start..offset + physical.len()];
        } else {
            start = offset;
            lines.push(LogicalLine {
                raw: physical,
                text: content.to_string(),
            });
        }
        offset += physical.len();
    }
    lines
}

/// Splits `line` into 72-byte physical lines, continuation lines starting with a space.
fn wrap_manifest_line(line: &str, newline: &str) -> String {
    let mut out = String::with_capacity(line.len() + newline.len() * 2);
    let mut rest = line;
    let mut limit = MANIFEST_LINE_LIMIT;
    loop {
        if rest.len() <= limit {
            out.push_str(rest);
            out.push_str(newline);
            return out;
        }
        let mut split = limit;
        while !rest.is_char_boundary(split) {
            split -= 1;
        }
        out.push_str(&rest[..split]);
        out.push_str(newline);
        out.push(' ');
        rest = &rest[split..];
        limit = MANIFEST_LINE_LIMIT - 1;
    }
}

/// Rewrites class-valued main attributes and `Name:` section headers of a `MANIFEST.MF`.
pub(crate) fn relocate_manifest(plan: &RelocationPlan, content: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(content).ok()?;
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    for line in logical_lines(text) {
        let relocated = line.text.split_once(": ").and_then(|(key, value)| {
            let value = if CLASS_ATTRIBUTES.contains(&key) {
                plan.relocate_class_name(value)
            } else if key == "Name" {
                plan.relocate_path(value)
            } else {
                Cow::Borrowed(value)
            };
            match value {
                Cow::Owned(value) => Some(format!("{key}: {value}")),
                Cow::Borrowed(_) => None,
            }
        });
        match relocated {
            Some(relocated) => {
                out.push_str(&wrap_manifest_line(&relocated, newline));
                changed = true;
            }
            None => out.push_str(line.raw),
        }
    }
    changed.then(|| out.into_bytes())
}
