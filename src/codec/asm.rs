// Byte data embedded in 68k assembly source as dc.b/dc.w/dc.l (or .byte/.word/.long).
use itertools::Itertools;

use crate::error::{Error, Result};

const DIRECTIVES: [(&str, usize); 6] = [
    ("dc.b", 1),
    ("dc.w", 2),
    ("dc.l", 4),
    (".byte", 1),
    (".word", 2),
    (".long", 4),
];

/// Split a digit string into byte-sized groups after left-padding it to a
/// whole number of groups, then parse each group in `base`. The result is
/// zero-extended on the left to at least `width` bytes.
fn push_digit_groups(
    out: &mut Vec<u8>,
    token: &str,
    digits: &str,
    base: u32,
    width: usize,
) -> Result<()> {
    if !digits.chars().all(|c| c.is_digit(base)) {
        return Err(Error::MalformedLiteral {
            token: token.to_string(),
            base,
        });
    }
    let group = if base == 2 { 8 } else { 2 };
    let pad = (group - digits.len() % group) % group;
    let padded = "0".repeat(pad) + digits;
    let count = padded.len() / group;
    out.extend(std::iter::repeat(0).take(width.saturating_sub(count)));
    for chunk in &padded.chars().chunks(group) {
        let s: String = chunk.collect();
        let b = u8::from_str_radix(&s, base).map_err(|_| Error::MalformedLiteral {
            token: token.to_string(),
            base,
        })?;
        out.push(b);
    }
    Ok(())
}

fn push_operand(out: &mut Vec<u8>, token: &str, width: usize) -> Result<()> {
    if let Some(digits) = token.strip_prefix('$').or_else(|| token.strip_prefix("0x")) {
        if !digits.is_empty() {
            push_digit_groups(out, token, digits, 16, width)?;
        }
    } else if let Some(digits) = token.strip_prefix('%') {
        if !digits.is_empty() {
            push_digit_groups(out, token, digits, 2, width)?;
        }
    } else {
        let value: u64 = token.parse().map_err(|_| Error::MalformedLiteral {
            token: token.to_string(),
            base: 10,
        })?;
        push_digit_groups(out, token, &format!("{:x}", value), 16, width)?;
    }
    Ok(())
}

/// Collect every byte defined by data directives, in source order.
///
/// Each operand fills at least the directive's width (`dc.w %1` gives
/// `00 01`); an operand with more digits than that keeps all of them.
pub fn extract_bytes(source: &str) -> Result<Vec<u8>> {
    let mut out = vec![];
    for line in source.lines() {
        let code = line.split(';').next().unwrap_or("").trim().to_lowercase();
        let mut words = code.split_whitespace();
        // Labels may precede the directive.
        let Some(width) = words
            .by_ref()
            .find_map(|w| DIRECTIVES.iter().find(|(d, _)| *d == w).map(|&(_, n)| n))
        else {
            continue;
        };
        let operands: String = words.collect();
        for token in operands.split(',') {
            if !token.is_empty() {
                push_operand(&mut out, token, width)?;
            }
        }
    }
    Ok(out)
}

/// Format bytes as `dc.w` lines, eight words per line, with a trailing
/// `dc.b` for an odd final byte. `label` goes on its own line when given.
pub fn bytes_to_asm(bytes: &[u8], label: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(label) = label {
        out.push_str(label);
        out.push_str(":\n");
    }
    let words = bytes.chunks_exact(2);
    let rest = words.remainder();
    for line in &words.chunks(8) {
        let operands = line.map(|w| format!("${:02X}{:02X}", w[0], w[1])).join(",");
        out.push_str(&format!("\tdc.w {}\n", operands));
    }
    if let [b] = rest {
        out.push_str(&format!("\tdc.b ${:02X}\n", b));
    }
    out
}
