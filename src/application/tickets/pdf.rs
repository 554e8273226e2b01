//! Single-page PDF ticket
//!
//! Writes a minimal PDF 1.4 document using the two standard Helvetica
//! faces, so no font data has to be embedded. Both faces use
//! `WinAnsiEncoding`, which covers Latin-1 and the usual typographic
//! punctuation.

use std::fmt::Write as _;

/// Everything printed on a ticket.
#[derive(Debug, Clone)]
pub struct TicketData {
    pub ticket_number: String,
    pub status: String,
    pub event_title: String,
    pub event_date: String,
    pub event_location: String,
    pub participant_name: String,
    pub participant_email: String,
    pub issued_at: String,
}

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 56;

/// Render `ticket` as PDF bytes.
pub fn render_ticket(ticket: &TicketData) -> Vec<u8> {
    let content = content_stream(ticket);

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 4 0 R /F2 5 0 R >> >> /Contents 6 0 R >>"
        ),
        font("Helvetica"),
        font("Helvetica-Bold"),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
    ];

    let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_at = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = writeln!(xref, "{:010} 00000 n ", offset);
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    );
    out.extend_from_slice(xref.as_bytes());
    out
}

fn font(base: &str) -> String {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
}

fn content_stream(t: &TicketData) -> String {
    let mut s = String::new();
    let mut y = PAGE_HEIGHT - MARGIN - 20;

    text(&mut s, "F2", 24, MARGIN, y, "Event Ticket");
    y -= 40;
    text(&mut s, "F2", 16, MARGIN, y, &t.event_title);
    y -= 30;

    let rows = [
        ("Date", &t.event_date),
        ("Location", &t.event_location),
        ("Participant", &t.participant_name),
        ("Email", &t.participant_email),
        ("Ticket number", &t.ticket_number),
        ("Status", &t.status),
    ];
    for (label, value) in rows {
        text(&mut s, "F2", 11, MARGIN, y, label);
        text(&mut s, "F1", 11, MARGIN + 110, y, value);
        y -= 20;
    }

    // Separator line
    y -= 10;
    let _ = writeln!(s, "{} {} m {} {} l S", MARGIN, y, PAGE_WIDTH - MARGIN, y);
    y -= 20;
    text(
        &mut s,
        "F1",
        9,
        MARGIN,
        y,
        &format!("Issued {}. Present this ticket at the entrance.", t.issued_at),
    );
    s.trim_end().to_string()
}

fn text(out: &mut String, font: &str, size: u32, x: u32, y: u32, value: &str) {
    let _ = writeln!(
        out,
        "BT /{} {} Tf {} {} Td ({}) Tj ET",
        font,
        size,
        x,
        y,
        escape(value)
    );
}

/// Escape a PDF literal string. Characters above ASCII are written as
/// octal escapes of their WinAnsi code so the content stream stays 7-bit;
/// anything WinAnsi cannot represent becomes `?`.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => match win_ansi(c) {
                Some(code) => {
                    let _ = write!(out, "\\{:03o}", code);
                }
                None => out.push('?'),
            },
        }
    }
    out
}

/// WinAnsi (cp1252) code for a non-ASCII character.
fn win_ansi(c: char) -> Option<u8> {
    let code = match c {
        '\u{A0}'..='\u{FF}' => return u8::try_from(u32::from(c)).ok(),
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(code)
}
