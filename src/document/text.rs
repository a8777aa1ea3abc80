use crate::error::{Result, TransdocError};
use super::Paragraph;

const BOM: char = '\u{feff}';

/// Encoding details detected on load, reused on save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLayout {
    pub line_ending: &'static str,
    /// The file started with a UTF-8 byte order mark
    pub bom: bool,
}

/// One paragraph per line. A trailing newline yields a final empty paragraph
/// so that writing the document back reproduces it.
pub fn parse(bytes: &[u8]) -> Result<(TextLayout, Vec<Paragraph>)> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| TransdocError::Extraction(format!("Text file is not valid UTF-8: {}", e)))?;
    let bom = content.starts_with(BOM);
    let content = content.strip_prefix(BOM).unwrap_or(content);

    let line_ending = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let paragraphs = content
        .split(line_ending)
        .map(Paragraph::from_text)
        .collect();

    Ok((TextLayout { line_ending, bom }, paragraphs))
}

pub fn write(layout: &TextLayout, paragraphs: &[Paragraph]) -> Vec<u8> {
    let body = paragraphs
        .iter()
        .map(Paragraph::text)
        .collect::<Vec<_>>()
        .join(layout.line_ending);

    if layout.bom {
        format!("{}{}", BOM, body).into_bytes()
    } else {
        body.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_line_endings() {
        for input in ["a\nb\n", "a\r\nb", "", "single", "\u{feff}a\nb", "\u{feff}"] {
            let (layout, paragraphs) = parse(input.as_bytes()).unwrap();
            assert_eq!(write(&layout, &paragraphs), input.as_bytes());
        }
    }

    #[test]
    fn test_bom_is_not_part_of_the_text() {
        let (layout, paragraphs) = parse("\u{feff}Hello.\r\nBye.".as_bytes()).unwrap();
        assert!(layout.bom);
        assert_eq!(paragraphs[0].text(), "Hello.");

        let translated = vec![Paragraph::from_text("Bonjour."), Paragraph::from_text("Salut.")];
        assert_eq!(write(&layout, &translated), "\u{feff}Bonjour.\r\nSalut.".as_bytes());
    }

    #[test]
    fn test_blank_lines_are_units() {
        let (_, paragraphs) = parse(b"Hello.\n\nBye.").unwrap();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[1].text(), "");
    }

    #[test]
    fn test_invalid_utf8_is_extraction_error() {
        assert!(matches!(parse(&[0xff, 0xfe, 0x00]), Err(TransdocError::Extraction(_))));
    }
}
