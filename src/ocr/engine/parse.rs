use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ocr::TextOccurrence;

/// Tokens the backend emits spuriously for table rules and column separators.
pub const DEFAULT_NOISE: &[&str] = &["|"];

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub noise: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            noise: DEFAULT_NOISE.iter().map(|value| value.to_string()).collect(),
        }
    }
}

impl ParseOptions {
    fn is_noise(&self, text: &str) -> bool {
        self.noise.iter().any(|value| value == text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Text,
    Left,
    Top,
    Width,
    Height,
    Conf,
    PageNum,
    BlockNum,
    ParNum,
    LineNum,
    WordNum,
    Level,
}

const SCHEMA: [Column; 12] = [
    Column::Text,
    Column::Left,
    Column::Top,
    Column::Width,
    Column::Height,
    Column::Conf,
    Column::PageNum,
    Column::BlockNum,
    Column::ParNum,
    Column::LineNum,
    Column::WordNum,
    Column::Level,
];

impl Column {
    fn name(self) -> &'static str {
        match self {
            Column::Text => "text",
            Column::Left => "left",
            Column::Top => "top",
            Column::Width => "width",
            Column::Height => "height",
            Column::Conf => "conf",
            Column::PageNum => "page_num",
            Column::BlockNum => "block_num",
            Column::ParNum => "par_num",
            Column::LineNum => "line_num",
            Column::WordNum => "word_num",
            Column::Level => "level",
        }
    }

    // Variants are declared in SCHEMA order.
    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Tab,
    Whitespace,
}

impl Delimiter {
    // Tesseract TSV keeps empty trailing cells, which only survive a tab split.
    fn detect(header: &str) -> Self {
        if header.contains('\t') {
            Delimiter::Tab
        } else {
            Delimiter::Whitespace
        }
    }

    fn split(self, line: &str) -> Vec<&str> {
        match self {
            Delimiter::Tab => line.split('\t').map(str::trim).collect(),
            Delimiter::Whitespace => line.split_ascii_whitespace().collect(),
        }
    }
}

struct ColumnIndex {
    positions: [usize; SCHEMA.len()],
    width: usize,
}

impl ColumnIndex {
    fn from_header(header: &[&str]) -> Result<Self> {
        let mut positions = [0usize; SCHEMA.len()];
        for (slot, column) in SCHEMA.iter().enumerate() {
            positions[slot] = header
                .iter()
                .position(|name| *name == column.name())
                .ok_or(Error::MissingColumn {
                    column: column.name(),
                })?;
        }
        Ok(Self {
            positions,
            width: header.len(),
        })
    }

    fn position(&self, column: Column) -> usize {
        self.positions[column.slot()]
    }

    fn text_is_last(&self) -> bool {
        self.position(Column::Text) + 1 == self.width
    }
}

struct Row<'a> {
    line: usize,
    fields: &'a [&'a str],
    columns: &'a ColumnIndex,
}

impl Row<'_> {
    fn raw(&self, column: Column) -> &str {
        self.fields[self.columns.position(column)]
    }

    fn invalid(&self, column: Column) -> Error {
        Error::InvalidField {
            line: self.line,
            field: column.name(),
            value: self.raw(column).to_string(),
        }
    }

    fn unsigned(&self, column: Column) -> Result<u32> {
        self.raw(column)
            .parse::<u32>()
            .map_err(|_| self.invalid(column))
    }

    fn signed(&self, column: Column) -> Result<i32> {
        self.raw(column)
            .parse::<i32>()
            .map_err(|_| self.invalid(column))
    }

    // Tesseract 4+ reports fractional confidences.
    fn confidence(&self) -> Result<i32> {
        let raw = self.raw(Column::Conf);
        if let Ok(value) = raw.parse::<i32>() {
            return Ok(value);
        }
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .filter(|value| *value >= i32::MIN as f64 && *value <= i32::MAX as f64)
            .map(|value| value.trunc() as i32)
            .ok_or_else(|| self.invalid(Column::Conf))
    }
}

/// Parse a recognition report into occurrences, in report order.
///
/// The first non-blank line is the header. Rows without text or whose text is in
/// the noise set are dropped before ids are assigned, so ids are always `0..n`.
/// Rows with a zero-area box are dropped as well.
pub fn parse_report(report: &str, options: &ParseOptions) -> Result<Vec<TextOccurrence>> {
    let mut lines = report
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line));

    let (_, header_line) = lines.next().ok_or(Error::EmptyReport)?;
    let delimiter = Delimiter::detect(header_line);
    let header = delimiter.split(header_line);
    let columns = ColumnIndex::from_header(&header)?;

    let mut occurrences = Vec::new();
    let mut rows = 0usize;
    let mut noise = 0usize;
    let mut degenerate = 0usize;

    for (line, raw) in lines {
        rows += 1;
        let fields = delimiter.split(raw);
        if fields.len() != columns.width {
            // Whitespace splitting swallows an empty trailing text cell.
            let missing_text = delimiter == Delimiter::Whitespace
                && columns.text_is_last()
                && fields.len() + 1 == columns.width;
            if missing_text {
                continue;
            }
            return Err(Error::FieldCount {
                line,
                expected: columns.width,
                found: fields.len(),
            });
        }

        let row = Row {
            line,
            fields: &fields,
            columns: &columns,
        };
        let text = row.raw(Column::Text).trim();
        if text.is_empty() {
            continue;
        }
        if options.is_noise(text) {
            noise += 1;
            continue;
        }

        let width = row.unsigned(Column::Width)?;
        let height = row.unsigned(Column::Height)?;
        let occurrence = TextOccurrence {
            occurrence_id: occurrences.len(),
            text: text.to_string(),
            conf: row.confidence()?,
            left: row.unsigned(Column::Left)?,
            top: row.unsigned(Column::Top)?,
            width,
            height,
            page_num: row.signed(Column::PageNum)?,
            block_num: row.signed(Column::BlockNum)?,
            par_num: row.signed(Column::ParNum)?,
            line_num: row.signed(Column::LineNum)?,
            word_num: row.signed(Column::WordNum)?,
            level: row.signed(Column::Level)?,
        };
        if width == 0 || height == 0 {
            warn!(
                line,
                text = %occurrence.text,
                width,
                height,
                "dropping zero-area occurrence"
            );
            degenerate += 1;
            continue;
        }
        occurrences.push(occurrence);
    }

    debug!(
        rows,
        kept = occurrences.len(),
        noise,
        degenerate,
        "parsed recognition report"
    );
    Ok(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const HEADER: &str =
        "text left top width height conf word_num page_num par_num line_num block_num level";

    fn report(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn parses_single_row() {
        let input = report(&["Hello 10 20 50 15 90 1 1 1 1 1 5"]);
        let parsed = parse_report(&input, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.len(), 1);
        let occ = &parsed[0];
        assert_eq!(occ.occurrence_id, 0);
        assert_eq!(occ.text, "Hello");
        assert_eq!(occ.conf, 90);
        assert_eq!(occ.rectangle().as_tuple(), (10, 20, 60, 35));
        assert_eq!(occ.font_size().unwrap(), 13);
        assert_eq!(occ.level, 5);
    }

    #[test]
    fn noise_rows_are_dropped_without_id_gaps() {
        let input = report(&[
            "One 0 0 30 10 90 1 1 1 1 1 5",
            "| 40 0 2 10 40 2 1 1 1 1 5",
            "Two 50 0 30 10 91 3 1 1 1 1 5",
        ]);
        let parsed = parse_report(&input, &ParseOptions::default()).unwrap();
        let summary = parsed
            .iter()
            .map(|occ| (occ.occurrence_id, occ.text.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(summary, vec![(0, "One"), (1, "Two")]);
    }

    #[test]
    fn custom_noise_set() {
        let input = report(&[
            "One 0 0 30 10 90 1 1 1 1 1 5",
            "~ 40 0 2 10 40 2 1 1 1 1 5",
            "| 50 0 3 10 91 3 1 1 1 1 5",
        ]);
        let options = ParseOptions {
            noise: vec!["~".to_string()],
        };
        let parsed = parse_report(&input, &options).unwrap();
        let texts = parsed.iter().map(|occ| occ.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["One", "|"]);
    }

    #[test]
    fn non_integer_width_names_field() {
        let input = report(&["Hello 10 20 abc 15 90 1 1 1 1 1 5"]);
        let err = parse_report(&input, &ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        match err {
            Error::InvalidField { line, field, value } => {
                assert_eq!(line, 2);
                assert_eq!(field, "width");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn negative_geometry_is_format_error() {
        let input = report(&["Hello -1 20 50 15 90 1 1 1 1 1 5"]);
        let err = parse_report(&input, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidField { field: "left", .. }));
    }

    #[test]
    fn field_count_mismatch_is_format_error() {
        let input = report(&["Hello 10 20 50 15 90 1 1 1 1 1 5 extra"]);
        let err = parse_report(&input, &ParseOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::FieldCount {
                line: 2,
                expected: 12,
                found: 13
            }
        ));
    }

    #[test]
    fn missing_column_is_format_error() {
        let input = "text left top width height conf\nHi 0 0 1 1 1";
        let err = parse_report(input, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column: "page_num" }));
    }

    #[test]
    fn empty_report_is_format_error() {
        let err = parse_report("  \n\n", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyReport));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let input = format!("\n{HEADER}\n\n   \nHi 1 2 3 4 5 1 1 1 1 1 5\n\n");
        let parsed = parse_report(&input, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "Hi");
    }

    #[test]
    fn parses_tesseract_tsv() {
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
                   1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t\n\
                   4\t1\t1\t1\t1\t0\t36\t92\t200\t24\t-1\t\n\
                   5\t1\t1\t1\t1\t1\t36\t92\t60\t24\t96.063919\tThe\n\
                   5\t1\t1\t1\t1\t2\t104\t92\t18\t24\t41.5\t|\n\
                   5\t1\t1\t1\t1\t3\t130\t92\t90\t24\t95\tquick\n";
        let parsed = parse_report(tsv, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].text, "The");
        assert_eq!(parsed[0].conf, 96);
        assert_eq!(parsed[0].word_num, 1);
        assert_eq!(parsed[1].occurrence_id, 1);
        assert_eq!(parsed[1].text, "quick");
        assert_eq!(parsed[1].left, 130);
        assert_eq!(parsed[1].word_num, 3);
    }

    #[test]
    fn whitespace_rows_without_trailing_text_are_skipped() {
        let input = "level page_num block_num par_num line_num word_num left top width height conf text\n\
                     1 1 0 0 0 0 0 0 640 480 -1\n\
                     5 1 1 1 1 1 36 92 60 24 96 The\n";
        let parsed = parse_report(input, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "The");
    }

    #[test]
    fn conf_rejects_non_numeric() {
        let input = report(&["Hello 10 20 50 15 high 1 1 1 1 1 5"]);
        let err = parse_report(&input, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidField { field: "conf", .. }));
    }

    #[test]
    fn zero_area_rows_are_dropped() {
        let input = report(&[
            "Flat 0 0 30 0 90 1 1 1 1 1 5",
            "Kept 0 0 30 10 90 1 1 1 1 1 5",
        ]);
        let parsed = parse_report(&input, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].occurrence_id, 0);
        assert_eq!(parsed[0].text, "Kept");
    }
}
