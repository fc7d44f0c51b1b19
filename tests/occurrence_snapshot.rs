use image::RgbaImage;
use ocr_substitute::ImageExtractor;
use ocr_substitute::ocr::{ParseOptions, StaticReport, TextOccurrence};

const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t400\t200\t-1\t
4\t1\t1\t1\t1\t0\t12\t18\t128\t20\t-1\t
5\t1\t1\t1\t1\t1\t12\t18\t64\t20\t95.2\tInvoice
5\t1\t1\t1\t1\t2\t84\t18\t8\t20\t30.1\t|
5\t1\t1\t1\t1\t3\t100\t18\t40\t20\t91.0\t2024
5\t1\t2\t1\t1\t1\t12\t60\t120\t22\t88.7\tTotal:
";

fn summarize(occurrences: &[TextOccurrence]) -> String {
    occurrences
        .iter()
        .map(|occ| {
            format!(
                "{} {:?} {:?} size={} conf={} block={} word={}",
                occ.occurrence_id,
                occ.text,
                occ.rectangle().as_tuple(),
                occ.font_size().unwrap(),
                occ.conf,
                occ.block_num,
                occ.word_num
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn tesseract_report_snapshot() {
    let extractor = ImageExtractor::new(
        RgbaImage::new(400, 200),
        &StaticReport(TSV.to_string()),
        &ParseOptions::default(),
    )
    .unwrap();

    insta::assert_snapshot!(summarize(extractor.occurrences()), @r#"
    0 "Invoice" (12, 18, 76, 38) size=11 conf=95 block=1 word=1
    1 "2024" (100, 18, 140, 38) size=13 conf=91 block=1 word=3
    2 "Total:" (12, 60, 132, 82) size=26 conf=88 block=2 word=1
    "#);
}

#[test]
fn whitespace_report_scenario() {
    let report = "text left top width height conf word_num page_num par_num line_num block_num level
Hello 10 20 50 15 90 1 1 1 1 1 5
| 62 20 2 15 30 2 1 1 1 1 5
world 70 20 50 15 90 3 1 1 1 1 5
";
    let extractor = ImageExtractor::new(
        RgbaImage::new(200, 60),
        &StaticReport(report.to_string()),
        &ParseOptions::default(),
    )
    .unwrap();

    insta::assert_snapshot!(summarize(extractor.occurrences()), @r#"
    0 "Hello" (10, 20, 60, 35) size=13 conf=90 block=1 word=1
    1 "world" (70, 20, 120, 35) size=13 conf=90 block=1 word=3
    "#);
}
