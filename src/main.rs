use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{ArgAction, Parser};

use ocr_substitute::ocr::{Replacement, list_tesseract_languages};

#[derive(Parser, Debug)]
#[command(
    name = "ocr-substitute",
    version,
    about = "Replace every recognized word in an image with substitute text"
)]
struct Cli {
    /// Image to process
    #[arg(required_unless_present = "show_languages")]
    input: Option<PathBuf>,

    /// Where to write the result (PNG)
    #[arg(short = 'o', long = "output", default_value = "output.png")]
    output: PathBuf,

    /// Text drawn in place of every occurrence
    #[arg(short = 't', long = "text", required_unless_present_any = ["label_ids", "show_languages"])]
    text: Option<String>,

    /// Draw each occurrence's id instead of replacement text
    #[arg(long = "label-ids", conflicts_with = "text")]
    label_ids: bool,

    /// Tesseract languages (e.g. eng+pol)
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Tesseract page segmentation mode
    #[arg(long = "psm")]
    psm: Option<u32>,

    /// Use a saved recognition report instead of running tesseract
    #[arg(long = "report")]
    report: Option<PathBuf>,

    /// Font family for replacement text
    #[arg(long = "font-family")]
    font_family: Option<String>,

    /// Font file for replacement text
    #[arg(long = "font-path")]
    font_path: Option<PathBuf>,

    /// Write the extracted occurrences as JSON
    #[arg(long = "dump-json")]
    dump_json: Option<PathBuf>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<PathBuf>,

    /// Open the result in the system image viewer
    #[arg(long = "show")]
    show: bool,

    /// Show installed tesseract languages and exit
    #[arg(long = "show-languages")]
    show_languages: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    ocr_substitute::logging::init(cli.verbose)?;

    if cli.show_languages {
        for lang in list_tesseract_languages()? {
            println!("{}", lang);
        }
        return Ok(());
    }

    let input = cli.input.ok_or_else(|| anyhow!("input image is required"))?;
    let replacement = if cli.label_ids {
        Replacement::OccurrenceId
    } else {
        let text = cli
            .text
            .ok_or_else(|| anyhow!("--text is required unless --label-ids is given"))?;
        Replacement::Text(text)
    };

    let config = ocr_substitute::Config {
        input,
        output: cli.output,
        replacement,
        languages: cli.lang,
        psm: cli.psm,
        report: cli.report,
        font_family: cli.font_family,
        font_path: cli.font_path,
        dump_json: cli.dump_json,
        settings_path: cli.read_settings,
        show: cli.show,
    };
    let outcome = ocr_substitute::run(&config)?;
    println!(
        "{}: {} substituted, {} skipped",
        outcome.output.display(),
        outcome.summary.substituted,
        outcome.summary.skipped
    );
    Ok(())
}
