use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

const PROGRAM: &str = "text-ocr-rust";

#[derive(Parser, Debug)]
#[command(
    name = "text-ocr-rust",
    version,
    about = "Render text onto an image and read it back with OCR"
)]
struct Cli {
    /// Text to draw onto the image
    #[arg(allow_hyphen_values = true)]
    text: String,

    /// Output image path (format follows the extension, e.g. .png)
    #[arg(allow_hyphen_values = true)]
    filename: String,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// OCR languages (e.g. eng or eng+deu), overrides settings
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Enable verbose logging on stderr
    #[arg(long = "verbose")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return report_parse_error(err),
    };
    if let Err(err) = text_ocr_rust::logging::init(cli.verbose) {
        eprintln!("Error: {:#}", err);
        return ExitCode::FAILURE;
    }

    let result = text_ocr_rust::run(text_ocr_rust::Config {
        text: cli.text,
        filename: cli.filename,
        settings_path: cli.read_settings,
        ocr_languages: cli.lang,
    });
    match result {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn report_parse_error(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        ErrorKind::MissingRequiredArgument | ErrorKind::UnknownArgument => {
            eprintln!("Error: Incorrect number of arguments.");
        }
        _ => {
            let rendered = err.to_string();
            let line = rendered.lines().next().unwrap_or_default();
            eprintln!("Error: {}", line.trim_start_matches("error: "));
        }
    }
    print_usage();
    ExitCode::FAILURE
}

fn print_usage() {
    eprintln!("Usage: {} <text> <output_filename>", PROGRAM);
    eprintln!("Example: {} \"Hello from Copilot!\" test.png", PROGRAM);
}
