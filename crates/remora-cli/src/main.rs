use std::io::Read;

use remora::{Dialect, ParseOptions, Pipeline};
use serde::Serialize;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Remora(remora::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Remora(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<remora::Error> for CliError {
    fn from(value: remora::Error) -> Self {
        Self::Remora(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Parse,
    Detect,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    dialect: Option<Dialect>,
    pretty: bool,
    no_geometry: bool,
    out: Option<String>,
}

fn usage() -> &'static str {
    "remora-cli\n\
\n\
USAGE:\n\
  remora-cli [parse] [--pretty] [--dialect <name>] [--no-geometry] [--out <path>] [<path>|-]\n\
  remora-cli detect [<path>|-]\n\
\n\
DIALECTS:\n\
  flowchart | sequence | mindmap | tikz | graphviz (auto-detected when omitted)\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - parse prints the canonical IR document as JSON on stdout.\n\
  - --no-geometry skips the external renderers (pdflatex / python3+dot / mmdc).\n\
  - detect prints the dialect id and nothing else.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "parse" => args.command = Command::Parse,
            "detect" => args.command = Command::Detect,
            "--pretty" => args.pretty = true,
            "--no-geometry" => args.no_geometry = true,
            "--dialect" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.dialect = Some(
                    name.parse::<Dialect>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match out {
        None => {
            println!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn source_id(input: Option<&str>) -> &str {
    match input {
        None | Some("-") => "stdin",
        Some(path) => path,
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let pipeline = Pipeline::new();
    let options = ParseOptions {
        enrich_geometry: !args.no_geometry,
    };

    match args.command {
        Command::Detect => {
            let dialect = match args.dialect {
                Some(dialect) => dialect,
                None => pipeline_detect(&text)?,
            };
            println!("{dialect}");
            Ok(())
        }
        Command::Parse => {
            let id = source_id(args.input.as_deref());
            let doc = match args.dialect {
                Some(dialect) => pipeline.parse_as(dialect, &text, id, &options)?,
                None => pipeline.parse(&text, id, &options)?,
            };
            write_json(&doc, args.pretty, args.out.as_deref())
        }
    }
}

fn pipeline_detect(text: &str) -> Result<Dialect, CliError> {
    Ok(remora::detect::DetectorRegistry::default_dialects().detect(text)?)
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::Remora(err @ remora::Error::UnknownDialect { .. })) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
