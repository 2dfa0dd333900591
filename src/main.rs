use log::debug;
use pxldis::config::OutputOptions;
use pxldis::disassembler::{DecodeSession, Step, Token};
use pxldis::error::{DecodeError, DecodeFailure};
use pxldis::formatter::{self, Listing, SinkError};
use std::env;
use std::fs;
use std::io::{self, BufWriter, Write};

fn usage(program: &str) {
    eprintln!("Usage: {} [options] <file>...", program);
    eprintln!("\nOptions:");
    eprintln!("  -n             Omit file offsets from operator comments");
    eprintln!("  -d             Do not hex dump embedded data");
    eprintln!("  -c <file>      Read output options from a TOML file");
    eprintln!("  -t, --tables   List known operators, attributes and enumerations");
    eprintln!("  -h             Show this help message");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(|s| s.as_str()).unwrap_or("pxldis");

    // Parse command line options
    let mut omit_offsets = false;
    let mut no_dump = false;
    let mut show_tables = false;
    let mut config_path = None;
    let mut files = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-n" => omit_offsets = true,
            "-d" => no_dump = true,
            "-t" | "--tables" => show_tables = true,
            "-c" => {
                i += 1;
                match args.get(i) {
                    Some(path) => config_path = Some(path.clone()),
                    None => {
                        eprintln!("Option -c needs a file name");
                        std::process::exit(1);
                    }
                }
            }
            "-h" | "--help" => {
                usage(program);
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => files.push(arg.to_string()),
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if files.is_empty() && !show_tables {
        usage(program);
        std::process::exit(1);
    }

    let mut options = match &config_path {
        Some(path) => OutputOptions::load(path)?,
        None => OutputOptions::default(),
    };
    if omit_offsets {
        options.show_offsets = false;
    }
    if no_dump {
        options.dump_hex = false;
    }
    debug!("Output options: {:?}", options);

    let listing = Listing::new(options);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match run(&listing, &files, show_tables, &mut out) {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        // reader went away, nothing more to say
        Err(SinkError::Closed) => Ok(()),
        Err(SinkError::Io(e)) => Err(e.into()),
    }
}

/// Disassemble every file in turn; true when all of them reached a job end
fn run<W: Write>(
    listing: &Listing,
    files: &[String],
    show_tables: bool,
    out: &mut W,
) -> Result<bool, SinkError> {
    if show_tables {
        formatter::write_output(out, &formatter::render_tables())?;
    }

    let mut all_ok = true;
    for path in files {
        if files.len() > 1 {
            formatter::write_output(out, &format!("// {}\n", path))?;
        }
        if !disassemble_file(listing, path, out)? {
            all_ok = false;
        }
    }
    out.flush()?;
    Ok(all_ok)
}

fn disassemble_file<W: Write>(listing: &Listing, path: &str, out: &mut W) -> Result<bool, SinkError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            return Ok(false);
        }
    };
    debug!("Loaded {} bytes from {}", data.len(), path);

    let mut session = match DecodeSession::open(&data) {
        Ok(session) => session,
        Err(error) => {
            report(out, path, &DecodeFailure::new(error, Vec::new(), &data, 0))?;
            return Ok(false);
        }
    };
    formatter::write_output(out, &listing.render_header(session.header()))?;

    loop {
        match session.step() {
            Ok(Step::MoreTokens(tokens)) => {
                formatter::write_output(out, &listing.render_step(&tokens))?;
            }
            Ok(Step::TerminatedByMarker(token)) => {
                let mut tokens = session.partial_tokens().to_vec();
                tokens.push(token);
                formatter::write_output(out, &listing.render_step(&tokens))?;
                debug!(
                    "{}: {} operators, job end reached",
                    path,
                    session.operator_count()
                );
                return Ok(true);
            }
            Ok(Step::UnexpectedEndOfStream { offset, needed, .. }) => {
                let error = DecodeError::UnexpectedEndOfStream { offset, needed };
                fail(listing, &session, error, path, out)?;
                return Ok(false);
            }
            Err(error) => {
                fail(listing, &session, error, path, out)?;
                return Ok(false);
            }
        }
    }
}

/// Print what the interrupted step decoded, then the error
fn fail<W: Write>(
    listing: &Listing,
    session: &DecodeSession,
    error: DecodeError,
    path: &str,
    out: &mut W,
) -> Result<(), SinkError> {
    let partial: Vec<Token> = session.partial_tokens().to_vec();
    formatter::write_output(out, &listing.render_step(&partial))?;
    report(out, path, &session.failure(error, partial))
}

fn report<W: Write>(out: &mut W, path: &str, failure: &DecodeFailure) -> Result<(), SinkError> {
    // keep stdout and stderr in order when both go to a terminal
    out.flush()?;
    eprintln!("{}: {}", path, failure);
    Ok(())
}
