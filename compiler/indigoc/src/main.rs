//! The `indigo` command line tool.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use indigo_diagnostic::Renderer;
use indigo_session::{CompileOptions, DiskLookup, FileLookup};
use indigoc::compile_many;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print_usage();
        return;
    }
    let Some(cli) = parse_args(&args) else {
        print_usage();
        std::process::exit(1);
    };
    init_tracing(cli.verbose);

    let lookup: Arc<dyn FileLookup> = Arc::new(DiskLookup);
    let Some(report) = compile_many(
        &cli.roots,
        cli.options,
        &lookup,
        cli.out_dir.as_deref(),
        cli.jobs,
    ) else {
        print_usage();
        std::process::exit(1);
    };

    let renderer = Renderer::new(std::io::stderr().is_terminal());
    let mut err = std::io::stderr().lock();
    let _ = renderer.render(&mut err, report.context.diagnostics(), &mut |path| {
        lookup.open_text(path).ok()
    });
    drop(err);

    if !report.success() {
        std::process::exit(1);
    }
}

struct Cli {
    roots: Vec<PathBuf>,
    out_dir: Option<PathBuf>,
    options: CompileOptions,
    jobs: Option<usize>,
    verbose: bool,
}

fn parse_args(args: &[String]) -> Option<Cli> {
    let mut cli = Cli {
        roots: Vec::new(),
        out_dir: None,
        options: CompileOptions::empty(),
        jobs: None,
        verbose: false,
    };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" if i + 1 < args.len() => {
                cli.out_dir = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "-o" => {
                eprintln!("error: `-o` needs a directory");
                return None;
            }
            "--jobs" if i + 1 < args.len() => {
                match args[i + 1].parse::<usize>() {
                    Ok(jobs) if jobs > 0 => cli.jobs = Some(jobs),
                    _ => {
                        eprintln!("error: `--jobs` needs a positive thread count");
                        return None;
                    }
                }
                i += 1;
            }
            "--jobs" => {
                eprintln!("error: `--jobs` needs a positive thread count");
                return None;
            }
            "--minify" => cli.options |= CompileOptions::MINIFY,
            "--compress" => cli.options |= CompileOptions::OPTIMIZE_COMPRESSION,
            "--cache-breakers" => cli.options |= CompileOptions::CACHE_BREAKERS,
            "--prefix" => cli.options |= CompileOptions::AUTO_PREFIX,
            "--warnings-as-errors" => cli.options |= CompileOptions::WARNINGS_AS_ERRORS,
            "-v" | "--verbose" => cli.verbose = true,
            other if other.starts_with('-') => {
                eprintln!("error: unknown option `{other}`");
                return None;
            }
            other => cli.roots.push(PathBuf::from(other)),
        }
        i += 1;
    }
    if cli.roots.is_empty() {
        eprintln!("error: no input files");
        return None;
    }
    Some(cli)
}

fn print_usage() {
    println!("Indigo stylesheet compiler");
    println!();
    println!("Usage: indigo <root.icss>... [options]");
    println!();
    println!("Options:");
    println!("  -o <dir>               Output directory (default: next to each input)");
    println!("  --minify               Emit minimal CSS and shorten values");
    println!("  --compress             Reorder rules for smaller gzipped output");
    println!("  --cache-breakers       Append content-hash query strings to urls");
    println!("  --prefix               Synthesize vendor-prefixed declarations");
    println!("  --warnings-as-errors   Promote warnings to errors");
    println!("  --jobs <n>             Worker threads when compiling several roots");
    println!("  -v, --verbose          Debug logging to stderr");
    println!();
    println!("Examples:");
    println!("  indigo site/main.icss");
    println!("  indigo a.icss b.icss -o build --minify --compress");
}

/// Logging is off unless asked for: `--verbose` forces debug level,
/// otherwise `RUST_LOG` decides.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        return;
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
