mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use shell_diff_gate::error::{GateError, Result};
use shell_diff_gate::lint::shellcheck::ShellCheck;
use shell_diff_gate::lint::Linter;
use shell_diff_gate::{config, diff, gate, output, report};
use std::io::Read;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check {
            diff: diff_path,
            files,
            root,
            format,
            output: output_path,
            summary,
            config: config_path,
            lint_tool,
            threshold,
            timeout,
            extensions,
            fail_on_tool_error,
        } => {
            if !root.is_dir() {
                eprintln!("Error: root is not a directory: {}", root.display());
                std::process::exit(2);
            }

            let mut config =
                config::Config::load(config_path.as_deref()).unwrap_or_else(|e| exit_error(&e));
            if let Some(tool) = lint_tool {
                config.lint.tool = tool;
            }
            if let Some(threshold) = threshold {
                config.gate.threshold = threshold;
            }
            if let Some(secs) = timeout {
                config.lint.timeout_secs = secs;
            }
            if let Some(exts) = extensions {
                config.classify.extensions = exts;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            if fail_on_tool_error {
                config.gate.fail_on_tool_error = true;
            }
            config.finalize().unwrap_or_else(|e| exit_error(&e));

            let diff_text = read_input(&diff_path, "diff").unwrap_or_else(|e| exit_error(&e));
            let file_list = files.map(|path| {
                read_input(&path, "file list")
                    .unwrap_or_else(|e| exit_error(&e))
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            });

            let input = gate::GateInput {
                diff_text: &diff_text,
                files: file_list,
                root: &root,
            };
            let linter = ShellCheck::from_config(&config.lint);
            let run = gate::run_gate(&input, &config, &linter);
            let built = report::build(&run, config.output.format);

            match output_path {
                Some(path) => {
                    write_file(&path, &built.machine);
                    eprintln!("Diagnostics written to {}", path.display());
                }
                None => print!("{}", built.machine),
            }

            match summary {
                Some(path) => write_file(&path, &built.human),
                None => eprint!("{}", output::pretty::format(&run)),
            }

            std::process::exit(built.exit_code);
        }

        Commands::ParseDiff { diff: diff_path } => {
            let diff_text = read_input(&diff_path, "diff").unwrap_or_else(|e| exit_error(&e));
            let parsed = diff::parse(&diff_text);

            let files: Vec<serde_json::Value> = parsed
                .files()
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "path": f.path(),
                        "old_path": f.old_path,
                        "status": f.status,
                        "hunks": f.hunks.len(),
                        "modified_lines": f.modified_lines(),
                    })
                })
                .collect();
            let doc = serde_json::json!({
                "files": files,
                "warnings": parsed.warnings,
            });

            match serde_json::to_string_pretty(&doc) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(2);
                }
            }
        }

        Commands::CheckTools {
            lint_tool,
            config: config_path,
        } => {
            let mut config =
                config::Config::load(config_path.as_deref()).unwrap_or_else(|e| exit_error(&e));
            if let Some(tool) = lint_tool {
                config.lint.tool = tool;
            }

            let linter = ShellCheck::from_config(&config.lint);
            println!("{}", "Lint Tool Availability".bold().underline());
            println!();

            let status = if linter.is_available() {
                "READY".green().bold().to_string()
            } else {
                "NOT AVAILABLE".red().to_string()
            };
            println!(
                "  [{status}] {name:<12} {tool}",
                name = linter.name(),
                tool = linter.tool(),
            );
            println!();
            println!("Note: without the lint tool, runs that touch shell scripts are indeterminate (exit 2).");
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "shell_diff_gate=debug"
    } else {
        "shell_diff_gate=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Reads `path`, or stdin when `path` is `-`.
///
/// Invalid UTF-8 is replaced rather than rejected, so one binary or
/// Latin-1 hunk only degrades its own lines.
fn read_input(path: &Path, what: &'static str) -> Result<String> {
    let (bytes, source_name) = if path == Path::new("-") {
        let mut buf = Vec::new();
        let read = std::io::stdin().read_to_end(&mut buf).map(|_| buf);
        (read, "stdin".to_string())
    } else {
        (std::fs::read(path), path.display().to_string())
    };
    let bytes = bytes.map_err(|source| GateError::Input {
        what,
        source_name,
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_file(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap_or_else(|e| {
        eprintln!("Error writing {}: {e}", path.display());
        std::process::exit(2);
    });
}

fn exit_error(e: &GateError) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(2);
}
