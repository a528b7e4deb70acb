use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use bumpalo::Bump;
use clap::{CommandFactory, Parser};
use miette::{IntoDiagnostic, Result, WrapErr};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tacit::render_error;
use tacit_core::api::{Engine, EngineOptions};
use tacit_core::values::format_stack;
use tracing::debug;

/// Tacit - a small concatenative language with a static stack verifier
#[derive(Parser, Debug)]
#[command(name = "tacit")]
#[command(about = "Verify and execute tacit programs", long_about = None)]
struct Args {
    /// Program file to execute
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Re-execute whenever the file changes
    #[arg(short, long, requires = "file")]
    watch: bool,

    /// Also print the inferred signature of the whole program
    #[arg(long)]
    signature: bool,
}

/// Compile and run `path` once, rendering any program error and printing
/// the resulting operand stack.
///
/// Each run owns its arena, so nothing from one run outlives it.
fn execute(path: &Path, show_signature: bool) -> Result<()> {
    let arena = Bump::new();
    let engine = Engine::with_prelude(&arena, EngineOptions::default())
        .into_diagnostic()
        .wrap_err("failed to install the prelude")?;

    let program = match engine.compile_file(path, &[]) {
        Ok(program) => program,
        Err(err) => {
            render_error(&err);
            return Ok(());
        }
    };

    if show_signature {
        println!("{}", program.signature_string());
    }

    match program.run(Vec::new()) {
        Ok(stack) => println!("{}", format_stack(&stack)),
        Err(err) => render_error(&err),
    }
    debug!(arena_bytes = arena.allocated_bytes(), "run finished");
    Ok(())
}

fn build_watcher(
    tx: mpsc::Sender<Result<notify::Event, notify::Error>>,
) -> notify::Result<RecommendedWatcher> {
    notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .map(|mut watcher| {
        watcher
            .configure(Config::default().with_poll_interval(Duration::from_millis(200)))
            .ok();
        watcher
    })
}

fn watch(path: &Path, show_signature: bool) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = build_watcher(tx)
        .into_diagnostic()
        .wrap_err("failed to start file watcher")?;
    watcher
        .watch(path, RecursiveMode::NonRecursive)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot watch {}", path.display()))?;

    println!("Watching {} for changes. Press Ctrl+C to stop…", path.display());

    for event in rx {
        match event {
            Ok(event) => {
                if matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    debug!(kind = ?event.kind, "file changed");
                    if let Err(err) = execute(path, show_signature) {
                        eprintln!("{err:?}");
                    }
                }
            }
            Err(err) => eprintln!("watch error: {err}"),
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG to control log level, default to WARN
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let Some(path) = args.file else {
        Args::command().print_help().into_diagnostic()?;
        return Ok(());
    };

    execute(&path, args.signature)?;
    if args.watch {
        watch(&path, args.signature)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tacit-cli-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_execute_repeatedly() {
        let path = scratch_file("repeat.tc", "(def (twice x) (* x 2)) (twice 21)");
        execute(&path, true).unwrap();
        fs::write(&path, "(+ 1 \"two\")").unwrap();
        execute(&path, false).unwrap();
        fs::write(&path, "1 2 +").unwrap();
        execute(&path, false).unwrap();
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_execute_missing_file_is_rendered() {
        let path = std::env::temp_dir().join("tacit-cli-no-such-file.tc");
        assert!(execute(&path, false).is_ok());
    }

    #[test]
    fn test_watch_requires_file() {
        assert!(Args::try_parse_from(["tacit", "--watch"]).is_err());
        let args = Args::try_parse_from(["tacit", "-f", "prog.tc", "-w"]).unwrap();
        assert!(args.watch);
    }
}
