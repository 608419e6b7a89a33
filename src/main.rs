use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use minidb::{Config, DbError, QueryExecutor, QueryResult};
use tracing::info;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Statements (end each with ';'):
  CREATE TABLE t (col TYPE [PRIMARY KEY | UNIQUE | NOT NULL]..., ...);
  DROP TABLE t;
  INSERT INTO t (c1, c2) VALUES (v1, v2);
  SELECT * | c1, c2 FROM t [WHERE col op value];
  SELECT t1.c, t2.c FROM t1 INNER JOIN t2 ON t1.k = t2.k;
  UPDATE t SET col = value [WHERE col op value];
  DELETE FROM t [WHERE col op value];

Types: INTEGER, VARCHAR(n), FLOAT, BOOLEAN, DATE
Operators: = != > < >= <=

Shell commands: SHOW TABLES, DESCRIBE t, HELP, EXIT, QUIT";

/// Interactive SQL shell over a minidb data directory
#[derive(Parser, Debug)]
#[command(name = "minidb", version, about)]
struct Args {
    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Data directory, overrides the configuration
    #[arg(short = 'd', long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Execute a single statement and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

enum Flow {
    Continue,
    Exit,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("minidb=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(args: &Args) -> minidb::Result<Config> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    }
    .with_env_overrides();

    Ok(match &args.data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    })
}

fn run(args: &Args) -> minidb::Result<()> {
    let config = load_config(args)?;
    let executor = QueryExecutor::open(&config)?;
    info!(data_dir = %config.data_dir.display(), "database opened");

    if let Some(command) = &args.command {
        handle(&executor, command);
        return Ok(());
    }

    println!("minidb shell. End statements with ';', type HELP for help.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while let Some(statement) = read_statement(&mut lines)? {
        if let Flow::Exit = handle(&executor, &statement) {
            break;
        }
    }
    println!("Goodbye!");
    Ok(())
}

/// Collects lines until one ends with `;`. A lone EXIT or QUIT needs no
/// terminator. Returns `None` once stdin is exhausted.
fn read_statement(
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> minidb::Result<Option<String>> {
    let mut buffer: Vec<String> = Vec::new();
    loop {
        print!("{}", if buffer.is_empty() { "sql> " } else { "...> " });
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok((!buffer.is_empty()).then(|| buffer.join(" ")));
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let bare_exit = buffer.is_empty() && is_exit(line);
        buffer.push(line.to_string());
        if bare_exit || line.ends_with(';') {
            return Ok(Some(buffer.join(" ")));
        }
    }
}

fn is_exit(command: &str) -> bool {
    command.eq_ignore_ascii_case("EXIT") || command.eq_ignore_ascii_case("QUIT")
}

fn handle(executor: &QueryExecutor, statement: &str) -> Flow {
    let sql = statement.trim().trim_end_matches(';').trim();
    if sql.is_empty() {
        return Flow::Continue;
    }
    if is_exit(sql) {
        return Flow::Exit;
    }

    let upper = sql.to_ascii_uppercase();
    if upper == "HELP" {
        println!("{HELP}");
    } else if upper == "SHOW TABLES" {
        match executor.list_tables() {
            Ok(tables) if tables.is_empty() => println!("No tables found."),
            Ok(tables) => tables.iter().for_each(|t| println!("  {t}")),
            Err(err) => report(&err),
        }
    } else if let Some(table) = describe_target(sql) {
        match executor.describe(table) {
            Ok(schema) => print_json(&schema),
            Err(err) => report(&err),
        }
    } else {
        match executor.execute(sql) {
            Ok(result) => print_result(&result),
            Err(err) => report(&err),
        }
    }
    println!();
    Flow::Continue
}

fn describe_target(sql: &str) -> Option<&str> {
    let (command, table) = sql.split_once(char::is_whitespace)?;
    command
        .eq_ignore_ascii_case("DESCRIBE")
        .then(|| table.trim())
}

fn print_result(result: &QueryResult) {
    if result.rows().is_some() {
        print_json(result);
    } else {
        println!("{}", result.message());
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => report(&DbError::from(err)),
    }
}

fn report(err: &DbError) {
    if err.is_user_error() {
        println!("Error: {err}");
    } else {
        println!("Unexpected error: {err}");
    }
}
