use std::process::ExitCode;

use mealy_conformance::{prelude::*, render};

use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

use clap::{value_parser, Arg, ArgMatches, Command};

fn cli() -> clap::Command {
    Command::new("mct")
        .about("Mealy machine conformance testing")
        .subcommand_required(true)
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["info", "debug", "trace"])
                .default_missing_value("info")
                .global(true),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .help("JSON definition of the table, read from stdin if absent")
                .global(true),
        )
        .subcommand(Command::new("show").about("prints the transition table"))
        .subcommand(
            Command::new("uio")
                .about("searches unique input/output sequences for all states")
                .arg(
                    Arg::new("max-length")
                        .short('l')
                        .long("max-length")
                        .value_parser(value_parser!(usize))
                        .help("maximal length of the searched sequences, 3 if absent"),
                ),
        )
        .subcommand(Command::new("w").about("builds a discrimination tree following the W-method"))
        .subcommand(
            Command::new("replay")
                .about("runs an input word and prints the produced output")
                .arg(
                    Arg::new("state")
                        .short('s')
                        .long("state")
                        .value_parser(value_parser!(u32))
                        .help("start state, the word is run from every state if absent"),
                )
                .arg(Arg::new("input").short('i').long("input").required(true)),
        )
}

fn setup_logging(matches: &ArgMatches) {
    let filter = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(filter))
        .init();

    trace!("setup logging");
}

fn load(matches: &ArgMatches) -> Result<MealyTable, TableError> {
    match matches.get_one::<String>("file") {
        Some(path) => {
            debug!("reading table from {path}");
            MealyTable::from_json_file(path)
        }
        None => {
            debug!("reading table from stdin");
            MealyTable::from_json_reader(std::io::stdin().lock())
        }
    }
}

pub fn main() -> ExitCode {
    let matches = cli().get_matches();

    setup_logging(&matches);

    let table = match load(&matches) {
        Ok(table) => table,
        Err(e) => {
            error!("could not load table: {e}");
            eprintln!("could not load table: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "loaded table with {} states and {} transitions",
        table.size(),
        table.transition_count()
    );

    match matches.subcommand() {
        Some(("show", _)) => println!("{}", table.render()),
        Some(("uio", sub_matches)) => {
            let max_length = sub_matches
                .get_one::<usize>("max-length")
                .copied()
                .unwrap_or(DEFAULT_MAX_LENGTH);

            let start = std::time::Instant::now();
            let assignment = find_identifying_sequences_with(
                &table,
                &UioConfig::default().with_max_length(max_length),
            );
            info!("search took {}µs", start.elapsed().as_micros());

            println!("{}", render::assignment_table(&assignment));
            println!();
            println!("{}", render::assignment_steps(&table, &assignment));
        }
        Some(("w", _)) => {
            let start = std::time::Instant::now();
            let result = build_discrimination_tree(&table);
            info!("construction took {}µs", start.elapsed().as_micros());

            println!("{}", render::w_result(&result));
        }
        Some(("replay", sub_matches)) => {
            let input = sub_matches
                .get_one::<String>("input")
                .map(|s| s.as_str())
                .unwrap_or_default();

            match sub_matches.get_one::<u32>("state") {
                Some(&state) => {
                    if !table.contains_state(state) {
                        warn!("state {state} is not declared in the table");
                    }
                    match replay(&table, state, input) {
                        Ok(output) => println!("{output}"),
                        Err(stuck) => {
                            eprintln!("{stuck}");
                            return ExitCode::FAILURE;
                        }
                    }
                }
                None => {
                    for (state, outcome) in replay_all(&table, input) {
                        match outcome {
                            Ok(output) => println!("{state}: {output}"),
                            Err(stuck) => println!("{state}: impossible, {stuck}"),
                        }
                    }
                }
            }
        }
        _ => unreachable!(),
    }

    ExitCode::SUCCESS
}
