use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use regsync::{
    config::SyncConfig,
    registers::{canonicalize, name::name_of, name::all_names},
    RegSyncError, RegisterStore, Result, SessionController,
};
use std::path::Path;

const DEFAULT_SESSION: &str = "regsync";

fn main() -> Result<()> {
    env_logger::init();

    let register_arg = Arg::with_name("register")
        .short("r")
        .long("register")
        .value_name("REGISTER")
        .help("Register name (a-z, A-Z or \")")
        .default_value("\"")
        .takes_value(true);

    let matches = App::new("regsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Shared register synchronization tool")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("session")
                .short("s")
                .long("session")
                .value_name("NAME")
                .help("Session name shared by cooperating processes")
                .default_value(DEFAULT_SESSION)
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("dir")
                .short("d")
                .long("dir")
                .value_name("DIR")
                .help("Directory holding the mutex and region files")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("test_mode")
                .long("test-mode")
                .help("Use small region sizes and print errors as plain lines")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("append")
                .about("Append paths to a register")
                .arg(register_arg.clone())
                .arg(
                    Arg::with_name("paths")
                        .value_name("PATH")
                        .help("Paths to append")
                        .required(true)
                        .multiple(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List registers, most recent entries first")
                .arg(
                    Arg::with_name("registers")
                        .value_name("REGISTERS")
                        .help("Register names in output order (default: all)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("clear")
                .about("Clear a register")
                .arg(register_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("copy")
                .about("Copy a register into the unnamed register")
                .arg(register_arg),
        )
        .subcommand(
            SubCommand::with_name("rename")
                .about("Replace a path in every register")
                .arg(Arg::with_name("old").value_name("OLD").required(true))
                .arg(Arg::with_name("new").value_name("NEW").required(true)),
        )
        .subcommand(
            SubCommand::with_name("prune")
                .about("Drop entries under a trash directory that no longer exist")
                .arg(
                    Arg::with_name("trash")
                        .value_name("TRASH_DIR")
                        .help("Trash directory")
                        .required(true),
                ),
        )
        .subcommand(SubCommand::with_name("dump").about("Print local and shared register state"))
        .subcommand(SubCommand::with_name("info").about("Show version and object locations"))
        .get_matches();

    let mut config = SyncConfig::from_env();
    if let Some(dir) = matches.value_of("dir") {
        config = config.with_object_dir(dir);
    }
    let mut controller = SessionController::new(config);
    if matches.is_present("test_mode") {
        controller.enable_test_mode(std::io::stderr());
    }
    let session = matches.value_of("session").unwrap_or(DEFAULT_SESSION);

    match matches.subcommand() {
        ("info", Some(_)) => show_info(&controller, session),
        (command, Some(sub_matches)) => run_command(&mut controller, session, command, sub_matches),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

/// Enable, refresh, run one command, publish when it changed something
fn run_command(
    controller: &mut SessionController,
    session: &str,
    command: &str,
    matches: &ArgMatches,
) -> Result<()> {
    let mut store = RegisterStore::new();
    controller.enable(session, &store)?;
    controller.refresh(&mut store)?;

    let mutated = match command {
        "append" => {
            let register = parse_register(matches)?;
            for path in matches.values_of("paths").into_iter().flatten() {
                if let Err(e) = store.try_append(register, path) {
                    eprintln!("{}", e);
                }
            }
            true
        }
        "list" => {
            let names: String = match matches.value_of("registers") {
                Some(names) => names.chars().filter_map(|c| canonicalize(c).and_then(name_of)).collect(),
                None => all_names().collect(),
            };
            for line in store.list(&names) {
                println!("{}", line);
            }
            false
        }
        "clear" => {
            store.clear(parse_register(matches)?);
            true
        }
        "copy" => {
            store.copy_into_unnamed(parse_register(matches)?);
            true
        }
        "rename" => {
            let old = matches.value_of("old").unwrap_or_default();
            let new = matches.value_of("new").unwrap_or_default();
            store.rename_contents(old, new);
            true
        }
        "prune" => {
            let trash = matches.value_of("trash").unwrap_or_default();
            store.remove_stale_trashed_entries(Path::new(trash));
            true
        }
        "dump" => {
            print!("{}", controller.dump(&store)?);
            false
        }
        _ => false,
    };

    if mutated {
        controller.publish(&store)?;
    }
    controller.disable();
    Ok(())
}

fn parse_register(matches: &ArgMatches) -> Result<char> {
    let value = matches.value_of("register").unwrap_or("\"");
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(name), None) => canonicalize(name)
            .and_then(name_of)
            .ok_or_else(|| RegSyncError::invalid_register(name, "no such register")),
        _ => Err(RegSyncError::invalid_parameter(
            "register",
            "Register name must be a single character",
        )),
    }
}

fn show_info(controller: &SessionController, session: &str) -> Result<()> {
    let config = controller.config();
    let names = regsync::ObjectNames::derive(session, &config.object_dir())?;

    println!("regsync - Shared Register Synchronization");
    println!("Version: {}", regsync::VERSION);
    println!("\nSession: {}", session);
    println!("  Mutex:  {}", names.mutex_path.display());
    println!("  Region: {}", names.region_path.display());
    println!("\nLimits:");
    println!("  Initial size: {} bytes", config.initial_size);
    println!("  Maximum size: {} bytes", config.max_size);
    println!("  Header size:  {} bytes", regsync::HEADER_SIZE);

    Ok(())
}
