#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use homecat::*;
use std::process;

fn print_error_debug(e: &Error) {
    // unwind the error chain
    for e in e.iter().skip(1) {
        warn!("caused by: {}", e);
    }
}

fn main() {
    let app = App::new("homecat")
        .version(crate_version!())
        .setting(AppSettings::VersionlessSubcommands)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .setting(AppSettings::ColoredHelp)
        .setting(AppSettings::DeriveDisplayOrder)
        .global_settings(&[AppSettings::ColoredHelp])
        .about("Declarative homelab workloads to kubernetes manifests")
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .global(true)
            .help("Increase verbosity"))
        .arg(Arg::with_name("debug")
            .short("d")
            .long("debug")
            .global(true)
            .help("Adds line numbers to log statements"))
        .arg(Arg::with_name("config")
            .short("c")
            .long("config")
            .takes_value(true)
            .global(true)
            .help("Config file to use (defaults to $HOMECAT_CONFIG or ./homecat.yml)"))
        .subcommand(SubCommand::with_name("generate")
            .arg(Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("Output file to save to"))
            .about("Generate manifests for every workload"))
        .subcommand(SubCommand::with_name("list")
            .about("List workloads with their scope paths"))
        .subcommand(SubCommand::with_name("show")
            .arg(Arg::with_name("workload")
                .required(true)
                .help("Workload name or full scope path"))
            .about("Show the effective spec of a workload"));

    // arg parse
    let args = app.get_matches();
    let name = args.subcommand_name().unwrap_or("homecat");
    let _ = run(&args).map_err(|e| {
        error!("{} error: {}", name, e);
        print_error_debug(&e);
        process::exit(1);
    });
    process::exit(0);
}

fn run(args: &ArgMatches) -> Result<()> {
    // always show INFO messages (+1)
    loggerv::Logger::new()
        .verbosity(args.occurrences_of("verbose") + 1)
        .module_path(true)
        .line_numbers(args.is_present("debug"))
        .init()
        .map_err(|e| Error::from(format!("failed to initialise logging: {}", e)))?;

    // Ignore SIGPIPE errors to avoid having to use let _ = write! everywhere
    // See https://github.com/rust-lang/rust/issues/46016
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    dispatch_commands(args)
}

fn dispatch_commands(args: &ArgMatches) -> Result<()> {
    if let Some(a) = args.subcommand_matches("generate") {
        let conf = Config::read(a.value_of("config"))?;
        return homecat::generate::generate(&conf, a.value_of("output"));
    }
    else if let Some(a) = args.subcommand_matches("list") {
        let conf = Config::read(a.value_of("config"))?;
        return homecat::list::workloads(&conf);
    }
    else if let Some(a) = args.subcommand_matches("show") {
        let conf = Config::read(a.value_of("config"))?;
        // required arg
        let workload = a.value_of("workload").unwrap_or_default();
        return homecat::show::workload(&conf, workload);
    }
    unreachable!("Subcommand valid, but not implemented");
}
