use capture_serial::cli::{self, Args, CliError, Command};
use capture_serial::config::Config;
use clap::Parser;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn run(args: Args) -> Result<(), CliError> {
    let file_config = Config::load(args.config.as_deref())?;
    let config = args.apply_to(file_config);

    match args.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => cli::serve(&config),
        Command::Grab { output } => {
            let len = cli::grab(&config, &output)?;
            println!("Received {} bytes -> {}", len, output.display());
            Ok(())
        }
        Command::Config { action } => {
            cli::handle_config_action(&action, &config, args.config.as_deref())
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
