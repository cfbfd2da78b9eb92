use clap::Parser;
use monkey::runner;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Script file to run; starts the REPL when omitted
    script: Option<String>,

    /// Log debug output from the interpreter pipeline
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Cli::parse();

    let level = if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Warn
    };
    simple_logger::init_with_level(level).unwrap();

    let result = match &args.script {
        Some(path) => runner::run_file(path),
        None => runner::run_prompt(),
    };

    if let Err(error) = result {
        log::error!("{}", error);
        std::process::exit(74);
    }
}
