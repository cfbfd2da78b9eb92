use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use encoding_rs::UTF_8;
use encoding_rs_io::DecodeReaderBytesBuilder;
use log::debug;

use crate::environment::{Env, Environment};
use crate::evaluator::eval;
use crate::lexer::Lexer;
use crate::object::Value;
use crate::parser::{Parser, ParserError};

const PROMPT: &str = ">> ";

enum RunOutcome {
    ParseFailed(Vec<ParserError>),
    Evaluated(Value),
}

fn run(source: &str, env: &Env) -> RunOutcome {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        return RunOutcome::ParseFailed(parser.errors().to_vec());
    }
    debug!("parsed {} top-level statements", program.statements.len());
    RunOutcome::Evaluated(eval(&program, env))
}

/// Run a script to completion. A program that fails to parse exits with 65,
/// one that evaluates to an error value with 70.
pub fn run_file(path: &str) -> io::Result<()> {
    let source = read_source(path)?;
    let env = Environment::new_global();
    match run(&source, &env) {
        RunOutcome::ParseFailed(errors) => {
            eprintln!("parser errors:");
            for error in &errors {
                eprintln!("\t{}", error);
            }
            process::exit(65);
        }
        RunOutcome::Evaluated(Value::Error(message)) => {
            eprintln!("ERROR: {}", message);
            process::exit(70);
        }
        RunOutcome::Evaluated(_) => Ok(()),
    }
}

/// Line-at-a-time prompt. One environment serves the whole session so
/// bindings from earlier lines stay visible.
pub fn run_prompt() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let env = Environment::new_global();

    loop {
        write!(stdout, "{}", PROMPT)?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            // EOF or Ctrl-D
            return Ok(());
        }

        match run(&line, &env) {
            RunOutcome::ParseFailed(errors) => print_parser_errors(&errors),
            RunOutcome::Evaluated(value) => println!("{}", value.inspect()),
        }
    }
}

fn print_parser_errors(errors: &[ParserError]) {
    println!("Woops! We ran into some monkey business here!");
    println!(" parser errors:");
    for error in errors {
        println!("\t{}", error);
    }
}

// BOM-aware decode; malformed sequences are replaced rather than rejected
fn read_source(path: &str) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = DecodeReaderBytesBuilder::new()
        .encoding(Some(UTF_8))
        .bom_override(true)
        .build(file);
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    Ok(source)
}
