//! The `savm` command-line front end: argument parsing, subcommand
//! dispatch and console wiring around the `savm`/`savm-asm`/`savm-file`
//! library crates. `main.rs` is deliberately thin — everything testable
//! lives here.

use clap::{App, AppSettings, Arg, SubCommand};
use num_traits::FromPrimitive;
use savm::error::{LoadError, RuntimeError};
use savm::isa::Opcode;
use savm::Vm;
use savm_asm::AssembleError;
use savm_file::CodecError;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("assemble: {0}")]
    Assemble(#[from] AssembleError),

    #[error("codec: {0}")]
    Codec(#[from] CodecError),

    #[error("load: {0}")]
    Load(#[from] LoadError),

    #[error("run: {0}")]
    Run(#[from] RuntimeError),

    #[error("malformed program: opcode field {0} at slot {1} does not name a real opcode")]
    InvalidOpcode(i64, usize),
}

pub fn build_cli() -> App<'static, 'static> {
    let output_arg = Arg::with_name("output")
        .short("o")
        .takes_value(true)
        .value_name("FILE")
        .help("Output file (default depends on subcommand)");

    let decimal_arg = Arg::with_name("decimal")
        .long("decimal")
        .help("Write the machine-code file in decimal rather than binary-text");

    let linebreak_arg = Arg::with_name("linebreak")
        .long("linebreak")
        .help("Separate machine-code pairs with newlines rather than spaces");

    let input_arg = Arg::with_name("INPUT").required(true).index(1);

    App::new("savm")
        .about("Assembler, disassembler and executor for the savm virtual machine")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("asm")
                .about("Assemble a source file into a machine-code file")
                .arg(input_arg.clone())
                .arg(output_arg.clone())
                .arg(decimal_arg.clone())
                .arg(linebreak_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("dis")
                .about("Disassemble a machine-code file into source text")
                .arg(input_arg.clone())
                .arg(output_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("exe")
                .about("Load and run a machine-code file")
                .arg(input_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("Assemble a source file, then run the result directly")
                .arg(input_arg),
        )
}

fn read_to_string(path: &str) -> io::Result<String> {
    fs::read_to_string(Path::new(path))
}

fn decode_program(text: &str) -> Result<Vec<(Opcode, i64)>, CliError> {
    savm_file::read(text)?
        .into_iter()
        .enumerate()
        .map(|(slot, (raw_opcode, operand))| {
            Opcode::from_i64(raw_opcode)
                .map(|op| (op, operand))
                .ok_or(CliError::InvalidOpcode(raw_opcode, slot))
        })
        .collect()
}

pub fn run_asm(input: &str, output: &str, decimal: bool, linebreak: bool) -> Result<(), CliError> {
    let source = read_to_string(input)?;
    let program = savm_asm::assemble(&source, input)?;
    let text = savm_file::write(&program, decimal, linebreak);
    fs::write(output, text)?;
    Ok(())
}

pub fn run_dis(input: &str, output: &str) -> Result<(), CliError> {
    let text = read_to_string(input)?;
    let program = decode_program(&text)?;
    let rendered = savm::disasm::disassemble(program);
    fs::write(output, rendered)?;
    Ok(())
}

pub fn run_exe(input: &str) -> Result<(), CliError> {
    let text = read_to_string(input)?;
    let program = decode_program(&text)?;
    let mut vm = Vm::new();
    vm.load(
        program
            .into_iter()
            .map(|(op, operand)| (num_traits::ToPrimitive::to_i64(&op).unwrap_or(0), operand)),
    )?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input_lock = stdin.lock();
    let mut output_lock = stdout.lock();
    vm.run(&mut input_lock, &mut output_lock)?;
    Ok(())
}

pub fn run_run(input: &str) -> Result<(), CliError> {
    let source = read_to_string(input)?;
    let program = savm_asm::assemble(&source, input)?;
    let mut vm = Vm::new();
    vm.load(
        program
            .into_iter()
            .map(|(op, operand)| (num_traits::ToPrimitive::to_i64(&op).unwrap_or(0), operand)),
    )?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input_lock = stdin.lock();
    let mut output_lock = stdout.lock();
    vm.run(&mut input_lock, &mut output_lock)?;
    Ok(())
}

pub fn main_impl() -> Result<(), CliError> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_env("RUST_LOG")
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        ("asm", Some(sub)) => run_asm(
            sub.value_of("INPUT").unwrap(),
            sub.value_of("output").unwrap_or("a.out"),
            sub.is_present("decimal"),
            sub.is_present("linebreak"),
        ),
        ("dis", Some(sub)) => run_dis(
            sub.value_of("INPUT").unwrap(),
            sub.value_of("output").unwrap_or("dis.min"),
        ),
        ("exe", Some(sub)) => run_exe(sub.value_of("INPUT").unwrap()),
        ("run", Some(sub)) => run_run(sub.value_of("INPUT").unwrap()),
        _ => unreachable!("clap requires a subcommand"),
    }
}

#[cfg(test)]
mod test;
