#[macro_use]
extern crate log;

use std::fs;
use std::path::PathBuf;

use argparse::{ArgumentParser, Parse, ParseOption, Print, StoreFalse, StoreOption, StoreTrue};

use armv4t_core::cpu::arm::instruction::ArmInstruction;
use armv4t_core::{Cpu, GbaMemory, Termination};

struct CmdLineArgs {
    bios_path: Option<PathBuf>,
    rom_path: Option<PathBuf>,
    steps: Option<u64>,
    single_disasm_arm: Option<String>,
    log_file_path: PathBuf,
    verbose: bool,
    colour: bool,
}

impl Default for CmdLineArgs {
    fn default() -> CmdLineArgs {
        CmdLineArgs {
            bios_path: None,
            rom_path: None,
            steps: None,
            single_disasm_arm: None,
            log_file_path: PathBuf::from("./armv4t-core.log"),
            verbose: false,
            colour: true,
        }
    }
}

fn main() {
    let mut args = CmdLineArgs::default();
    parse_command_line(&mut args);
    configure_logging(&args);
    handle_oneshot_commands(&args);
    run_core(&args);
}

fn parse_command_line(args: &mut CmdLineArgs) {
    let mut parser = ArgumentParser::new();
    parser.set_description("An interpretive ARMv4T CPU core for the Game Boy Advance.");
    parser.add_option(
        &["-V", "--version"],
        Print(format!("armv4t-core v{}", env!("CARGO_PKG_VERSION"))),
        "Show current version.",
    );
    parser.refer(&mut args.bios_path).add_option(&["--bios"], ParseOption, "Path to a BIOS image.").metavar("PATH");
    parser.refer(&mut args.rom_path).add_option(&["--rom"], ParseOption, "Path to a cartridge ROM image.").metavar("PATH");
    parser.refer(&mut args.steps).add_option(&["--steps"], ParseOption, "Stop after this many instructions.").metavar("N");
    parser.refer(&mut args.single_disasm_arm).add_option(
        &["--dasm-arm"],
        StoreOption,
        "Print the disassembly of a single ARM state instruction, given as a hex word, and exit.",
    ).metavar("INST");
    parser.refer(&mut args.log_file_path).add_option(&["--log"], Parse, "Custom path for the log file.").metavar("PATH");
    parser.refer(&mut args.verbose).add_option(&["-v", "--verbose"], StoreTrue, "Log extra messages and information.");
    parser.refer(&mut args.colour)
        .add_option(&["-c", "--with-colour"], StoreTrue, "Enable terminal logging with colour codes. (default)")
        .add_option(&["-k", "--without-colour"], StoreFalse, "Disable terminal logging with colour codes.");
    parser.parse_args_or_exit();
}

fn configure_logging(args: &CmdLineArgs) {
    let p = args.log_file_path.as_path();
    armv4t_core::logger::init_with(p, args.verbose, args.colour).unwrap();
    info!("Logging to file `{}`.", p.display());
}

fn handle_oneshot_commands(args: &CmdLineArgs) {
    if let Some(ref x) = args.single_disasm_arm {
        match u32::from_str_radix(x.as_str(), 16) {
            Ok(raw) => match ArmInstruction::decode(raw) {
                Ok(insn) => {
                    println!("{insn}");
                    std::process::exit(0);
                }
                Err(e) => {
                    error!("DASM ARM invalid - {e}");
                    std::process::exit(1);
                }
            },
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        }
    }
}

fn run_core(args: &CmdLineArgs) {
    let bios = args.bios_path.as_ref().map(|p| fs::read(p)).transpose();
    let rom = args.rom_path.as_ref().map(|p| fs::read(p)).transpose();

    let (bios, rom) = match (bios, rom) {
        (Ok(bios), Ok(rom)) => (bios.unwrap_or_default(), rom.unwrap_or_default()),
        (Err(e), _) | (_, Err(e)) => {
            error!("failed to read an input image: {e}");
            std::process::exit(1);
        }
    };

    let mut cpu = Cpu::new(GbaMemory::new(bios, rom));
    cpu.reset();

    let mut steps_taken = 0u64;
    let limit = args.steps;
    let termination = cpu.run(|| {
        steps_taken += 1;
        limit.map(|n| steps_taken > n).unwrap_or(false)
    });

    match termination {
        Termination::Halted => info!("core halted: pc left the mapped address space"),
        Termination::UnhandledInstruction(raw, pc) => warn!("stopped on unhandled instruction {raw:#010X} at pc={pc:#010X}"),
        Termination::Cancelled => info!("stopped after {} instructions (--steps limit reached)", limit.unwrap_or(0)),
    }
}
