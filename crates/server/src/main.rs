//! The remote debug server: loads a program image into the VM, listens on
//! TCP, and drives one protocol session per accepted connection.

use std::fs;
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use rsp::{Session, Status, TcpTransport, Transport};
use vm::StepOutcome;

mod target;

use target::VmTarget;

/// Remote debug server for the bytecode VM (GDB remote serial protocol).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TCP port to listen on for the debugger
    #[arg(short, long, default_value_t = 1234)]
    port: u16,

    /// Raw program image, loaded at address 0
    #[arg(long)]
    program: Option<PathBuf>,

    /// VM memory size in bytes
    #[arg(long, default_value_t = 64 * 1024)]
    memory: usize,
}

/// Instructions executed per tick while the debugger has us running. Keeps
/// interrupt latency bounded without polling the socket every instruction.
const RUN_SLICE: usize = 4096;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut target = VmTarget::new(args.memory);
    if let Some(path) = &args.program {
        let image = fs::read(path).with_context(|| format!("reading program {:?}", path))?;
        target.load_program(0, &image);
        info!("loaded {} byte program image", image.len());
    }

    let listener = TcpListener::bind(("0.0.0.0", args.port))
        .with_context(|| format!("binding port {}", args.port))?;

    loop {
        info!("listening on port {}", args.port);
        let (stream, peer) = listener.accept().context("accepting debugger connection")?;
        info!("debugger connected from {}", peer);

        let mut transport = TcpTransport::new(stream).context("configuring debugger socket")?;
        let mut session = Session::new();
        session.connect();

        serve(&mut session, &mut target, &mut transport)?;
        transport.close();
        info!("connection finished ({:?})", session.status());
    }
}

/// Drives one connection to completion: poll the wire, and run the VM in
/// slices while the debugger has it resumed.
fn serve(
    session: &mut Session,
    target: &mut VmTarget,
    transport: &mut TcpTransport,
) -> Result<()> {
    loop {
        session
            .poll(target, transport)
            .context("polling debugger connection")?;

        match session.status() {
            Status::Listening | Status::Detached => return Ok(()),
            Status::Running => match run_slice(session, target, transport) {
                Ok(()) => {}
                // The debugger went away while we were notifying it.
                Err(rsp::TransportError::Disconnected) => {
                    session.reset();
                    return Ok(());
                }
                Err(e) => return Err(e).context("sending stop reply"),
            },
            // Halted at the prompt; don't spin the CPU on an idle wire.
            _ => thread::sleep(Duration::from_millis(1)),
        }
    }
}

fn run_slice(
    session: &mut Session,
    target: &mut VmTarget,
    transport: &mut TcpTransport,
) -> Result<(), rsp::TransportError> {
    target.cpu.resume();
    for _ in 0..RUN_SLICE {
        match target.step_outcome() {
            StepOutcome::Ran => {}
            StepOutcome::Break(addr) => {
                session.notify_breakpoint(addr, transport)?;
                break;
            }
            StepOutcome::Halted => {
                info!("program halted at {:#010x}", target.cpu.pc);
                session.notify_stop(rsp::SIGTRAP, transport)?;
                break;
            }
            StepOutcome::Fault(addr) => {
                warn!("memory fault at {:#010x}", addr);
                session.notify_stop(rsp::SIGSEGV, transport)?;
                break;
            }
        }
    }
    Ok(())
}
