use std::io::Write;

use kestrel::engine::{protocol, LoopExit, StdinChannel};
use kestrel::Engine;

fn main() {
    let mut engine = Engine::new();
    let mut input = StdinChannel::spawn();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match protocol::run(&mut engine, &mut input, &mut out) {
        Ok(LoopExit::Quit) => {}
        Ok(LoopExit::BadMove) => std::process::exit(1),
        Err(err) => {
            let _ = writeln!(std::io::stderr(), "io error: {err}");
            std::process::exit(1);
        }
    }
}
