//! Walk a file through a `SourceWindow` the way a delta decoder would and
//! report what the cache did.
//!
//! ```text
//! DELTAMEM_LOG=trace DELTAMEM_BLOCK_SIZE=4096 cargo run --example scan -- <file> [stride]
//! ```
//!
//! Every `stride` bytes the scan also looks back at the block before the
//! current one, so a small window will report blocks that are too far back.

#[macro_use]
extern crate log;

use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Write};

use deltamem::{Demand, OutputQueue, SourceWindow, WindowConfig, WindowError};

/// Bytes of report handed to stdout per step. Longer reports queue up.
const REPORT_BUDGET: usize = 48;

fn main() -> Result<(), Box<dyn Error>> {
  if std::env::var_os("DELTAMEM_LOG").is_none() {
    std::env::set_var("DELTAMEM_LOG", "info");
  }
  env_logger::init_from_env("DELTAMEM_LOG");

  let mut args = std::env::args().skip(1);
  let path = match args.next() {
    Some(path) => path,
    None => return Err("usage: scan <file> [stride]".into()),
  };
  let stride: u64 = match args.next() {
    Some(stride) => stride.parse()?,
    None => 4096,
  };
  if stride == 0 {
    return Err("stride must be greater than zero".into());
  }

  let config = WindowConfig::from_env()?;
  info!(
    "Scanning {} through {} blocks of {} bytes",
    path, config.blocks, config.block_size
  );

  let block_size = config.block_size as u64;
  let mut window = SourceWindow::new(config, BufReader::new(File::open(&path)?))?;
  let mut queue = OutputQueue::new();
  let stdout = io::stdout();
  let mut stdout = stdout.lock();
  let mut report = Vec::new();

  let mut offset = 0u64;
  let mut lookbacks_missed = 0u64;
  loop {
    let id = offset / block_size;
    let byte = match window.block(id) {
      Ok(entry) => match entry.data().get((offset % block_size) as usize) {
        Some(&byte) => byte,
        None => break,
      },
      Err(WindowError::SourceExhausted { available, .. }) => {
        info!("Source ended after {} blocks", available);
        break;
      }
      Err(e) => return Err(e.into()),
    };

    if id > 0 {
      match window.block(id - 1) {
        Ok(_) => (),
        Err(WindowError::TooFarBack { .. }) => lookbacks_missed += 1,
        Err(e) => return Err(e.into()),
      }
    }

    report.clear();
    queue.drain(&mut report, Some(REPORT_BUDGET))?;
    let mut demand = Demand::Bytes(REPORT_BUDGET - report.len());
    stdout.write_all(&report)?;

    let line = format!("block {:>8} offset {:>12} byte {:02x}\n", id, offset, byte);
    queue.deliver(&mut stdout, line.as_bytes(), &mut demand)?;

    offset += stride;
  }

  report.clear();
  queue.drain(&mut report, None)?;
  stdout.write_all(&report)?;
  stdout.flush()?;

  info!(
    "Read {} blocks, {} look-backs fell outside the window",
    window.next_unread(),
    lookbacks_missed
  );
  for entry in metrics::metrics() {
    info!("{} = {:?}", entry.name(), entry.value());
  }

  Ok(())
}
