use std::io::Cursor;

use deltamem::{Demand, OutputQueue, SourceWindow, WindowConfig, WindowError};

/// Copy `len` source bytes starting at `offset` through the window, the way
/// a decoder applies a copy instruction.
fn copy_from_source<S: deltamem::BlockSource>(
  window: &mut SourceWindow<S>,
  mut offset: u64,
  mut len: usize,
  out: &mut Vec<u8>,
) -> Result<(), WindowError> {
  let block_size = window.block_size() as u64;

  while len > 0 {
    let entry = window.block_at(offset)?;
    let start = (offset % block_size) as usize;
    let data = &entry.data()[start..];
    let n = data.len().min(len);
    if n == 0 {
      return Err(WindowError::SourceExhausted {
        id: entry.id() + 1,
        available: entry.id() + 1,
      });
    }

    out.extend_from_slice(&data[..n]);
    offset += n as u64;
    len -= n;
  }

  Ok(())
}

fn source(len: usize) -> Vec<u8> {
  (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

#[test]
fn monotonic_copies_within_the_window() {
  let data = source(1000);
  let mut window = SourceWindow::new(WindowConfig::new(4, 64), Cursor::new(&data)).unwrap();
  let mut out = Vec::new();

  let copies = [(0, 100), (90, 50), (200, 10), (250, 300), (700, 300)];
  for &(offset, len) in &copies {
    out.clear();
    copy_from_source(&mut window, offset, len, &mut out).unwrap();
    assert_eq!(&out[..], &data[offset as usize..offset as usize + len]);
  }

  match copy_from_source(&mut window, 0, 10, &mut out) {
    Err(WindowError::TooFarBack { id: 0, .. }) => (),
    other => panic!("unexpected {:?}", other),
  }
}

#[test]
fn copies_past_the_end_of_the_source_fail() {
  let data = source(100);
  let mut window = SourceWindow::new(WindowConfig::new(4, 32), Cursor::new(&data)).unwrap();
  let mut out = Vec::new();

  assert!(matches!(
    copy_from_source(&mut window, 90, 20, &mut out),
    Err(WindowError::SourceExhausted { .. })
  ));
  assert!(matches!(
    copy_from_source(&mut window, 200, 1, &mut out),
    Err(WindowError::SourceExhausted { .. })
  ));
}

/// One consumer read: held output first, then as many produced chunks as it
/// takes to satisfy the request.
fn read<F>(queue: &mut OutputQueue, wanted: usize, mut produce: F) -> Vec<u8>
where
  F: FnMut() -> Option<Vec<u8>>,
{
  let mut out = Vec::new();
  let drained = queue.drain(&mut out, Some(wanted)).unwrap();
  let mut demand = Demand::Bytes(wanted - drained);

  while !demand.is_satisfied() {
    let chunk = match produce() {
      Some(chunk) => chunk,
      None => break,
    };
    queue.deliver(&mut out, &chunk, &mut demand).unwrap();
  }

  out
}

#[test]
fn decoded_output_is_spilled_and_drained_in_order() {
  let data = source(4096);
  let mut window = SourceWindow::new(WindowConfig::new(8, 256), Cursor::new(&data)).unwrap();
  let mut queue = OutputQueue::new();
  let mut decoded = Vec::new();
  let mut offset = 0u64;

  // The engine produces 512 byte chunks copied out of the source window
  // while the consumer asks for 300 bytes at a time.
  loop {
    let out = read(&mut queue, 300, || {
      if offset as usize >= data.len() {
        return None;
      }

      let mut chunk = Vec::new();
      copy_from_source(&mut window, offset, 512, &mut chunk).unwrap();
      offset += 512;
      Some(chunk)
    });

    if out.is_empty() {
      break;
    }
    assert!(out.len() == 300 || decoded.len() + out.len() == data.len());
    decoded.extend(out);
  }

  assert_eq!(decoded, data);
  assert_eq!(queue.pending(), 0);
}

#[test]
fn metrics_are_registered() {
  let names: Vec<&str> = metrics::metrics().iter().map(|m| m.name()).collect();

  for name in &[
    "deltamem.cache.hits",
    "deltamem.cache.misses",
    "deltamem.cache.evictions",
    "deltamem.buffer.compactions",
    "deltamem.buffer.pending_bytes",
    "deltamem.window.blocks_read",
    "deltamem.window.too_far_back",
  ] {
    assert!(names.contains(name), "missing metric {}", name);
  }
}
