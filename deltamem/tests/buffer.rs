use std::collections::VecDeque;

use deltamem::{StreamBuffer, MIN_WASTE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn fifo_across_growth_and_compaction() {
  for seed in 0..10 {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut buffer = StreamBuffer::new();
    let mut model = VecDeque::new();
    let mut counter = 0u8;

    for _ in 0..400 {
      if rng.gen_bool(0.55) {
        let len = rng.gen_range(0..3 * MIN_WASTE);
        let chunk: Vec<u8> = (0..len)
          .map(|_| {
            counter = counter.wrapping_add(1);
            counter
          })
          .collect();

        buffer.append(&chunk).unwrap();
        model.extend(chunk);
      } else {
        let mut dest = vec![0; rng.gen_range(0..4 * MIN_WASTE)];
        let taken = buffer.take(&mut dest);

        assert_eq!(taken, dest.len().min(model.len()));
        let expected: Vec<u8> = model.drain(..taken).collect();
        assert_eq!(&dest[..taken], &expected[..], "seed {}", seed);
      }

      assert_eq!(buffer.remaining(), model.len());
      assert_eq!(buffer.unconsumed().len(), model.len());
    }
  }
}

#[test]
fn drained_buffer_behaves_as_new() {
  let mut buffer = StreamBuffer::new();
  buffer.append(&vec![1; 3 * MIN_WASTE]).unwrap();

  let mut dest = vec![0; 3 * MIN_WASTE];
  assert_eq!(buffer.take(&mut dest), 3 * MIN_WASTE);
  assert_eq!(buffer.remaining(), 0);
  assert!(buffer.unconsumed().is_empty());

  buffer.append(b"fresh").unwrap();
  assert_eq!(buffer.unconsumed(), b"fresh");
  assert_eq!(buffer.remaining(), 5);
}
