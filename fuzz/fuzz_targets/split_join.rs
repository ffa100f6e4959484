//! Fuzz target for shard split/join geometry.
//!
//! Splitting any non-empty buffer and joining the data shards back must
//! reproduce the buffer exactly, for every shard configuration.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tessera_coding::Coder;

#[derive(Debug, Arbitrary)]
struct SplitInput {
    data: Vec<u8>,
    data_shards: u8,
    parity_shards: u8,
}

fuzz_target!(|input: SplitInput| {
    let k = (input.data_shards as usize % 32).max(1);
    let m = input.parity_shards as usize % 16;

    let coder = Coder::new(k, m).unwrap();
    let Ok(mut shards) = coder.split(&input.data) else {
        assert!(input.data.is_empty());
        return;
    };
    assert_eq!(shards.len(), k + m);

    coder.encode(&mut shards).unwrap();
    assert!(coder.verify(&shards).unwrap());

    let maybe: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
    let mut out = vec![0u8; input.data.len()];
    coder.join(&mut out, &maybe, input.data.len()).unwrap();
    assert_eq!(out, input.data);
});
