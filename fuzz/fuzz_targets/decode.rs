//! Fuzz target for the decode pipeline.
//!
//! Encodes an arbitrary buffer, applies an arbitrary shard-presence mask,
//! and checks that decode either reproduces the input or fails cleanly.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tessera_engine::FragmentService;

#[derive(Debug, Arbitrary)]
struct DecodeInput {
    data: Vec<u8>,
    data_shards: u8,
    parity_shards: u8,
    presence_mask: u32,
    claimed_size: u16,
}

fuzz_target!(|input: DecodeInput| {
    let k = (input.data_shards as usize % 16).max(1);
    let m = input.parity_shards as usize % 8;
    if input.data.is_empty() {
        return;
    }

    let service = FragmentService::new();
    let handle = service.create_instance(k, m).unwrap();

    let (fragment_len, shard_count) = service.encode_compute(handle, &input.data).unwrap();
    let mut buffers = vec![vec![0u8; fragment_len]; shard_count];
    let mut dests: Vec<&mut [u8]> = buffers.iter_mut().map(Vec::as_mut_slice).collect();
    service.encode_copy_out(handle, &mut dests).unwrap();

    let views: Vec<Option<&[u8]>> = buffers
        .iter()
        .enumerate()
        .map(|(i, s)| (input.presence_mask & (1 << (i % 32)) != 0).then_some(s.as_slice()))
        .collect();
    let missing = views.iter().filter(|v| v.is_none()).count();

    // Decode with the true size: must succeed iff the loss is tolerable.
    let mut out = vec![0u8; input.data.len()];
    let result = service.decode(handle, &views, fragment_len, input.data.len(), &mut out);
    if missing <= m {
        assert!(result.is_ok(), "tolerable loss failed: {result:?}");
        assert_eq!(out, input.data);
    } else {
        assert!(result.is_err(), "over-loss decode reported success");
    }

    // Decode with an arbitrary claimed size: must never panic.
    let claimed = input.claimed_size as usize;
    let mut out = vec![0u8; claimed];
    let _ = service.decode(handle, &views, fragment_len, claimed, &mut out);
});
