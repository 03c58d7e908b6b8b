use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Random upper-case genome of `length` bp with GC fraction `gc`.
///
/// The composition is exact (GC count rounded to nearest), only the order is
/// random. `seed == 0` draws a seed from the OS; any other seed reproduces.
pub fn make(length: usize, gc: f64, seed: u64) -> Vec<u8> {
    if length == 0 {
        return Vec::new();
    }
    let gc = if gc.is_nan() { 0.5 } else { gc.clamp(0.0, 1.0) };
    let mut rng = if seed == 0 {
        StdRng::from_os_rng()
    } else {
        StdRng::seed_from_u64(seed)
    };

    let gc_count = ((length as f64 * gc + 0.5) as usize).min(length);
    let mut seq = Vec::with_capacity(length);
    for _ in 0..gc_count {
        seq.push(if rng.random_bool(0.5) { b'G' } else { b'C' });
    }
    for _ in gc_count..length {
        seq.push(if rng.random_bool(0.5) { b'A' } else { b'T' });
    }
    seq.shuffle(&mut rng);
    seq
}
