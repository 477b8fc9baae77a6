//! Weight initialisation.

use ndarray::{ArrayD, IxDyn};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use rand_xorshift::XorShiftRng;
use segraph_core::{Error, Result};

/// Glorot/Xavier uniform initialisation.
///
/// Samples from `U(-s, s)` with `s = sqrt(6 / (fan_in + fan_out))`, where the
/// fans are the last two dimensions of `shape`. A 1-d shape uses
/// `s = sqrt(6 / shape[0])`.
///
/// # Reference
///
/// Glorot & Bengio, "Understanding the difficulty of training deep
/// feedforward neural networks", AISTATS 2010.
pub fn glorot_init<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Result<ArrayD<f32>> {
    let scale = glorot_scale(shape)?;
    log::trace!("glorot_init shape={shape:?} scale={scale}");
    let dist = Uniform::new_inclusive(-scale, scale);
    Ok(ArrayD::from_shape_simple_fn(IxDyn(shape), || dist.sample(rng)))
}

/// [`glorot_init`] with a seeded generator, e.g. `config.seed`.
pub fn glorot_init_seeded(shape: &[usize], seed: u64) -> Result<ArrayD<f32>> {
    let mut rng = XorShiftRng::seed_from_u64(seed);
    glorot_init(shape, &mut rng)
}

fn glorot_scale(shape: &[usize]) -> Result<f32> {
    let fan = match shape {
        [] => return Err(Error::EmptyInput("glorot_init needs at least one dimension")),
        [n] => *n,
        [.., fan_in, fan_out] => fan_in + fan_out,
    };
    if fan == 0 {
        return Err(Error::EmptyInput("glorot_init fan is zero"));
    }
    Ok((6.0 / fan as f32).sqrt())
}
