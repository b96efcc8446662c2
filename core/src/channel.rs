use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Add zero-mean Gaussian noise with standard deviation `sigma` to every
/// sample. `sigma <= 0` passes the signal through untouched.
///
/// With a `seed` the noise is reproducible; otherwise it comes from the
/// thread RNG.
pub fn add_noise(samples: &[f32], sigma: f32, seed: Option<u64>) -> Vec<f32> {
    if sigma <= 0.0 {
        return samples.to_vec();
    }

    let normal = match Normal::new(0.0f32, sigma) {
        Ok(normal) => normal,
        Err(err) => {
            log::warn!("Channel noise disabled, invalid sigma {}: {}", sigma, err);
            return samples.to_vec();
        }
    };

    match seed {
        Some(seed) => apply(samples, normal, &mut StdRng::seed_from_u64(seed)),
        None => apply(samples, normal, &mut rand::thread_rng()),
    }
}

fn apply<R: Rng>(samples: &[f32], normal: Normal<f32>, rng: &mut R) -> Vec<f32> {
    samples.iter().map(|&s| s + normal.sample(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sigma_passes_through() {
        let signal = vec![1.0, -1.0, 0.5];
        assert_eq!(add_noise(&signal, 0.0, None), signal);
        assert_eq!(add_noise(&signal, -2.0, Some(1)), signal);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let signal = vec![0.0; 64];
        let a = add_noise(&signal, 0.5, Some(42));
        let b = add_noise(&signal, 0.5, Some(42));
        assert_eq!(a, b);
        assert_ne!(a, signal);
        assert_ne!(add_noise(&signal, 0.5, Some(43)), a);
    }

    #[test]
    fn test_noise_statistics() {
        let signal = vec![0.0; 20_000];
        let noisy = add_noise(&signal, 0.5, Some(7));
        let n = noisy.len() as f32;
        let mean = noisy.iter().sum::<f32>() / n;
        let variance = noisy.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n;

        assert!(mean.abs() < 0.02, "mean {}", mean);
        assert!((variance.sqrt() - 0.5).abs() < 0.02, "std {}", variance.sqrt());
    }

    #[test]
    fn test_nan_sigma_is_ignored() {
        let signal = vec![1.0, 2.0];
        assert_eq!(add_noise(&signal, f32::NAN, None), signal);
    }
}
