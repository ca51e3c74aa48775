use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::test_logger;

/// Runs the test function `iterations` times with a random number generator.
/// The seed is printed so that a failure can be reproduced by setting
/// `RCTERM_SEED=<seed>`.
pub fn random_test<F>(iterations: usize, test_function: F)
where
    F: FnMut(&mut StdRng),
{
    let seed = match std::env::var("RCTERM_SEED") {
        Ok(seed) => {
            let seed = seed.parse::<u64>().expect("RCTERM_SEED must be a valid u64");
            println!("seed: {seed} (fixed by RCTERM_SEED)");
            seed
        }
        Err(_) => {
            let seed: u64 = rand::random();
            println!("random seed: {seed} (use RCTERM_SEED=<seed> to set a fixed seed)");
            seed
        }
    };

    random_test_seeded(seed, iterations, test_function);
}

/// Runs a random test with the given seed.
pub fn random_test_seeded<F>(seed: u64, iterations: usize, mut test_function: F)
where
    F: FnMut(&mut StdRng),
{
    test_logger();

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..iterations {
        test_function(&mut rng);
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_seeded_is_reproducible() {
        let mut first = Vec::new();
        random_test_seeded(7, 10, |rng| first.push(rng.random_range(0..1000u32)));

        let mut second = Vec::new();
        random_test_seeded(7, 10, |rng| second.push(rng.random_range(0..1000u32)));

        assert_eq!(first, second, "The same seed should yield the same sequence");
    }
}
