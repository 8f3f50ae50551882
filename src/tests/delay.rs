use crate::priv_prelude::*;

#[test]
fn same_seed_same_samples() {
    let mut gen_0 = RandomDelayGenerator::normal(5.0, 3.0, 3).unwrap();
    let mut gen_1 = RandomDelayGenerator::normal(5.0, 3.0, 3).unwrap();
    let samples_0: Vec<f64> = (0..100).map(|_| gen_0.sample()).collect();
    let samples_1: Vec<f64> = (0..100).map(|_| gen_1.sample()).collect();
    assert_eq!(samples_0, samples_1);

    let mut gen_2 = RandomDelayGenerator::normal(5.0, 3.0, 4).unwrap();
    let samples_2: Vec<f64> = (0..100).map(|_| gen_2.sample()).collect();
    assert_ne!(samples_0, samples_2);
}

#[test]
fn reseed_restarts_the_stream() {
    let mut gen = RandomDelayGenerator::normal(5.0, 3.0, 7).unwrap();
    let first: Vec<f64> = (0..10).map(|_| gen.sample()).collect();
    gen.reseed(7);
    let second: Vec<f64> = (0..10).map(|_| gen.sample()).collect();
    assert_eq!(first, second);
}

#[test]
fn samples_look_normal() {
    const N: usize = 10_000;
    let mut gen = RandomDelayGenerator::normal(5.0, 3.0, 3).unwrap();
    let samples: Vec<f64> = (0..N).map(|_| gen.sample()).collect();
    let mean = samples.iter().sum::<f64>() / N as f64;
    let variance = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / N as f64;
    assert!((mean - 5.0).abs() < 0.1, "mean = {}", mean);
    assert!((variance - 3.0).abs() < 0.3, "variance = {}", variance);
}

#[test]
fn negative_samples_clamp_to_zero() {
    // mean far below zero, nearly every sample is negative
    let mut gen = RandomDelayGenerator::normal(-100.0, 1.0, 3).unwrap();
    for _ in 0..100 {
        assert!(gen.sample() < 0.0);
    }
    gen.reseed(3);
    for _ in 0..100 {
        assert_eq!(gen.sample_duration(), Duration::ZERO);
    }
}

#[test]
fn constant_and_exponential() {
    let mut gen = RandomDelayGenerator::new(DelayDistribution::Constant(Duration::from_millis(2)), 0).unwrap();
    let nanos = gen.sample_duration().as_nanos() as i64;
    assert!((nanos - 2_000_000).abs() <= 1, "{}ns", nanos);

    let min = Duration::from_millis(3);
    let mut gen = RandomDelayGenerator::new(
        DelayDistribution::Exponential {
            min,
            mean_additional: Duration::from_millis(1),
        },
        0,
    ).unwrap();
    for _ in 0..100 {
        assert!(gen.sample_duration() >= min);
    }
}

#[test]
fn bad_variance() {
    match RandomDelayGenerator::normal(5.0, -1.0, 3) {
        Err(ConfigError::Invalid { name: "delay variance", .. }) => (),
        res => panic!("unexpected result {:?}", res),
    }
    assert!(RandomDelayGenerator::normal(5.0, f64::NAN, 3).is_err());
}
