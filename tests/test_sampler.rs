// tests/test_sampler.rs
// Stratified sampling tests: per-cycle exhaustion, coordinate range and the
// combined per-bounce dimension layout.
// RELEVANT FILES:src/sampler/stratified.rs,src/sampler/combined.rs

use std::collections::HashSet;

use lucent::sampler::stratified::SAMPLE_EPS;
use lucent::sampler::{sampling_dimensions, StratifiedSampler, StratifiedSamplerCombined};

#[test]
fn sixteen_distinct_strata_before_any_repeat() {
    // strata_count = 4, one 2-dimensional group: 16 cells per cycle
    let mut sampler = StratifiedSampler::new(4, 2, 42);

    let mut seen = HashSet::new();
    for _ in 0..16 {
        let s = sampler.next();
        let cell = ((s[0] * 4.0) as u32, (s[1] * 4.0) as u32);
        assert!(cell.0 < 4 && cell.1 < 4);
        assert!(seen.insert(cell), "cell {cell:?} drawn twice in one cycle");
    }
    assert_eq!(seen.len(), 16);
}

#[test]
fn coordinates_live_inside_the_guarded_interval() {
    let mut sampler = StratifiedSampler::new(4, 2, 1234);
    for _ in 0..256 {
        for &c in sampler.next() {
            assert!(
                (SAMPLE_EPS..=1.0 - SAMPLE_EPS).contains(&c),
                "coordinate {c} escaped the guarded unit interval"
            );
        }
    }
}

#[test]
fn cycles_keep_exhausting_after_reshuffle() {
    let mut sampler = StratifiedSampler::new(3, 2, 7);
    for _ in 0..5 {
        let mut seen = HashSet::new();
        for _ in 0..9 {
            let s = sampler.next();
            seen.insert(((s[0] * 3.0) as u32, (s[1] * 3.0) as u32));
        }
        assert_eq!(seen.len(), 9, "a reshuffled cycle missed cells");
    }
}

#[test]
fn bounce_layout_matches_the_kernel_contract() {
    // four 2D decisions per bounce, Russian roulette from the second on
    assert_eq!(sampling_dimensions(2), vec![2, 2, 2, 2, 2, 2, 2, 2, 1]);
    let dims = sampling_dimensions(8);
    assert_eq!(dims.iter().sum::<usize>(), 8 * 8 + 7);
}

#[test]
fn combined_sampler_spans_the_declared_dimensions() {
    let dims = sampling_dimensions(4);
    let total: usize = dims.iter().sum();
    let mut sampler = StratifiedSamplerCombined::new(6, &dims, 99);

    assert_eq!(sampler.dimensions(), total);
    for _ in 0..32 {
        let v = sampler.next();
        assert_eq!(v.len(), total);
        for &c in v {
            assert!(c > 0.0 && c < 1.0);
        }
    }
}

#[test]
fn groups_decorrelate_under_restart() {
    // restarting replays stratum order per group without reshuffling
    let mut sampler = StratifiedSamplerCombined::new(4, &[2, 2], 5);
    let cells = |v: &[f32]| {
        (
            ((v[0] * 4.0) as u32, (v[1] * 4.0) as u32),
            ((v[2] * 4.0) as u32, (v[3] * 4.0) as u32),
        )
    };
    let first = cells(&sampler.next().to_vec());
    sampler.restart();
    let replay = cells(&sampler.next().to_vec());
    assert_eq!(first, replay);
}
