// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! View sampling properties

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use viewmetrics::sampling::{adaptive_fov_deg, ViewSampler};

#[test]
fn test_regular_layout_is_deterministic() {
    for count in [2, 3, 16, 64, 257] {
        let sampler = ViewSampler::new(count, 2.0, 16.0 / 9.0);
        let a = sampler.generate_regular();
        let b = sampler.generate_regular();

        assert_eq!(a.len(), count);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.view, y.view);
            assert_eq!(x.projection, y.projection);
        }

        let first = &a[0];
        let last = &a[count - 1];
        assert_relative_eq!(first.position.y / 2.0, 1.0, epsilon = 1e-5);
        assert_relative_eq!(last.position.y, 0.0, epsilon = 1e-5);
    }
}

#[test]
fn test_positions_on_sphere() {
    let views = ViewSampler::new(32, 3.5, 1.0).generate_regular();
    for (i, view) in views.iter().enumerate() {
        assert_eq!(view.index, i);
        assert_relative_eq!(view.position.norm(), 3.5, epsilon = 1e-4);
        assert!(view.position.y >= -1e-5);
    }
}

#[test]
fn test_zero_jitter_matches_regular() {
    let sampler = ViewSampler::new(10, 2.0, 1.0);
    let mut rng = StdRng::seed_from_u64(1);
    let jittered = sampler.generate(&mut rng);
    let regular = sampler.generate_regular();
    for (a, b) in jittered.iter().zip(regular.iter()) {
        assert_eq!(a.position, b.position);
    }
}

#[test]
fn test_jitter_stays_in_upper_hemisphere() {
    let sampler = ViewSampler::new(64, 2.0, 1.0).with_jitter(0.3);
    let mut rng = StdRng::seed_from_u64(99);
    for view in sampler.generate(&mut rng) {
        assert!(view.position.y > 0.0);
        assert_relative_eq!(view.position.norm(), 2.0, epsilon = 1e-4);
    }
}

#[test]
fn test_seeded_jitter_reproducible() {
    let sampler = ViewSampler::new(20, 2.0, 1.0).with_jitter(0.2);
    let a = sampler.generate(&mut StdRng::seed_from_u64(5));
    let b = sampler.generate(&mut StdRng::seed_from_u64(5));
    let c = sampler.generate(&mut StdRng::seed_from_u64(6));

    assert!(a.iter().zip(b.iter()).all(|(x, y)| x.view == y.view));
    assert!(a.iter().zip(c.iter()).any(|(x, y)| x.position != y.position));
}

#[test]
fn test_field_of_view_encloses_model() {
    assert_relative_eq!(adaptive_fov_deg(1.0, 2.0), 60.0, epsilon = 1e-4);
    assert_relative_eq!(adaptive_fov_deg(1.0, 0.5), 90.0);
    assert_relative_eq!(
        ViewSampler::new(1, 2.0, 1.0).field_of_view_deg(),
        65.0,
        epsilon = 1e-4
    );
}
