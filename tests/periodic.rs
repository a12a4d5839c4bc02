use vorovox::{AssignmentMethod, DiscreteVoronoi, PeriodicImages, TessellationConfigBuilder, random_seeds};

/// Random seeds snapped to multiples of 1/1024, so whole-domain translations
/// and wrapping are exact in floating point.
fn dyadic_seeds(count: usize, size: &[f64], rng_seed: u64) -> Vec<Vec<f64>> {
    random_seeds(count, size, rng_seed)
        .into_iter()
        .map(|seed| seed.into_iter().map(|c| (c * 1024.0).floor() / 1024.0).collect())
        .collect()
}

fn labels(seeds: &[Vec<f64>], resolution: &[usize], size: &[f64], method: AssignmentMethod) -> Vec<usize> {
    let config = TessellationConfigBuilder::new()
        .resolution(resolution)
        .size(size)
        .periodic(true)
        .method(method)
        .build()
        .unwrap();
    DiscreteVoronoi::new(seeds, &config).unwrap().into_labels().into_vec()
}

#[test]
fn test_translation_by_domain_step_2d() {
    let size = [1.0, 2.0];
    let seeds = dyadic_seeds(15, &size, 9);
    let reference = labels(&seeds, &[32, 64], &size, AssignmentMethod::BruteForce);

    for axis in 0..2 {
        for step in [-1.0, 1.0, 2.0] {
            let mut moved = seeds.clone();
            moved[4][axis] += step * size[axis];
            assert_eq!(
                labels(&moved, &[32, 64], &size, AssignmentMethod::BruteForce),
                reference,
                "axis {} step {}",
                axis,
                step
            );
        }
    }
}

#[test]
fn test_translation_by_domain_step_3d() {
    let size = [1.0, 1.0, 1.0];
    let seeds = dyadic_seeds(10, &size, 13);

    for method in [AssignmentMethod::BruteForce, AssignmentMethod::Binned] {
        let reference = labels(&seeds, &[12, 12, 12], &size, method);
        for axis in 0..3 {
            let mut moved = seeds.clone();
            moved[0][axis] += size[axis];
            assert_eq!(labels(&moved, &[12, 12, 12], &size, method), reference, "{:?} axis {}", method, axis);
        }
    }
}

#[test]
fn test_regions_wrap_across_faces() {
    // One seed sits close to the left face; it must own the voxels at the right face.
    let seeds = vec![vec![0.03125, 0.5], vec![0.5, 0.5]];
    let labels = labels(&seeds, &[16, 4], &[1.0, 1.0], AssignmentMethod::BruteForce);
    for row in labels.chunks(16) {
        assert_eq!(row[0], 0);
        assert_eq!(row[15], 0);
        assert_eq!(row[8], 1);
    }
}

#[test]
fn test_image_table() {
    let seeds = [0.25, 0.5, 0.5, 0.75, 0.5, 0.25];
    let images = PeriodicImages::new(&seeds, &[1.0, 1.0, 1.0]);

    assert_eq!(images.dimension(), 3);
    assert_eq!(images.len(), 27 * 2);
    // Every replica differs from its base seed by a whole number of domain steps.
    for (replica, &base) in images.points().chunks(3).zip(images.mapping()) {
        for d in 0..3 {
            let delta = replica[d] - seeds[base * 3 + d];
            assert!(delta == -1.0 || delta == 0.0 || delta == 1.0);
        }
    }
}
