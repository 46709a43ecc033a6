//! Integration tests for the scatterer geometry layer.

use std::sync::Arc;

use approx::assert_relative_eq;
use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

use holofit::scatterer::{find_bounds, IndicatorFn};
use holofit::{CenteredScatterer, Diagnostics, Indicators, ParamTree, Parameter, Sphere, Spheres};

fn ellipsoid(a: f64, b: f64, c: f64) -> IndicatorFn {
    Arc::new(move |points: &ArrayView2<f64>| {
        points
            .rows()
            .into_iter()
            .map(|p| {
                let x = p[0] / a;
                let y = p[1] / b;
                let z = p[2] / c;
                x * x + y * y + z * z < 1.0
            })
            .collect()
    })
}

#[test]
fn find_bounds_handles_anisotropic_domains() {
    let bound = find_bounds(&ellipsoid(1.0e-6, 2.0e-6, 0.5e-6));
    let semi_axes = [1.0e-6, 2.0e-6, 0.5e-6];
    for (axis, &semi) in semi_axes.iter().enumerate() {
        assert!(bound[axis][0] < -semi && bound[axis][0] > -1.2 * semi);
        assert!(bound[axis][1] > semi && bound[axis][1] < 1.2 * semi);
    }
}

#[test]
fn computed_bounds_feed_voxelation() {
    // no bound supplied: Indicators computes one by search
    let indicators = Indicators::new(vec![ellipsoid(1.0e-6, 1.0e-6, 1.0e-6)]);
    let scatterer = holofit::Scatterer::new(
        indicators,
        vec![Complex64::new(1.5, 0.0)],
        nalgebra::Vector3::zeros(),
    )
    .unwrap();

    let medium = Complex64::new(1.33, 0.0);
    let voxels = scatterer.voxelate(0.25e-6, medium).unwrap();
    let (nx, ny, nz) = voxels.dim();
    assert!(nx >= 8 && ny >= 8 && nz >= 8);

    // the grid contains both scatterer and medium voxels
    let total = nx * ny * nz;
    let inside = voxels.iter().filter(|&&v| v == Complex64::new(1.5, 0.0)).count();
    assert!(inside > 0 && inside < total);
}

#[test]
fn sphere_cluster_classifies_and_voxelates() {
    let n = Complex64::new(1.59, 0.0);
    let cluster = Spheres::new(vec![
        Sphere::new(n, 0.5e-6, [-0.6e-6, 0.0, 0.0]).unwrap(),
        Sphere::new(Complex64::new(1.33, 0.0), 0.5e-6, [0.6e-6, 0.0, 0.0]).unwrap(),
    ])
    .unwrap();
    let geometry = cluster.geometry();

    let points = Array2::from_shape_vec(
        (3, 3),
        vec![-0.6e-6, 0.0, 0.0, 0.6e-6, 0.0, 0.0, 0.0, 2.0e-6, 0.0],
    )
    .unwrap();
    let domains = geometry.in_domain(&points).unwrap();
    assert_eq!(domains.to_vec(), vec![1, 2, 0]);

    let index = geometry
        .index_at(&points, Complex64::new(1.0, 0.0))
        .unwrap();
    assert_eq!(index[0], n);
    assert_eq!(index[1], Complex64::new(1.33, 0.0));
    assert_eq!(index[2], Complex64::new(1.0, 0.0));
}

#[test]
fn cluster_transformations_compose() {
    let n = Complex64::new(1.59, 0.0);
    let cluster = Spheres::new(vec![
        Sphere::new(n, 0.3e-6, [0.0, 0.0, 0.0]).unwrap(),
        Sphere::new(n, 0.3e-6, [1.0e-6, 0.0, 0.0]).unwrap(),
    ])
    .unwrap();

    let moved = cluster
        .rotated(std::f64::consts::FRAC_PI_2, 0.0, 0.0)
        .translated(0.0, 0.0, 1.0e-6);

    // rigid motion preserves the pair distance
    let distance =
        (moved.spheres()[0].center() - moved.spheres()[1].center()).norm();
    assert_relative_eq!(distance, 1.0e-6, max_relative = 1e-12);

    // a quarter turn about z maps the x offset onto y
    let offset = moved.spheres()[1].center() - moved.spheres()[0].center();
    assert_relative_eq!(offset.y.abs(), 1.0e-6, max_relative = 1e-9);
    assert!(offset.x.abs() < 1e-12);
}

#[test]
fn overlapping_cluster_reports_through_the_sink() {
    let n = Complex64::new(1.59, 0.0);
    let cluster = Spheres::new(vec![
        Sphere::new(n, 0.5e-6, [0.0, 0.0, 0.0]).unwrap(),
        Sphere::new(n, 0.5e-6, [0.6e-6, 0.0, 0.0]).unwrap(),
    ])
    .unwrap();

    let mut diagnostics = Diagnostics::new();
    let overlaps = cluster.check_overlaps(&mut diagnostics);
    assert_eq!(overlaps, vec![(0, 1)]);
    assert_eq!(diagnostics.messages().len(), 1);

    // overlapping geometry is still well defined: the earlier sphere wins
    let geometry = cluster.geometry();
    let points = Array2::from_shape_vec((1, 3), vec![0.3e-6, 0.0, 0.0]).unwrap();
    assert_eq!(geometry.in_domain(&points).unwrap()[0], 1);
}

#[test]
fn parametrization_round_trips_through_fittable_slots() {
    let sphere = Sphere::new(Complex64::new(1.59, 0.01), 0.5e-6, [1.0e-6, -1.0e-6, 5.0e-6])
        .unwrap();

    // concrete round trip
    let rebuilt = Sphere::from_parameters(&sphere.parameters()).unwrap();
    assert_eq!(rebuilt, sphere);

    // swap the radius slot for a fittable parameter and resolve its guess
    let mut params = sphere.parameters();
    params.insert(
        "r".to_string(),
        ParamTree::Value(Parameter::with_guess("r", 0.7e-6).into()),
    );
    let guessed = Sphere::from_parameters(&params).unwrap();
    assert_relative_eq!(guessed.r(), 0.7e-6);

    // cluster round trip nests sphere mappings in a sequence
    let cluster = Spheres::new(vec![sphere.clone(), sphere.translated(2.0e-6, 0.0, 0.0)])
        .unwrap();
    let rebuilt = Spheres::from_parameters(&cluster.parameters()).unwrap();
    assert_eq!(rebuilt, cluster);
}
