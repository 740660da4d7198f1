use approx::assert_abs_diff_eq;
use flounce::{
    build_springs, CollisionVolume, Dynamics, Integrator, NoOpStepObserver, Ring, SkirtConfig,
    SkirtGrid, SkirtSimulation, SpringKind, StretchLimits,
};
use glam::{Affine3A, Quat, Vec3};

const NO_VOLUMES: [CollisionVolume; 0] = [];

fn scenario_config() -> SkirtConfig {
    SkirtConfig::new()
        .with_ring(Ring::circle(Vec3::ZERO, 0.5))
        .with_ring(Ring::circle(Vec3::new(0.0, -0.3, 0.0), 0.6))
        .with_segments(8)
        .with_starting_angle(22.5)
}

fn initialized(config: SkirtConfig, root: &Affine3A) -> SkirtSimulation {
    let mut sim = SkirtSimulation::new(config);
    sim.initialize(root).expect("config has rings");
    sim
}

#[test]
fn rest_pose_is_stable() {
    let root = Affine3A::from_translation(Vec3::new(0.0, 1.0, 0.0));
    let mut sim = initialized(scenario_config(), &root);
    let before = sim.grid().unwrap().positions();

    for _ in 0..30 {
        let report = sim.step(&root, &NO_VOLUMES, &mut NoOpStepObserver);
        assert_eq!(report.corrections, 0);
    }

    assert_eq!(sim.grid().unwrap().positions(), before);
}

#[test]
fn critically_tuned_shape_force_returns_to_rest_in_one_step() {
    let rings = [
        Ring::circle(Vec3::ZERO, 0.5),
        Ring::circle(Vec3::new(0.0, -0.3, 0.0), 0.6),
        Ring::circle(Vec3::new(0.0, -0.6, 0.0), 0.7),
    ];
    let root = Affine3A::IDENTITY;
    let mut grid = SkirtGrid::generate(&rings, 8, 22.5, &root);
    let springs = build_springs(&grid);

    // Small, uniform offset so no spring leaves its stretch limit.
    for p in grid.free_particles_mut() {
        p.position += Vec3::new(0.01, -0.02, 0.005);
    }

    let dynamics = Dynamics {
        inertia: 1.0,
        damping: 1.0,
        shape_stiffness: 1.0,
        elasticity: 0.0,
        stretch_limits: StretchLimits::default(),
    };
    Integrator::new(&mut grid, &springs).step(&root, &dynamics, &mut NoOpStepObserver);

    for p in grid.particles() {
        assert!(
            p.position.abs_diff_eq(p.rest_position(&root), 1e-6),
            "particle at {:?} should be back at {:?}",
            p.position,
            p.rest_position(&root)
        );
    }
}

#[test]
fn root_ring_follows_root_exactly() {
    let mut sim = initialized(scenario_config(), &Affine3A::IDENTITY);
    let sphere = [CollisionVolume::sphere(Vec3::new(0.5, 0.0, 0.0), 0.3)];

    for i in 0..60 {
        let t = i as f32 * 0.05;
        let root = Affine3A::from_rotation_translation(
            Quat::from_rotation_y(t) * Quat::from_rotation_x(0.2 * t.sin()),
            Vec3::new(t.sin(), 0.1 * t, t.cos() - 1.0),
        );
        sim.step(&root, &sphere, &mut NoOpStepObserver);

        let grid = sim.grid().unwrap();
        for s in 0..grid.segment_count() {
            let p = grid.particle(0, s);
            assert_eq!(p.position, p.rest_position(&root), "step {} segment {}", i, s);
            assert_eq!(p.velocity, Vec3::ZERO);
        }
    }
}

#[test]
fn anchored_springs_respect_stretch_limit_after_a_jump() {
    let mut sim = initialized(scenario_config(), &Affine3A::IDENTITY);
    let root = Affine3A::from_translation(Vec3::new(0.0, 0.5, 0.0));
    let report = sim.step(&root, &NO_VOLUMES, &mut NoOpStepObserver);
    assert_eq!(report.corrections, 8);

    let grid = sim.grid().unwrap();
    let limits = sim.config().stretch_limits;
    for spring in sim.springs().iter().filter(|s| s.anchor_static) {
        let len = spring.length(grid.particles());
        assert!(
            len <= spring.rest_length * limits.for_kind(spring.kind) + 1e-5,
            "anchored spring {} -> {} has length {} over limit",
            spring.a,
            spring.b,
            len
        );
    }
}

#[test]
fn scenario_single_step_with_raised_root() {
    let mut sim = initialized(scenario_config(), &Affine3A::IDENTITY);
    let root = Affine3A::from_translation(Vec3::new(0.0, 0.1, 0.0));
    let report = sim.step(&root, &NO_VOLUMES, &mut NoOpStepObserver);

    // Shape pull 0.2 * 0.1 plus the anchored vertical spring 0.025 * 0.1
    // lift ring 1 by 0.0225; every vertical then exceeds 1.1x and is clamped.
    assert_eq!(report.corrections, 8);

    let dy = -0.3 + 0.0225 - 0.1;
    let span = (0.01f32 + dy * dy).sqrt();
    let max_len = (0.01f32 + 0.09).sqrt() * 1.1;
    let expected_y = 0.1 + dy * max_len / span;
    let expected_radius = 0.5 + 0.1 * max_len / span;

    let grid = sim.grid().unwrap();
    for s in 0..8 {
        let top = grid.position_at(0, s);
        assert_abs_diff_eq!(top.y, 0.1, epsilon = 1e-6);

        let p = grid.position_at(1, s);
        assert_abs_diff_eq!(p.y, expected_y, epsilon = 1e-4);
        let radius = (p.x * p.x + p.z * p.z).sqrt();
        assert_abs_diff_eq!(radius, expected_radius, epsilon = 1e-4);
    }

    for spring in sim.springs() {
        if spring.kind == SpringKind::Vertical {
            assert_abs_diff_eq!(
                spring.length(grid.particles()),
                spring.rest_length * 1.1,
                epsilon = 1e-5
            );
        }
    }
}

#[test]
fn damping_settles_a_displaced_skirt() {
    let mut sim = initialized(scenario_config(), &Affine3A::IDENTITY);
    let moved = Affine3A::from_translation(Vec3::new(0.4, 0.0, 0.0));
    for _ in 0..400 {
        sim.step(&moved, &NO_VOLUMES, &mut NoOpStepObserver);
    }
    for p in sim.grid().unwrap().particles() {
        assert!(
            p.position.abs_diff_eq(p.rest_position(&moved), 1e-3),
            "particle {:?} did not settle at {:?}",
            p.position,
            p.rest_position(&moved)
        );
    }
}

#[test]
fn stretch_pass_bounds_every_spring_in_the_network() {
    let rings = [
        Ring::circle(Vec3::ZERO, 0.5),
        Ring::circle(Vec3::new(0.0, -0.3, 0.0), 0.6),
        Ring::circle(Vec3::new(0.0, -0.6, 0.0), 0.7),
    ];
    let mut grid = SkirtGrid::generate(&rings, 8, 22.5, &Affine3A::IDENTITY);
    let springs = build_springs(&grid);
    let dynamics = Dynamics::default();
    let limits = dynamics.stretch_limits;
    let mut reference = grid.clone();
    let mut corrections = 0;

    for i in 0..300 {
        // Tilted jumps every 25 steps with a slow spin in between.
        let k = (i / 25) as f32;
        let sign = if (i / 25) % 2 == 0 { 1.0 } else { -1.0 };
        let root = Affine3A::from_rotation_translation(
            Quat::from_rotation_y(0.6 * sign + 0.01 * i as f32) * Quat::from_rotation_x(0.3 * k.sin()),
            Vec3::new(0.2 * k.cos(), 0.1 * (2.0 * k).sin(), 0.0),
        );

        let expected = Integrator::new(&mut reference, &springs).step(&root, &dynamics, &mut NoOpStepObserver);

        grid.drive_kinematic_ring(&root);
        {
            let mut integrator = Integrator::new(&mut grid, &springs);
            integrator.accumulate_shape_forces(&root, dynamics.shape_stiffness);
            integrator.accumulate_elastic_forces(dynamics.elasticity);
            integrator.integrate(dynamics.damping, dynamics.inertia);
        }

        // Each spring is within its limit right after its own turn.
        let mut step_corrections = 0;
        let mut at_turn = Vec::with_capacity(springs.len());
        for spring in &springs {
            let max_len = spring.rest_length * limits.for_kind(spring.kind);
            if spring.limit_stretch(grid.particles_mut(), limits.for_kind(spring.kind)) {
                step_corrections += 1;
            }
            let len = spring.length(grid.particles());
            assert!(
                len <= max_len + 1e-5,
                "step {}: spring {} -> {} is {} after its turn, limit {}",
                i,
                spring.a,
                spring.b,
                len,
                max_len
            );
            let p = grid.particles();
            at_turn.push((p[spring.a].position, p[spring.b].position));
        }

        assert_eq!(step_corrections, expected, "step {}", i);
        assert_eq!(grid.positions(), reference.positions(), "step {}", i);
        corrections += step_corrections;

        // Later corrections may re-stretch a spring only by how far they
        // moved its endpoints.
        let p = grid.particles();
        for (spring, (a, b)) in springs.iter().zip(&at_turn) {
            let max_len = spring.rest_length * limits.for_kind(spring.kind);
            let drift = (p[spring.a].position - *a).length() + (p[spring.b].position - *b).length();
            let len = spring.length(p);
            assert!(
                len <= max_len + drift + 1e-5,
                "step {}: spring {} -> {} is {}, limit {} plus drift {}",
                i,
                spring.a,
                spring.b,
                len,
                max_len,
                drift
            );
        }
    }

    assert!(corrections > 0, "root motion never triggered the stretch limits");
}
