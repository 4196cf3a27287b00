use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use turbo_collage::layout::generator::uniform_grid;
use turbo_collage::layout::validator::{is_allowed_ratio, validate};
use turbo_collage::layout::*;

fn assert_partition(blocks: &[Block], rows: usize, cols: usize) {
    let mut seen = HashSet::new();
    for block in blocks {
        assert!(block.w >= 1 && block.h >= 1);
        assert!(block.x + block.w <= cols, "{:?} overflows {} cols", block, cols);
        assert!(block.y + block.h <= rows, "{:?} overflows {} rows", block, rows);
        for cell in block.cells() {
            assert!(seen.insert(cell), "cell {:?} covered twice", cell);
        }
    }
    assert_eq!(seen.len(), rows * cols);
}

#[test]
fn test_shape_placer_covers_every_grid() {
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        for rows in 1..=10 {
            for cols in 1..=10 {
                let blocks = ShapePlacer::place(rows, cols, &mut rng);
                assert_partition(&blocks, rows, cols);
            }
        }
    }
}

#[test]
fn test_validated_layouts_use_legal_aspects() {
    let generator = LayoutGenerator::new(LayoutConstraints::default(), 100);
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = generator.generate_validated(4, 4, &mut rng);
        assert_partition(&layout.blocks, 4, 4);

        if let LayoutSource::Validated { score, .. } = layout.source {
            assert!(score >= 70);
            assert!(layout.blocks.iter().all(|b| is_allowed_ratio(b.aspect())));
            assert!(validate(&layout.blocks, generator.constraints()).is_valid);
        }
    }
}

#[test]
fn test_zero_attempts_is_deterministic_uniform() {
    let generator = LayoutGenerator::new(LayoutConstraints::default(), 0);
    let mut first = StdRng::seed_from_u64(1);
    let mut second = StdRng::seed_from_u64(99);

    let a = generator.generate_validated(3, 5, &mut first);
    let b = generator.generate_validated(3, 5, &mut second);

    assert_eq!(a.source, LayoutSource::UniformFallback);
    assert_eq!(a.blocks, b.blocks);
    assert_eq!(a.blocks, uniform_grid(3, 5));
    assert_eq!(a.blocks.len(), 15);
}

#[test]
fn test_photo_count_layouts_partition_their_grid() {
    let generator = LayoutGenerator::new(LayoutConstraints::default(), 100);
    let mut rng = StdRng::seed_from_u64(5);
    for count in 1..=20 {
        let layout = generator.generate_for_photo_count(count, &mut rng);
        assert_partition(&layout.blocks, layout.rows, layout.cols);
        assert!(layout.rows <= 10 && layout.cols <= 10);
    }
}

#[test]
fn test_position_example() {
    let grid = create_grid_config(1200, 1200, 4, 4, 10, 0).unwrap();
    let positions = calculate_positions(&[Block::new(0, 0, 2, 2, 0)], &grid).unwrap();

    assert_eq!(positions.len(), 1);
    let position = positions[0];
    assert_eq!((position.x, position.y), (10, 10));
    assert_eq!((position.width, position.height), (600, 600));
    assert_eq!((position.render_width, position.render_height), (580, 580));
}

#[test]
fn test_positions_reject_blocks_outside_the_grid() {
    let grid = create_grid_config(1200, 1200, 4, 4, 10, 0).unwrap();
    assert!(calculate_positions(&[Block::new(3, 0, 2, 1, 0)], &grid).is_err());
}

#[test]
fn test_validation_modes_disagree_on_one_strip() {
    let constraints = LayoutConstraints {
        mode: ValidationMode::Legacy,
        ..LayoutConstraints::default()
    };
    // One 1x3 strip among six blocks stays under the 20% extreme share.
    let blocks = vec![
        Block::new(0, 0, 1, 3, 0),
        Block::new(1, 0, 3, 4, 1),
        Block::new(0, 3, 1, 1, 2),
        Block::new(4, 0, 2, 2, 3),
        Block::new(4, 2, 2, 1, 4),
        Block::new(4, 3, 2, 1, 5),
    ];
    assert_partition(&blocks, 4, 6);

    let legacy = validate(&blocks, &constraints);
    assert_eq!(legacy.metrics.illegal_aspect_count, 0);

    let strict = validate(&blocks, &LayoutConstraints::default());
    assert!(!strict.is_valid);
}
