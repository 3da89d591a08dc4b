use criterion::{Criterion, black_box, criterion_group, criterion_main};
use geo::Point;

use tactinav::model::definition::{
    EdgeDefinition, GraphDefinition, LatLngReference, NodeDefinition, ReferenceSystem,
    StreetDefinition,
};
use tactinav::model::{Graph, SnapThresholds};

/// Square street grid with `size` avenues crossing `size` streets,
/// blocks 200 ft on a side.
fn grid_definition(size: usize) -> GraphDefinition {
    let mut nodes = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            nodes.push(NodeDefinition {
                coords: [col as f64 * 200.0, row as f64 * 200.0],
                features: Default::default(),
            });
        }
    }

    let mut edges = Vec::new();
    let mut streets = Vec::new();
    for row in 0..size {
        let mut street_edges = Vec::new();
        for col in 0..size - 1 {
            street_edges.push(edges.len());
            edges.push(EdgeDefinition {
                nodes: [row * size + col, row * size + col + 1],
                features: Default::default(),
            });
        }
        streets.push(StreetDefinition {
            name: format!("Street {row}"),
            edges: street_edges,
        });
    }
    for col in 0..size {
        let mut street_edges = Vec::new();
        for row in 0..size - 1 {
            street_edges.push(edges.len());
            edges.push(EdgeDefinition {
                nodes: [row * size + col, (row + 1) * size + col],
                features: Default::default(),
            });
        }
        streets.push(StreetDefinition {
            name: format!("Avenue {col}"),
            edges: street_edges,
        });
    }

    GraphDefinition {
        nodes,
        edges,
        streets,
        pois: vec![],
        reference_system: ReferenceSystem {
            north: [0.0, 1.0],
            east: [1.0, 0.0],
            south: [0.0, -1.0],
            west: [-1.0, 0.0],
        },
        latlng_reference: LatLngReference {
            coords: [0.0, 0.0],
            lat: 37.79,
            lng: -122.44,
        },
    }
}

fn bench_build(c: &mut Criterion) {
    let def = grid_definition(12);
    c.bench_function("graph_build_12x12", |b| {
        b.iter(|| Graph::from_definition(black_box(&def)).unwrap());
    });
}

fn bench_queries(c: &mut Criterion) {
    let graph = Graph::from_definition(&grid_definition(12)).unwrap();
    let thresholds = SnapThresholds::default();

    c.bench_function("snap_mid_block", |b| {
        b.iter(|| graph.snap(black_box(Point::new(1105.0, 1210.0)), &thresholds));
    });

    c.bench_function("distance_across_grid", |b| {
        b.iter(|| {
            graph
                .get_distance(
                    black_box(Point::new(10.0, 10.0)),
                    black_box(Point::new(2100.0, 2150.0)),
                )
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_build, bench_queries);
criterion_main!(benches);
