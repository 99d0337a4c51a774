//! Graph rendering: force-directed layout, bitmap drawing, base64 PNG.

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};
use plotters::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::graph::SocialGraph;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const MARGIN: f64 = 40.0;
const NODE_RADIUS: i32 = 6;
const LAYOUT_ITERATIONS: usize = 60;

const EDGE_COLOR: RGBColor = RGBColor(200, 200, 200);
const UNKNOWN_COLOR: RGBColor = RGBColor(128, 128, 128);
const FAKE_COLOR: RGBColor = RED;
const REAL_COLOR: RGBColor = GREEN;

/// Renders the full graph to a base64-encoded PNG.
///
/// Every node defaults to gray; test-set nodes are colored red (predicted
/// fake) or green (predicted real) at their original graph index. A test
/// index beyond the prediction list is left gray rather than panicking.
/// The layout RNG is entropy-seeded unless `layout_seed` pins it.
pub fn render_graph(
    graph: &SocialGraph,
    test_nodes: &[usize],
    predictions: &[u8],
    layout_seed: Option<u64>,
) -> Result<String> {
    let mut rng = match layout_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let positions = spring_layout(graph, LAYOUT_ITERATIONS, &mut rng);
    let pixels = to_pixels(&positions);

    let mut colors = vec![UNKNOWN_COLOR; graph.user_count()];
    for (offset, &node) in test_nodes.iter().enumerate() {
        if let Some(&label) = predictions.get(offset) {
            colors[node] = if label == 1 { FAKE_COLOR } else { REAL_COLOR };
        }
    }

    let mut frame = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut frame, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| anyhow!("failed to clear canvas: {e}"))?;

        for (a, b) in graph.edges() {
            root.draw(&PathElement::new(
                vec![pixels[a], pixels[b]],
                EDGE_COLOR.stroke_width(1),
            ))
                .map_err(|e| anyhow!("failed to draw edge: {e}"))?;
        }
        for (node, &center) in pixels.iter().enumerate() {
            root.draw(&Circle::new(center, NODE_RADIUS, colors[node].filled()))
                .map_err(|e| anyhow!("failed to draw node: {e}"))?;
        }
        root.present()
            .map_err(|e| anyhow!("failed to finalize canvas: {e}"))?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&frame, WIDTH, HEIGHT, ExtendedColorType::Rgb8)
        .context("failed to encode graph image as PNG")?;
    Ok(STANDARD.encode(png))
}

/// Fruchterman–Reingold layout on the unit square.
fn spring_layout<R: Rng>(graph: &SocialGraph, iterations: usize, rng: &mut R) -> Vec<(f64, f64)> {
    let n = graph.user_count();
    if n == 0 {
        return Vec::new();
    }

    let mut positions: Vec<(f64, f64)> = (0..n)
        .map(|_| (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
        .collect();
    if n == 1 {
        return positions;
    }

    let k = (1.0 / n as f64).sqrt();
    let mut temperature = 0.1;
    let cooling = temperature / iterations as f64;

    for _ in 0..iterations {
        let mut displacement = vec![(0.0f64, 0.0f64); n];

        // repulsion between every pair
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = positions[i].0 - positions[j].0;
                let dy = positions[i].1 - positions[j].1;
                let distance = (dx * dx + dy * dy).sqrt().max(1e-9);
                let force = k * k / distance;
                let (fx, fy) = (dx / distance * force, dy / distance * force);
                displacement[i].0 += fx;
                displacement[i].1 += fy;
                displacement[j].0 -= fx;
                displacement[j].1 -= fy;
            }
        }

        // attraction along edges
        for (a, b) in graph.edges() {
            let dx = positions[a].0 - positions[b].0;
            let dy = positions[a].1 - positions[b].1;
            let distance = (dx * dx + dy * dy).sqrt().max(1e-9);
            let force = distance * distance / k;
            let (fx, fy) = (dx / distance * force, dy / distance * force);
            displacement[a].0 -= fx;
            displacement[a].1 -= fy;
            displacement[b].0 += fx;
            displacement[b].1 += fy;
        }

        for (position, (dx, dy)) in positions.iter_mut().zip(displacement) {
            let length = (dx * dx + dy * dy).sqrt().max(1e-9);
            let step = length.min(temperature);
            position.0 = (position.0 + dx / length * step).clamp(0.0, 1.0);
            position.1 = (position.1 + dy / length * step).clamp(0.0, 1.0);
        }
        temperature = (temperature - cooling).max(1e-4);
    }

    positions
}

/// Rescales unit-square positions into the drawable pixel region.
fn to_pixels(positions: &[(f64, f64)]) -> Vec<(i32, i32)> {
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in positions {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let span_x = (max_x - min_x).max(1e-9);
    let span_y = (max_y - min_y).max(1e-9);

    positions
        .iter()
        .map(|&(x, y)| {
            let px = MARGIN + (x - min_x) / span_x * (f64::from(WIDTH) - 2.0 * MARGIN);
            let py = MARGIN + (y - min_y) / span_y * (f64::from(HEIGHT) - 2.0 * MARGIN);
            (px as i32, py as i32)
        })
        .collect()
}
