use topomap::terrain::color_map::band_selector;
use topomap::{ParameterSet, TerrainSession, Tick};

fn main() {
    let params = ParameterSet {
        line_color_mode: true,
        ..Default::default()
    };
    let mut session = TerrainSession::new(params.clone());
    let frame = session.tick(Tick::Absolute(0.0));

    let elevations: Vec<f32> = frame.vertices.iter().map(|v| v.elevation).collect();

    let min = elevations.iter().copied().fold(f32::INFINITY, f32::min);
    let max = elevations.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mean = elevations.iter().map(|&e| e as f64).sum::<f64>() / elevations.len() as f64;
    let banded = elevations
        .iter()
        .filter(|&&e| band_selector(e, params.line_height, params.line_thickness) == Some(0.0))
        .count();

    println!("Frame stats (t = {:.2}, schema {:?}):", frame.time, params.schema);
    println!("  Vertices: {}", frame.vertices.len());
    println!("  Min elevation: {:.4}", min);
    println!("  Max elevation: {:.4}", max);
    println!("  Mean elevation: {:.4}", mean);
    println!(
        "  Contour vertices: {} ({:.1}%)",
        banded,
        banded as f32 * 100.0 / elevations.len() as f32
    );
}
