//! Integration test: run small in-memory drawings through the full
//! pipeline and export to G-code.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pixplot_export::{GCodeConfig, GCodeMetadata, emit};
use pixplot_pipeline::PipelineConfig;

/// White PNG with black pixels wherever `dark(x, y)` is true.
fn drawing(width: u32, height: u32, dark: impl Fn(u32, u32) -> bool) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        if dark(x, y) {
            image::Rgba([0, 0, 0, 255])
        } else {
            image::Rgba([255, 255, 255, 255])
        }
    });
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgba8,
    )
    .unwrap();
    buf
}

fn convert(png: &[u8], pipeline: &PipelineConfig, gcode: &GCodeConfig) -> String {
    let result = pixplot_pipeline::process(png, pipeline).expect("pipeline should succeed");
    emit(
        &result.plan,
        result.dimensions,
        gcode,
        &GCodeMetadata::default(),
    )
    .to_string()
}

/// Every `X.. Y..` pair on `G0`/`G1` lines, as printed.
fn coordinates(program: &str) -> Vec<(String, String)> {
    program
        .lines()
        .filter(|l| l.starts_with("G0 X") || l.starts_with("G1 X"))
        .map(|l| {
            let mut words = l.split_whitespace().skip(1);
            let x = words.next().unwrap().trim_start_matches('X').to_owned();
            let y = words.next().unwrap().trim_start_matches('Y').to_owned();
            (x, y)
        })
        .collect()
}

#[test]
fn centred_square_emits_its_corners() {
    let png = drawing(4, 4, |x, y| (1..=2).contains(&x) && (1..=2).contains(&y));
    let pipeline = PipelineConfig {
        simplify_tolerance: 0.0,
        ..PipelineConfig::default()
    };
    let program = convert(&png, &pipeline, &GCodeConfig::default());

    let mut corners = coordinates(&program);
    // The trailer's return to origin is not part of the square.
    assert_eq!(corners.pop(), Some(("0.0".to_owned(), "0.0".to_owned())));
    corners.sort();
    corners.dedup();
    let expected = [
        ("1.0", "1.0"),
        ("1.0", "2.0"),
        ("2.0", "1.0"),
        ("2.0", "2.0"),
    ];
    let expected: Vec<(String, String)> = expected
        .iter()
        .map(|&(x, y)| (x.to_owned(), y.to_owned()))
        .collect();
    assert_eq!(corners, expected);
}

#[test]
fn blank_image_emits_framing_only() {
    let png = drawing(16, 16, |_, _| false);
    let program = convert(&png, &PipelineConfig::default(), &GCodeConfig::default());
    assert_eq!(program, "G21\nG90\nG1 Z5\nG1 Z5\nG0 X0.0 Y0.0 F3000\nM2\n");
}

#[test]
fn isolated_pixel_becomes_a_dot() {
    let png = drawing(5, 5, |x, y| x == 3 && y == 1);
    let program = convert(&png, &PipelineConfig::default(), &GCodeConfig::default());
    assert!(program.contains("G0 X3.0 Y1.0 F3000\nG1 Z0\nG1 Z5\n"));
}

#[test]
fn conversion_is_byte_identical_across_runs() {
    let png = drawing(64, 48, |x, y| {
        let dx = f64::from(x) - 32.0;
        let dy = f64::from(y) - 24.0;
        let r = dx.hypot(dy);
        (10.0..14.0).contains(&r) || (x + y) % 17 == 0
    });
    let gcode = GCodeConfig {
        invert_y: true,
        units_per_pixel: 0.25,
        ..GCodeConfig::default()
    };
    let a = convert(&png, &PipelineConfig::default(), &gcode);
    let b = convert(&png, &PipelineConfig::default(), &gcode);
    assert_eq!(a, b);
    assert!(a.starts_with("G21\nG90\n"));
    assert!(a.ends_with("M2\n"));
}
