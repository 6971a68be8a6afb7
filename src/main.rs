use std::env;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use cs_triangulate::{
    load_contours_from_str, load_obj_with, TriangleMesh, TriangulationConfig, Triangulator,
    WindingPolicy,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let data = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read {}", options.path))?;
    let triangulator = Triangulator::new(TriangulationConfig {
        winding: options.winding,
        ..TriangulationConfig::default()
    });

    let is_obj = Path::new(&options.path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("obj"));
    if is_obj {
        run_obj(&data, &triangulator, options.summary_only)
    } else {
        run_contours(&data, &triangulator, options.summary_only)
    }
}

fn run_contours(data: &str, triangulator: &Triangulator, summary_only: bool) -> Result<()> {
    let contours = load_contours_from_str(data).context("failed to parse contour XML")?;
    println!("Loaded {} polygon(s)", contours.len());

    let mut mesh = TriangleMesh::new();
    for (position, polygon) in contours.iter().enumerate() {
        let label = polygon.label(position);
        match triangulator.triangulate(&polygon.contour, &mut mesh) {
            Ok(normal) => {
                info!("{label}: normal {normal:?}");
                println!(
                    "{label}: {} vertices, {} triangles",
                    mesh.vertex_count(),
                    mesh.triangle_count()
                );
                if !summary_only {
                    for triangle in mesh.triangles() {
                        println!("  ({}, {}, {})", triangle.a, triangle.b, triangle.c);
                    }
                }
            }
            Err(err) => {
                warn!("{label} was not triangulated: {err}");
                println!("{label}: skipped ({err})");
            }
        }
    }
    Ok(())
}

fn run_obj(data: &str, triangulator: &Triangulator, summary_only: bool) -> Result<()> {
    let mesh = load_obj_with(data, triangulator).context("failed to load OBJ")?;
    println!(
        "Loaded mesh with {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    if !summary_only {
        for triangle in mesh.indices.chunks_exact(3) {
            println!("  ({}, {}, {})", triangle[0], triangle[1], triangle[2]);
        }
    }
    Ok(())
}

struct CliOptions {
    path: String,
    winding: WindingPolicy,
    summary_only: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: cs-triangulate <contours.xml|mesh.obj> [--winding index|normal] [--summary-only]"
            ));
        };
        let mut winding = WindingPolicy::default();
        let mut summary_only = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "--winding" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--winding expects 'index' or 'normal'"))?;
                    winding = match value.as_str() {
                        "index" => WindingPolicy::IndexOrder,
                        "normal" => WindingPolicy::Normal,
                        other => {
                            return Err(anyhow!(
                                "Unknown winding policy: {other}. Expected index or normal"
                            ));
                        }
                    };
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --winding or --summary-only"
                    ));
                }
            }
        }
        Ok(Self {
            path,
            winding,
            summary_only,
        })
    }
}
