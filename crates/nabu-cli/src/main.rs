use std::path::Path;
use std::process::ExitCode;

use anyhow::{ensure, Result};

use nabu_engine::compute::{matmul, minimal, Matrix};
use nabu_engine::device::{Gpu, GpuInit};
use nabu_engine::logging::{init_logging, LoggingConfig};
use nabu_engine::render::{triangle, triangle_extended, CanvasConfig, RenderedImage};

mod cli;

use cli::{CliArgs, Demo};

fn main() -> ExitCode {
    let args = cli::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..Default::default()
    });

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    let gpu = Gpu::new_headless_blocking(GpuInit {
        power_preference: if args.low_power {
            wgpu::PowerPreference::LowPower
        } else {
            wgpu::PowerPreference::HighPerformance
        },
        force_fallback_adapter: args.fallback_adapter,
        ..Default::default()
    })?;

    let canvas = CanvasConfig {
        width: args.width,
        height: args.height,
        ..Default::default()
    };

    match args.demo {
        Demo::Matmul { first, second, verify } => run_matmul(&gpu, &first, &second, verify),
        Demo::Minimal => run_minimal(&gpu),
        Demo::Triangle { output } => run_triangle(&gpu, canvas, output.as_deref()),
        Demo::TriangleExtended { output } => {
            run_triangle_extended(&gpu, canvas, output.as_deref())
        }
        Demo::All { output_dir } => {
            let first = cli::parse_matrix("2x4=1,2,3,4,5,6,7,8")?;
            let second = cli::parse_matrix("4x2=1,2,3,4,5,6,7,8")?;
            run_matmul(&gpu, &first, &second, true)?;
            run_minimal(&gpu)?;

            if let Some(dir) = &output_dir {
                std::fs::create_dir_all(dir)?;
            }
            let triangle_png = output_dir.as_ref().map(|d| d.join("triangle.png"));
            let extended_png = output_dir.as_ref().map(|d| d.join("triangle-extended.png"));
            run_triangle(&gpu, canvas, triangle_png.as_deref())?;
            run_triangle_extended(&gpu, canvas, extended_png.as_deref())
        }
    }
}

fn run_matmul(gpu: &Gpu, first: &Matrix, second: &Matrix, verify: bool) -> Result<()> {
    let out = matmul::run(gpu, first, second)?;

    println!("result: {:?}", out.raw);
    println!("log:    {:?}", out.log);
    print!("{}", out.product);

    if verify {
        let expected = first.multiply_cpu(second)?;
        ensure!(
            out.product.approx_eq(&expected, 1e-3),
            "GPU product differs from CPU product:\n{expected}"
        );
        ensure!(
            out.log == out.grid.expected_log(first.rows(), second.cols()),
            "log buffer does not match the dispatched grid"
        );
        log::info!("matmul verified against CPU product");
    }
    Ok(())
}

fn run_minimal(gpu: &Gpu) -> Result<()> {
    let out = minimal::run(gpu)?;
    println!("minimal: {out:?}");
    Ok(())
}

fn run_triangle(gpu: &Gpu, canvas: CanvasConfig, output: Option<&Path>) -> Result<()> {
    let image = triangle::run(gpu, canvas)?;
    report_image("triangle", &image, output)
}

fn run_triangle_extended(gpu: &Gpu, canvas: CanvasConfig, output: Option<&Path>) -> Result<()> {
    let out = triangle_extended::run(gpu, canvas, Default::default())?;
    for span in &out.spans {
        println!("  {:>10} -> {:<10} {:?}", span.from, span.to, span.duration);
    }
    report_image("triangle-extended", &out.image, output)
}

fn report_image(name: &str, image: &RenderedImage, output: Option<&Path>) -> Result<()> {
    let center = image.pixel_rgba(image.width() / 2, image.height() / 2);
    println!(
        "{name}: {}x{} {:?}, center pixel {center:?}",
        image.width(),
        image.height(),
        image.format()
    );
    if let Some(path) = output {
        image.save_png(path)?;
    }
    Ok(())
}
