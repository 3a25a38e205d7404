use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};

use nabu_engine::compute::Matrix;

#[derive(Parser, Debug)]
#[command(name = "nabu", about, version)]
pub struct CliArgs {
    #[command(subcommand)]
    pub demo: Demo,

    /// canvas width in pixels
    #[arg(long, global = true, default_value_t = 640)]
    pub width: u32,

    /// canvas height in pixels
    #[arg(long, global = true, default_value_t = 480)]
    pub height: u32,

    /// prefer an integrated / low-power adapter
    #[arg(long, global = true)]
    pub low_power: bool,

    /// force a software adapter
    #[arg(long, global = true)]
    pub fallback_adapter: bool,

    /// log filter (env_logger syntax), overrides RUST_LOG
    #[arg(long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Demo {
    /// multiply two matrices in a compute shader
    Matmul {
        /// first matrix (ROWSxCOLS=v,v,...)
        #[arg(long, default_value = "2x4=1,2,3,4,5,6,7,8", value_parser = parse_matrix)]
        first: Matrix,

        /// second matrix (ROWSxCOLS=v,v,...)
        #[arg(long, default_value = "4x2=1,2,3,4,5,6,7,8", value_parser = parse_matrix)]
        second: Matrix,

        /// compare the GPU result with a CPU product
        #[arg(long)]
        verify: bool,
    },

    /// fill a 4-float buffer from a single 2x2 workgroup
    Minimal,

    /// draw a red triangle offscreen
    Triangle {
        /// write the rendered canvas as PNG
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// draw a vertex-colored triangle with depth and a uniform transform
    TriangleExtended {
        /// write the rendered canvas as PNG
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// run every demo with default inputs
    All {
        /// directory for rendered PNGs
        #[arg(long, value_hint = clap::ValueHint::DirPath)]
        output_dir: Option<PathBuf>,
    },
}

#[must_use]
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Parses `ROWSxCOLS=v,v,...` into a row-major matrix.
pub fn parse_matrix(value: &str) -> Result<Matrix> {
    let (shape, numbers) = value
        .split_once('=')
        .context("expected ROWSxCOLS=v,v,...")?;
    let (rows, cols) = shape
        .split_once(['x', 'X'])
        .context("expected a shape like 2x4")?;
    let rows: u32 = rows.trim().parse().context("invalid row count")?;
    let cols: u32 = cols.trim().parse().context("invalid column count")?;

    let numbers = numbers
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .with_context(|| format!("invalid number {v:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    ensure!(numbers.iter().all(|v| v.is_finite()), "matrix values must be finite");

    Matrix::new(rows, cols, numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matrix_default_first() {
        let m = parse_matrix("2x4=1,2,3,4,5,6,7,8").unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 4));
        assert_eq!(m.numbers(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn parse_matrix_tolerates_spaces_and_upper_x() {
        let m = parse_matrix("1X2= 0.5, -3").unwrap();
        assert_eq!(m.numbers(), &[0.5, -3.0]);
    }

    #[test]
    fn parse_matrix_errors() {
        assert!(parse_matrix("2x2").is_err());
        assert!(parse_matrix("2=1,2").is_err());
        assert!(parse_matrix("2x2=1,2,3").is_err());
        assert!(parse_matrix("1x1=abc").is_err());
        assert!(parse_matrix("1x1=inf").is_err());
    }

    #[test]
    fn cli_defaults() {
        let args = CliArgs::try_parse_from(["nabu", "matmul"]).unwrap();
        assert_eq!((args.width, args.height), (640, 480));
        match args.demo {
            Demo::Matmul { first, second, verify } => {
                assert_eq!((first.rows(), first.cols()), (2, 4));
                assert_eq!((second.rows(), second.cols()), (4, 2));
                assert!(!verify);
            }
            other => panic!("unexpected demo {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args =
            CliArgs::try_parse_from(["nabu", "triangle", "--width", "32", "--low-power"]).unwrap();
        assert_eq!(args.width, 32);
        assert!(args.low_power);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
