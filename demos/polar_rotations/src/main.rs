use argh::FromArgs;
use std::path::PathBuf;

use kornia_polar::{extract_rotations, ExtractOptions, MatrixBatch};

#[derive(FromArgs)]
/// Extract the rotation factor of a batch of square matrices stored as JSON
struct Args {
    /// path to the input batch, `{"rows": m, "cols": n, "data": [...]}` in column-major order
    #[argh(option)]
    input: PathBuf,

    /// path to write the rotations to, stdout if not set
    #[argh(option)]
    output: Option<PathBuf>,

    /// use the closed-form solution for 2x2 matrices
    #[argh(switch)]
    fast_2d: bool,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let batch: MatrixBatch = serde_json::from_reader(std::fs::File::open(&args.input)?)?;
    log::info!(
        "read {} matrices of size {}x{} from {:?}",
        batch.num_matrices(),
        batch.matrix_side(),
        batch.matrix_side(),
        args.input
    );

    let options = ExtractOptions {
        fast_2d: args.fast_2d,
    };
    let rotations = extract_rotations(&batch, &options)?;

    match &args.output {
        Some(path) => {
            serde_json::to_writer_pretty(std::fs::File::create(path)?, &rotations)?;
            log::info!("wrote rotations to {:?}", path);
        }
        None => println!("{}", serde_json::to_string_pretty(&rotations)?),
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = Args::from_args(&["polar_rotations"], &["--input", "in.json", "--fast-2d"])
            .expect("valid arguments");
        assert_eq!(args.input, PathBuf::from("in.json"));
        assert_eq!(args.output, None);
        assert!(args.fast_2d);

        assert!(Args::from_args(&["polar_rotations"], &["--fast-2d"]).is_err());
    }

    #[test]
    fn test_run() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");

        // [[2, 0], [0, 3]] and [[0, -1], [1, 0]]
        let batch = MatrixBatch::from_vec(2, 4, vec![2.0, 0.0, 0.0, 3.0, 0.0, 1.0, -1.0, 0.0])?;
        std::fs::write(&input, serde_json::to_string(&batch)?)?;

        let args = Args {
            input,
            output: Some(output.clone()),
            fast_2d: true,
        };
        run(&args)?;

        let rotations: MatrixBatch = serde_json::from_reader(std::fs::File::open(output)?)?;
        assert_eq!(rotations.shape(), [2, 4]);
        let expected = [1.0, 0.0, 0.0, 1.0, 0.0, 1.0, -1.0, 0.0];
        for (r, e) in rotations.as_slice().iter().zip(expected) {
            assert!((r - e).abs() < 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_run_inconsistent_dimensions() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("in.json");
        std::fs::write(&input, r#"{"rows": 2, "cols": 3, "data": [1, 2, 3, 4, 5, 6]}"#)?;

        let args = Args {
            input,
            output: None,
            fast_2d: false,
        };
        assert!(run(&args).is_err());
        Ok(())
    }
}
