//! Exit codes of the `lamella` binary.

use std::process::Command;

fn lamella(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_lamella"))
        .args(args)
        .output()
        .expect("failed to launch lamella")
}

fn run_args(grating_type: &str, output: &str) -> Vec<String> {
    [
        "run",
        "--mode",
        "constantIncidence",
        "--min",
        "0.5",
        "--max",
        "0.6",
        "--increment",
        "0.05",
        "--incidenceAngle",
        "20",
        "--outputFile",
        output,
        "--gratingType",
        grating_type,
        "--gratingPeriod",
        "1.0",
        "--gratingGeometry",
        "0.05",
        "--gratingMaterial",
        "Au",
        "--N",
        "2",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[test]
fn test_unknown_grating_type_exits_with_one() {
    let out = std::env::temp_dir().join(format!("lamella-cli-bad-type-{}.txt", std::process::id()));
    let args = run_args("triangle", out.to_str().unwrap());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let result = lamella(&args);
    assert_eq!(result.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&result.stderr).is_empty());
    assert!(!out.exists());
}

#[test]
fn test_missing_required_flag_exits_with_one() {
    let result = lamella(&["run", "--gratingType", "sinusoidal"]);
    assert_eq!(result.status.code(), Some(1));
}

#[test]
fn test_invalid_geometry_exits_with_one() {
    let out = std::env::temp_dir().join(format!("lamella-cli-bad-geometry-{}.txt", std::process::id()));
    let mut args = run_args("sinusoidal", out.to_str().unwrap());
    let pos = args.iter().position(|a| a == "0.05").unwrap();
    args[pos] = "-0.05".to_string();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let result = lamella(&args);
    assert_eq!(result.status.code(), Some(1));
    assert!(!out.exists());
}

#[test]
fn test_help_exits_with_zero() {
    let result = lamella(&["--help"]);
    assert_eq!(result.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&result.stdout).contains("run"));
}
