use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use mg_test_fixtures::{demo_dir, demo_materials, discover_cases, DemoCase, Expectation};

fn run_render(dir: &Path, args: &[String]) -> Output {
    let bin = env!("CARGO_BIN_EXE_mapgen");
    Command::new(bin)
        .current_dir(dir)
        .arg("render")
        .args(args)
        .output()
        .expect("render command should run")
}

fn output_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mapgen-cli-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).expect("output dir should be creatable");
    dir
}

fn field<'a>(stdout: &'a str, key: &str) -> Option<&'a str> {
    stdout.lines().find_map(|line| line.strip_prefix(key))
}

fn script_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("SCRIPT_OUTPUT_JSON:"))
        .map(|json| serde_json::from_str(json).expect("script output should be json"))
        .collect()
}

fn case_args(case: &DemoCase, image: &Path) -> Vec<String> {
    let mut args = vec![
        case.input_path().to_string_lossy().to_string(),
        image.to_string_lossy().to_string(),
        "--materials".to_string(),
        demo_materials().to_string_lossy().to_string(),
    ];
    args.extend(case.args.iter().cloned());
    args
}

#[test]
fn demos_render_as_expected() {
    let cases = discover_cases().expect("demos should load");
    assert!(!cases.is_empty());
    for case in cases {
        let image = output_dir(&case.name).join("map.png");
        let output = run_render(&case.dir, &case_args(&case, &image));
        let stdout = String::from_utf8_lossy(&output.stdout);

        match &case.expect {
            Expectation::Ok {
                width,
                height,
                script_output: expected_output,
            } => {
                assert!(output.status.success(), "{}: {}", case.name, stdout);
                assert_eq!(field(&stdout, "RESULT:"), Some("OK"), "{}", case.name);
                assert_eq!(field(&stdout, "WIDTH:"), Some(width.to_string().as_str()));
                assert_eq!(field(&stdout, "HEIGHT:"), Some(height.to_string().as_str()));
                assert_eq!(&script_output(&stdout), expected_output, "{}", case.name);
                assert!(image.is_file(), "{}: image not written", case.name);
            }
            Expectation::Error {
                error_code,
                message_contains,
            } => {
                assert_eq!(output.status.code(), Some(1), "{}: {}", case.name, stdout);
                assert_eq!(field(&stdout, "RESULT:"), Some("ERROR"), "{}", case.name);
                assert_eq!(field(&stdout, "ERROR_CODE:"), Some(error_code.as_str()));
                if let Some(fragment) = message_contains {
                    let message: String = serde_json::from_str(
                        field(&stdout, "ERROR_MSG_JSON:").expect("error message line"),
                    )
                    .expect("error message should be json");
                    assert!(message.contains(fragment.as_str()), "{}: {}", case.name, message);
                }
                assert!(!image.exists(), "{}: image written on failure", case.name);
            }
        }
    }
}

#[test]
fn background_raster_written_when_requested() {
    let out = output_dir("background");
    let dir = demo_dir("02-landscape");
    let output = run_render(
        &dir,
        &[
            "Landscape.txt".to_string(),
            out.join("fg.png").to_string_lossy().to_string(),
            "--materials".to_string(),
            demo_materials().to_string_lossy().to_string(),
            "--bg-out".to_string(),
            out.join("bg.png").to_string_lossy().to_string(),
        ],
    );
    assert!(output.status.success());
    assert!(out.join("fg.png").is_file());
    assert!(out.join("bg.png").is_file());
}

#[test]
fn landscape_without_materials_reports_unknown_material() {
    let out = output_dir("no-materials");
    let output = run_render(
        &demo_dir("02-landscape"),
        &[
            "Landscape.txt".to_string(),
            out.join("map.png").to_string_lossy().to_string(),
        ],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(field(&stdout, "ERROR_CODE:"), Some("CLI_GENERATION_FAILED"));
    assert!(stdout.contains("Unknown material"), "{}", stdout);
}

#[test]
fn unknown_extension_needs_map_type() {
    let out = output_dir("map-type");
    let input = out.join("Map.script");
    std::fs::write(&input, "fn InitializeMap(map) { true }").expect("input should be writable");
    let image = out.join("map.png").to_string_lossy().to_string();

    let output = run_render(&out, &[input.to_string_lossy().to_string(), image.clone()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(field(&stdout, "ERROR_CODE:"), Some("CLI_MAP_TYPE_UNKNOWN"));

    let output = run_render(
        &out,
        &[
            input.to_string_lossy().to_string(),
            image,
            "--map-type".to_string(),
            "script".to_string(),
            "--width".to_string(),
            "4".to_string(),
            "--height".to_string(),
            "4".to_string(),
        ],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(field(&stdout, "RESULT:"), Some("OK"), "{}", stdout);
}

#[test]
fn missing_subcommand_fails_with_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_mapgen"))
        .output()
        .expect("mapgen should run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}
