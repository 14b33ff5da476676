use mg_core::MapGenError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> MapGenError {
    MapGenError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: MapGenError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    1
}

pub(crate) fn map_cli_input_read(error: std::io::Error) -> MapGenError {
    map_error("CLI_INPUT_READ", error)
}

pub(crate) fn map_cli_materials_read(error: std::io::Error) -> MapGenError {
    map_error("CLI_MATERIALS_READ", error)
}

pub(crate) fn map_cli_materials_invalid(error: serde_json::Error) -> MapGenError {
    map_error("CLI_MATERIALS_INVALID", error)
}

pub(crate) fn map_cli_scenario_read(error: std::io::Error) -> MapGenError {
    map_error("CLI_SCENARIO_READ", error)
}

pub(crate) fn map_cli_scenario_invalid(error: serde_json::Error) -> MapGenError {
    map_error("CLI_SCENARIO_INVALID", error)
}

pub(crate) fn map_cli_watch(error: notify::Error) -> MapGenError {
    map_error("CLI_WATCH", error)
}

#[cfg(test)]
mod error_map_tests {
    use super::*;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(MapGenError::new("ERR", "failed"));
        assert_eq!(code, 1);
    }

    #[test]
    fn mapping_helpers_keep_error_codes() {
        assert_eq!(
            map_cli_input_read(std::io::Error::other("read")).code,
            "CLI_INPUT_READ"
        );
        assert_eq!(
            map_cli_materials_read(std::io::Error::other("read")).code,
            "CLI_MATERIALS_READ"
        );
        assert_eq!(
            map_cli_scenario_read(std::io::Error::other("read")).code,
            "CLI_SCENARIO_READ"
        );

        let invalid = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        assert_eq!(map_cli_materials_invalid(invalid).code, "CLI_MATERIALS_INVALID");
        let invalid = serde_json::from_str::<serde_json::Value>("[").expect_err("invalid json");
        assert_eq!(map_cli_scenario_invalid(invalid).code, "CLI_SCENARIO_INVALID");

        assert_eq!(
            map_cli_watch(notify::Error::generic("watch")).code,
            "CLI_WATCH"
        );
    }
}
