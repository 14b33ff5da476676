use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use mg_core::{
    parse_parameter_defs, MapGenError, Material, MaterialMap, ParameterDef, ScenarioParameters,
    TexMapEntry, Texture, TextureMap, PARAMETER_DEFS_FILE,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    map_cli_materials_invalid, map_cli_materials_read, map_cli_scenario_invalid,
    map_cli_scenario_read,
};

/// `--materials` file: material definitions, textures and the index table.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MaterialsFile {
    #[serde(default)]
    pub(crate) materials: Vec<Material>,
    #[serde(default)]
    pub(crate) textures: Vec<Texture>,
    #[serde(default)]
    pub(crate) texmap: Vec<TexMapEntry>,
}

/// `--scenario` file: parameter definitions and chosen values.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScenarioFile {
    #[serde(default)]
    pub(crate) parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub(crate) values: BTreeMap<String, i32>,
}

pub(crate) fn load_materials(path: &Path) -> Result<(MaterialMap, TextureMap), MapGenError> {
    let text = fs::read_to_string(path).map_err(map_cli_materials_read)?;
    let file: MaterialsFile = serde_json::from_str(&text).map_err(map_cli_materials_invalid)?;
    build_material_tables(file)
}

pub(crate) fn build_material_tables(
    file: MaterialsFile,
) -> Result<(MaterialMap, TextureMap), MapGenError> {
    let mut materials = MaterialMap::new();
    for material in &file.materials {
        materials.add(&material.name, &material.texture_overlay);
    }
    let mut textures = TextureMap::new();
    for texture in &file.textures {
        textures.add_texture(&texture.name, texture.average_color);
    }
    for entry in &file.texmap {
        textures.add_entry(entry.index, &entry.material, &entry.texture)?;
    }
    Ok((materials, textures))
}

pub(crate) fn load_scenario(path: &Path) -> Result<ScenarioParameters, MapGenError> {
    let text = fs::read_to_string(path).map_err(map_cli_scenario_read)?;
    let file: ScenarioFile = serde_json::from_str(&text).map_err(map_cli_scenario_invalid)?;
    let mut scenario = ScenarioParameters::new();
    for def in file.parameters {
        scenario.define(def);
    }
    for (id, value) in file.values {
        scenario.set(&id, value, false);
    }
    Ok(scenario)
}

/// Scenario parameters from `ParameterDefs.txt` in `base`, if there is a
/// readable one. Unreadable or malformed files are logged and skipped.
pub(crate) fn load_parameter_defs(base: &Path) -> Option<ScenarioParameters> {
    let path = base.join(PARAMETER_DEFS_FILE);
    if !path.is_file() {
        return None;
    }
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(error) => {
            warn!(path = %path.display(), %error, "cannot read parameter definitions");
            return None;
        }
    };
    match parse_parameter_defs(&text, PARAMETER_DEFS_FILE) {
        Ok(scenario) => {
            debug!(
                path = %path.display(),
                parameters = scenario.definitions().len(),
                "loaded parameter definitions"
            );
            Some(scenario)
        }
        Err(error) => {
            warn!(code = %error.code, "ignoring parameter definitions: {}", error.message);
            None
        }
    }
}

#[cfg(test)]
mod config_files_tests {
    use super::*;
    use crate::cli_test_support::*;

    #[test]
    fn load_materials_builds_tables() {
        let path = temp_path("materials.json");
        write_file(
            &path,
            r#"{
                "materials": [{ "name": "Earth", "textureOverlay": "earth" }, { "name": "Rock" }],
                "textures": [{ "name": "earth", "averageColor": 9127187 }],
                "texmap": [{ "index": 1, "material": "Earth", "texture": "earth" }]
            }"#,
        );
        let (materials, textures) = load_materials(&path).expect("materials should load");
        assert_eq!(materials.len(), 2);
        assert_eq!(
            materials.get_by_name("rock").map(|m| m.texture_overlay.as_str()),
            Some("")
        );
        assert_eq!(textures.entry(1).map(|e| e.texture.as_str()), Some("earth"));
        assert_eq!(textures.texture("earth").map(|t| t.average_color), Some(9127187));
    }

    #[test]
    fn load_materials_reports_read_parse_and_table_errors() {
        let missing = temp_path("missing-materials.json");
        assert_eq!(
            load_materials(&missing).expect_err("missing file").code,
            "CLI_MATERIALS_READ"
        );

        let invalid = temp_path("invalid-materials.json");
        write_file(&invalid, "{ nope");
        assert_eq!(
            load_materials(&invalid).expect_err("invalid json").code,
            "CLI_MATERIALS_INVALID"
        );

        let reserved = temp_path("reserved-materials.json");
        write_file(
            &reserved,
            r#"{ "texmap": [{ "index": 0, "material": "Earth", "texture": "earth" }] }"#,
        );
        assert_eq!(
            load_materials(&reserved).expect_err("index 0 is sky").code,
            "TEXMAP_INDEX_RESERVED"
        );
    }

    #[test]
    fn load_scenario_applies_values() {
        let path = temp_path("scenario.json");
        write_file(
            &path,
            r#"{
                "parameters": [{ "id": "Depth", "name": "Depth", "default": 2, "min": 1, "max": 5 }],
                "values": { "Depth": 4 }
            }"#,
        );
        let scenario = load_scenario(&path).expect("scenario should load");
        assert_eq!(scenario.definitions().len(), 1);
        assert_eq!(scenario.get("Depth", 0), 4);

        let invalid = temp_path("invalid-scenario.json");
        write_file(&invalid, "[");
        assert_eq!(
            load_scenario(&invalid).expect_err("invalid json").code,
            "CLI_SCENARIO_INVALID"
        );
    }

    #[test]
    fn load_parameter_defs_from_base_directory() {
        let base = temp_path("defs");
        write_file(&base.join("Map.c"), "");
        assert!(load_parameter_defs(&base).is_none());

        write_file(
            &base.join("ParameterDefs.txt"),
            "[ParameterDef]\nID=Flat\nDefault=1\n",
        );
        let scenario = load_parameter_defs(&base).expect("defs should load");
        assert_eq!(scenario.definitions()[0].id, "Flat");
        assert_eq!(scenario.definitions()[0].default, 1);

        write_file(&base.join("ParameterDefs.txt"), "[ParameterDef]\nName=NoId\n");
        assert!(load_parameter_defs(&base).is_none());
    }
}
