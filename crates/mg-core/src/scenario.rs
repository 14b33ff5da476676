use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const SCENARIO_CONSTANT_PREFIX: &str = "SCENPAR_";

/// Receiver of named integer constants visible to scripts.
pub trait ConstantSink {
    fn register_constant(&mut self, name: &str, value: i64);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub default: i32,
    #[serde(default)]
    pub min: Option<i32>,
    #[serde(default)]
    pub max: Option<i32>,
}

/// Scenario parameter definitions plus the values chosen for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    #[serde(default)]
    definitions: Vec<ParameterDef>,
    #[serde(default)]
    values: BTreeMap<String, i32>,
}

impl ScenarioParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, def: ParameterDef) {
        match self
            .definitions
            .iter()
            .position(|existing| existing.id == def.id)
        {
            Some(index) => self.definitions[index] = def,
            None => self.definitions.push(def),
        }
    }

    pub fn definitions(&self) -> &[ParameterDef] {
        &self.definitions
    }

    pub fn set(&mut self, id: &str, value: i32, only_if_larger: bool) {
        if only_if_larger {
            if let Some(current) = self.values.get(id) {
                if value <= *current {
                    return;
                }
            }
        }
        self.values.insert(id.to_string(), value);
    }

    pub fn get(&self, id: &str, default: i32) -> i32 {
        self.values.get(id).copied().unwrap_or(default)
    }

    /// Registers `SCENPAR_<ID>` for every definition, using the current value
    /// or the definition's default.
    pub fn register_script_constants(&self, sink: &mut dyn ConstantSink) {
        for def in &self.definitions {
            let value = self.get(&def.id, def.default);
            sink.register_constant(
                &format!("{}{}", SCENARIO_CONSTANT_PREFIX, def.id),
                i64::from(value),
            );
        }
    }
}

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        constants: Vec<(String, i64)>,
    }

    impl ConstantSink for Recorder {
        fn register_constant(&mut self, name: &str, value: i64) {
            self.constants.push((name.to_string(), value));
        }
    }

    fn def(id: &str, default: i32) -> ParameterDef {
        ParameterDef {
            id: id.to_string(),
            name: id.to_string(),
            default,
            min: None,
            max: None,
        }
    }

    #[test]
    fn set_only_if_larger_keeps_bigger_value() {
        let mut params = ScenarioParameters::new();
        params.set("Difficulty", 2, true);
        assert_eq!(params.get("Difficulty", 0), 2);
        params.set("Difficulty", 1, true);
        assert_eq!(params.get("Difficulty", 0), 2);
        params.set("Difficulty", 3, true);
        assert_eq!(params.get("Difficulty", 0), 3);
        params.set("Difficulty", 1, false);
        assert_eq!(params.get("Difficulty", 0), 1);
    }

    #[test]
    fn get_returns_caller_default_when_unset() {
        let params = ScenarioParameters::new();
        assert_eq!(params.get("MapSize", 7), 7);
    }

    #[test]
    fn register_script_constants_uses_value_or_definition_default() {
        let mut params = ScenarioParameters::new();
        params.define(def("MapSize", 1));
        params.define(def("Difficulty", 2));
        params.set("MapSize", 3, false);
        params.set("Unrelated", 9, false);

        let mut recorder = Recorder::default();
        params.register_script_constants(&mut recorder);
        assert_eq!(
            recorder.constants,
            vec![
                ("SCENPAR_MapSize".to_string(), 3),
                ("SCENPAR_Difficulty".to_string(), 2)
            ]
        );
    }

    #[test]
    fn define_replaces_same_id() {
        let mut params = ScenarioParameters::new();
        params.define(def("MapSize", 1));
        params.define(def("MapSize", 4));
        assert_eq!(params.definitions().len(), 1);
        assert_eq!(params.definitions()[0].default, 4);
    }
}
