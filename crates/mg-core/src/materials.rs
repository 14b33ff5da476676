use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::MapGenError;

pub type Rgb = [u8; 3];

pub const SKY_INDEX: u8 = 0;
pub const SKY_COLOR: Rgb = [100, 100, 255];
const SKY_NAME: &str = "sky";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub name: String,
    #[serde(default)]
    pub texture_overlay: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialMap {
    #[serde(default)]
    materials: Vec<Material>,
}

impl MaterialMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a material, replacing one with the same (case-insensitive) name.
    pub fn add(&mut self, name: &str, texture_overlay: &str) {
        let material = Material {
            name: name.to_string(),
            texture_overlay: texture_overlay.to_string(),
        };
        match self.index_of(name) {
            Some(index) => self.materials[index] = material,
            None => self.materials.push(material),
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.materials
            .iter()
            .position(|material| material.name.eq_ignore_ascii_case(name))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Material> {
        self.index_of(name).map(|index| &self.materials[index])
    }

    pub fn get_by_index(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Texture {
    pub name: String,
    pub average_color: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TexMapEntry {
    pub index: u8,
    pub material: String,
    pub texture: String,
}

/// Maps raster indices to material/texture pairs. Index 0 is always sky.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureMap {
    #[serde(default)]
    textures: Vec<Texture>,
    #[serde(default)]
    entries: Vec<TexMapEntry>,
}

impl TextureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a texture of that name is already known.
    pub fn add_texture(&mut self, name: &str, average_color: u32) -> bool {
        if self.texture(name).is_some() {
            return false;
        }
        self.textures.push(Texture {
            name: name.to_string(),
            average_color,
        });
        true
    }

    pub fn add_entry(&mut self, index: u8, material: &str, texture: &str) -> Result<(), MapGenError> {
        if index == SKY_INDEX {
            return Err(MapGenError::new(
                "TEXMAP_INDEX_RESERVED",
                format!(
                    "Index 0 is reserved for sky, cannot map \"{}-{}\".",
                    material, texture
                ),
            ));
        }
        let entry = TexMapEntry {
            index,
            material: material.to_string(),
            texture: texture.to_string(),
        };
        match self.entries.iter().position(|existing| existing.index == index) {
            Some(position) => self.entries[position] = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }

    pub fn entry(&self, index: u8) -> Option<&TexMapEntry> {
        self.entries.iter().find(|entry| entry.index == index)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TexMapEntry> {
        self.entries.iter()
    }

    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.textures
            .iter()
            .find(|texture| texture.name.eq_ignore_ascii_case(name))
    }
}

/// Foreground and background index produced by one material spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialPair {
    pub foreground: u8,
    pub background: u8,
}

/// Lookup from material specs (`Mat`, `Mat-tex`, `Mat-tex:Back-tex`, `Sky`)
/// to raster indices, built from a material and a texture map.
#[derive(Debug, Clone, Default)]
pub struct MaterialResolver {
    by_pair: HashMap<String, u8>,
    by_material: HashMap<String, u8>,
}

impl MaterialResolver {
    pub fn new(materials: &MaterialMap, textures: &TextureMap) -> Self {
        let mut entries = textures.entries().collect::<Vec<_>>();
        entries.sort_by_key(|entry| entry.index);

        let mut by_pair = HashMap::new();
        let mut by_material = HashMap::new();
        for entry in entries {
            let material = entry.material.to_ascii_lowercase();
            by_pair.insert(
                format!("{}-{}", material, entry.texture.to_ascii_lowercase()),
                entry.index,
            );
            by_material.entry(material).or_insert(entry.index);
        }

        for material in materials.iter() {
            if material.texture_overlay.is_empty() {
                continue;
            }
            let key = format!(
                "{}-{}",
                material.name.to_ascii_lowercase(),
                material.texture_overlay.to_ascii_lowercase()
            );
            if let Some(index) = by_pair.get(&key) {
                by_material.insert(material.name.to_ascii_lowercase(), *index);
            }
        }

        Self {
            by_pair,
            by_material,
        }
    }

    pub fn resolve_index(&self, spec: &str) -> Option<u8> {
        let spec = spec.trim().to_ascii_lowercase();
        if spec == SKY_NAME {
            return Some(SKY_INDEX);
        }
        match spec.split_once('-') {
            Some((material, _)) if material == SKY_NAME => Some(SKY_INDEX),
            Some(_) => self.by_pair.get(&spec).copied(),
            None => self.by_material.get(&spec).copied(),
        }
    }

    /// Resolves `Fore[:Back]`. Without an explicit back part the background
    /// repeats the foreground.
    pub fn resolve(&self, spec: &str) -> Option<MaterialPair> {
        let (front, back) = match spec.split_once(':') {
            Some((front, back)) => (front, Some(back)),
            None => (spec, None),
        };
        let foreground = self.resolve_index(front)?;
        let background = match back {
            Some(back) => self.resolve_index(back)?,
            None => foreground,
        };
        Some(MaterialPair {
            foreground,
            background,
        })
    }
}

/// RGB colour per raster index, used when writing rasters as images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn from_maps(materials: &MaterialMap, textures: &TextureMap) -> Self {
        let mut colors = vec![SKY_COLOR; 256];
        let mut overlay_by_material = BTreeMap::new();
        for material in materials.iter() {
            overlay_by_material.insert(
                material.name.to_ascii_lowercase(),
                material.texture_overlay.clone(),
            );
        }

        for entry in textures.entries() {
            if entry.index == SKY_INDEX {
                continue;
            }
            // Animated textures list several names separated by '-'; the first one is shown.
            let texture_name = entry.texture.split('-').next().unwrap_or_default();
            let texture = textures.texture(texture_name).or_else(|| {
                overlay_by_material
                    .get(&entry.material.to_ascii_lowercase())
                    .and_then(|overlay| textures.texture(overlay))
            });
            if let Some(texture) = texture {
                colors[entry.index as usize] = rgb_from_u32(texture.average_color);
            }
        }

        Self { colors }
    }

    pub fn color(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }
}

pub fn rgb_from_u32(color: u32) -> Rgb {
    [
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
    ]
}
