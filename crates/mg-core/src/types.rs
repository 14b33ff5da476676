use serde::{Deserialize, Serialize};

use crate::error::MapGenError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn synthetic() -> Self {
        Self {
            start: SourceLocation { line: 1, column: 1 },
            end: SourceLocation { line: 1, column: 1 },
        }
    }

    pub fn at(line: usize, column: usize) -> Self {
        Self {
            start: SourceLocation { line, column },
            end: SourceLocation { line, column },
        }
    }
}

/// Upper bound on the player multiplier applied by `player_extend`.
pub const MAX_MAP_PLAYER_EXTEND: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandscapeDimension {
    pub standard: u32,
    pub min: u32,
    pub max: u32,
}

impl LandscapeDimension {
    pub fn fixed(value: u32) -> Self {
        Self {
            standard: value,
            min: value,
            max: value,
        }
    }

    pub fn evaluate(&self) -> u32 {
        self.standard.clamp(self.min, self.max.max(self.min))
    }
}

/// Bounds handed to either generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandscapeConfig {
    pub map_width: LandscapeDimension,
    pub map_height: LandscapeDimension,
    pub player_extend: u32,
}

impl LandscapeConfig {
    pub fn fixed(width: u32, height: u32) -> Self {
        Self {
            map_width: LandscapeDimension::fixed(width),
            map_height: LandscapeDimension::fixed(height),
            player_extend: 0,
        }
    }

    /// Map size for the given number of players. With a non-zero
    /// `player_extend` the width grows with the player count, up to the
    /// dimension's maximum.
    pub fn map_size(&self, player_count: u32) -> (u32, u32) {
        let mut width = self.map_width.evaluate();
        let height = self.map_height.evaluate();
        if self.player_extend > 0 {
            let players = player_count.clamp(1, MAX_MAP_PLAYER_EXTEND);
            width = width.saturating_mul(players).min(self.map_width.max);
        }
        (width, height)
    }
}

/// Row-major grid of 8-bit material indices. The row stride equals the width.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width as usize * height as usize],
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, MapGenError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(MapGenError::new(
                "RASTER_SIZE",
                format!(
                    "Raster of {}x{} needs {} pixels, got {}.",
                    width,
                    height,
                    expected,
                    pixels.len()
                ),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rowstride(&self) -> u32 {
        self.width
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i64, y: i64) -> Option<u8> {
        self.offset(x, y).map(|index| self.pixels[index])
    }

    pub fn set(&mut self, x: i64, y: i64, value: u8) -> bool {
        match self.offset(x, y) {
            Some(index) => {
                self.pixels[index] = value;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, value: u8) {
        self.pixels.fill(value);
    }

    /// Changes the dimensions, keeping the overlapping top-left region.
    pub fn resize(&mut self, width: u32, height: u32) {
        let mut resized = Raster::new(width, height);
        for y in 0..self.height.min(height) {
            for x in 0..self.width.min(width) {
                let value = self.pixels[y as usize * self.width as usize + x as usize];
                resized.pixels[y as usize * width as usize + x as usize] = value;
            }
        }
        *self = resized;
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }
}

/// Successful output of one generation run. Owns its rasters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMap {
    pub width: u32,
    pub height: u32,
    pub rowstride: u32,
    pub foreground: Option<Raster>,
    pub background: Option<Raster>,
    pub script_output: Vec<String>,
}

impl GeneratedMap {
    pub fn from_rasters(
        foreground: Option<Raster>,
        background: Option<Raster>,
    ) -> Result<Self, MapGenError> {
        let Some(reference) = foreground.as_ref().or(background.as_ref()) else {
            return Err(MapGenError::new(
                "RASTER_MISSING",
                "Map generation produced no raster.",
            ));
        };
        let (width, height) = (reference.width(), reference.height());

        if let (Some(fg), Some(bg)) = (&foreground, &background) {
            if fg.width() != bg.width() || fg.height() != bg.height() {
                return Err(MapGenError::new(
                    "RASTER_SIZE",
                    format!(
                        "Foreground ({}x{}) and background ({}x{}) rasters differ in size.",
                        fg.width(),
                        fg.height(),
                        bg.width(),
                        bg.height()
                    ),
                ));
            }
        }

        Ok(Self {
            width,
            height,
            rowstride: width,
            foreground,
            background,
            script_output: Vec::new(),
        })
    }

    pub fn with_script_output(mut self, script_output: Vec<String>) -> Self {
        self.script_output = script_output;
        self
    }
}

/// Either the rasters of a finished run or the message describing why it
/// failed. Never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Success(GeneratedMap),
    Failure { error_message: String },
}

impl GenerationResult {
    pub fn from_outcome(outcome: Result<GeneratedMap, MapGenError>) -> Self {
        match outcome {
            Ok(map) => Self::Success(map),
            Err(error) => {
                let error_message = if error.message.trim().is_empty() {
                    format!("Map generation failed ({})", error.code)
                } else {
                    error.message
                };
                Self::Failure { error_message }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error_message } => Some(error_message.as_str()),
        }
    }

    pub fn map(&self) -> Option<&GeneratedMap> {
        match self {
            Self::Success(map) => Some(map),
            Self::Failure { .. } => None,
        }
    }

    pub fn width(&self) -> u32 {
        self.map().map(|map| map.width).unwrap_or(0)
    }

    pub fn height(&self) -> u32 {
        self.map().map(|map| map.height).unwrap_or(0)
    }

    pub fn rowstride(&self) -> u32 {
        self.map().map(|map| map.rowstride).unwrap_or(0)
    }

    pub fn foreground(&self) -> Option<&Raster> {
        self.map().and_then(|map| map.foreground.as_ref())
    }

    pub fn background(&self) -> Option<&Raster> {
        self.map().and_then(|map| map.background.as_ref())
    }

    pub fn script_output(&self) -> &[String] {
        self.map()
            .map(|map| map.script_output.as_slice())
            .unwrap_or_default()
    }

    pub fn into_result(self) -> Result<GeneratedMap, String> {
        match self {
            Self::Success(map) => Ok(map),
            Self::Failure { error_message } => Err(error_message),
        }
    }
}
