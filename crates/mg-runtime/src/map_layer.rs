use std::cell::RefCell;
use std::rc::Rc;

use mg_core::{LogSink, MaterialPair, MaterialResolver, Raster};
use rhai::{Dynamic, Engine, EvalAltResult, Map, Position, INT};

pub const MAPALGO_RECT: INT = 10;
pub const MAPALGO_ELLIPSE: INT = 12;

/// Largest width or height `Resize` accepts.
pub const MAX_LAYER_DIMENSION: u32 = 16384;

/// Builtin constants the map-layer API understands.
pub const MAP_LAYER_CONSTANTS: &[(&str, INT)] = &[
    ("MAPALGO_Rect", MAPALGO_RECT),
    ("MAPALGO_Ellipse", MAPALGO_ELLIPSE),
];

#[derive(Debug)]
struct LayerData {
    foreground: Raster,
    background: Raster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Rect {
        x: INT,
        y: INT,
        width: INT,
        height: INT,
    },
    Ellipse {
        x: INT,
        y: INT,
        radius_x: INT,
        radius_y: INT,
    },
}

impl Shape {
    fn contains(&self, px: INT, py: INT) -> bool {
        match *self {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => {
                px >= x && py >= y && px < x.saturating_add(width) && py < y.saturating_add(height)
            }
            Shape::Ellipse {
                x,
                y,
                radius_x,
                radius_y,
            } => {
                if radius_x <= 0 || radius_y <= 0 {
                    return false;
                }
                let dx = px.saturating_sub(x) as f64 / radius_x as f64;
                let dy = py.saturating_sub(y) as f64 / radius_y as f64;
                dx * dx + dy * dy <= 1.0
            }
        }
    }
}

fn runtime_error(message: String) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        Dynamic::from(message),
        Position::NONE,
    ))
}

fn shape_value(shape: &Map, key: &str, default: INT) -> Result<INT, Box<EvalAltResult>> {
    match shape.get(key) {
        None => Ok(default),
        Some(value) => value.as_int().map_err(|type_name| {
            runtime_error(format!(
                "Shape property '{}' must be an integer, got {}",
                key, type_name
            ))
        }),
    }
}

/// Raster pair handed to `InitializeMap(map)`. Clones share the same
/// pixels, so changes made through the script's copy are visible to the
/// caller.
#[derive(Debug, Clone)]
pub struct MapLayer {
    data: Rc<RefCell<LayerData>>,
    resolver: Rc<MaterialResolver>,
    sink: LogSink,
}

impl MapLayer {
    pub fn new(width: u32, height: u32, resolver: Rc<MaterialResolver>, sink: LogSink) -> Self {
        Self {
            data: Rc::new(RefCell::new(LayerData {
                foreground: Raster::new(width, height),
                background: Raster::new(width, height),
            })),
            resolver,
            sink,
        }
    }

    pub fn width(&self) -> u32 {
        self.data.borrow().foreground.width()
    }

    pub fn height(&self) -> u32 {
        self.data.borrow().foreground.height()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let mut data = self.data.borrow_mut();
        data.foreground.resize(width, height);
        data.background.resize(width, height);
    }

    fn material(&self, spec: &str) -> Option<MaterialPair> {
        let resolved = self.resolver.resolve(spec);
        if resolved.is_none() {
            self.sink.push(format!("Unknown material '{}'", spec));
        }
        resolved
    }

    fn draw(&mut self, spec: &str, shape: Option<Shape>) -> bool {
        let Some(material) = self.material(spec) else {
            return false;
        };
        let mut data = self.data.borrow_mut();
        let (width, height) = (data.foreground.width(), data.foreground.height());
        for y in 0..INT::from(height) {
            for x in 0..INT::from(width) {
                if shape.map_or(true, |shape| shape.contains(x, y)) {
                    data.foreground.set(x, y, material.foreground);
                    data.background.set(x, y, material.background);
                }
            }
        }
        true
    }

    pub fn set_pixel(&mut self, x: i64, y: i64, spec: &str) -> bool {
        let Some(material) = self.material(spec) else {
            return false;
        };
        let mut data = self.data.borrow_mut();
        let set = data.foreground.set(x, y, material.foreground);
        data.background.set(x, y, material.background);
        set
    }

    /// Foreground index, or -1 outside the layer.
    pub fn pixel(&self, x: i64, y: i64) -> INT {
        self.data
            .borrow()
            .foreground
            .get(x, y)
            .map_or(-1, INT::from)
    }

    pub fn back_pixel(&self, x: i64, y: i64) -> INT {
        self.data
            .borrow()
            .background
            .get(x, y)
            .map_or(-1, INT::from)
    }

    /// Copies the current rasters out of the shared layer.
    pub fn rasters(&self) -> (Raster, Raster) {
        let data = self.data.borrow();
        (data.foreground.clone(), data.background.clone())
    }

    fn parse_shape(&self, shape: &Map) -> Result<Shape, Box<EvalAltResult>> {
        let algo = shape_value(shape, "Algo", MAPALGO_RECT)?;
        let x = shape_value(shape, "X", 0)?;
        let y = shape_value(shape, "Y", 0)?;
        match algo {
            MAPALGO_RECT => Ok(Shape::Rect {
                x,
                y,
                width: shape_value(shape, "Wdt", INT::from(self.width()))?,
                height: shape_value(shape, "Hgt", INT::from(self.height()))?,
            }),
            MAPALGO_ELLIPSE => Ok(Shape::Ellipse {
                x,
                y,
                radius_x: shape_value(shape, "Wdt", 10)?,
                radius_y: shape_value(shape, "Hgt", 10)?,
            }),
            other => Err(runtime_error(format!("Unknown shape algorithm {}", other))),
        }
    }
}

fn dimension(value: INT, name: &str) -> Result<u32, Box<EvalAltResult>> {
    u32::try_from(value)
        .ok()
        .filter(|value| *value <= MAX_LAYER_DIMENSION)
        .ok_or_else(|| runtime_error(format!("Resize: invalid {} {}", name, value)))
}

/// Registers `MapLayer` and its script methods.
pub fn register_map_layer_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<MapLayer>("MapLayer")
        .register_get("Wdt", |layer: &mut MapLayer| INT::from(layer.width()))
        .register_get("Hgt", |layer: &mut MapLayer| INT::from(layer.height()))
        .register_fn(
            "Resize",
            |layer: &mut MapLayer, width: INT, height: INT| -> Result<bool, Box<EvalAltResult>> {
                layer.resize(dimension(width, "width")?, dimension(height, "height")?);
                Ok(true)
            },
        )
        .register_fn("Draw", |layer: &mut MapLayer, spec: &str| layer.draw(spec, None))
        .register_fn(
            "Draw",
            |layer: &mut MapLayer, spec: &str, shape: Map| -> Result<bool, Box<EvalAltResult>> {
                let shape = layer.parse_shape(&shape)?;
                Ok(layer.draw(spec, Some(shape)))
            },
        )
        .register_fn(
            "SetPixel",
            |layer: &mut MapLayer, x: INT, y: INT, spec: &str| layer.set_pixel(x, y, spec),
        )
        .register_fn("GetPixel", |layer: &mut MapLayer, x: INT, y: INT| {
            layer.pixel(x, y)
        })
        .register_fn("GetBackPixel", |layer: &mut MapLayer, x: INT, y: INT| {
            layer.back_pixel(x, y)
        });
}

#[cfg(test)]
mod map_layer_tests {
    use super::*;
    use crate::runtime_test_support::*;
    use rhai::Scope;

    fn run(layer: &MapLayer, script: &str) -> Result<Dynamic, Box<EvalAltResult>> {
        let mut engine = Engine::new();
        register_map_layer_api(&mut engine);
        let mut scope = Scope::new();
        for (name, value) in MAP_LAYER_CONSTANTS {
            scope.push_constant(*name, *value);
        }
        scope.push("map", layer.clone());
        engine.eval_with_scope::<Dynamic>(&mut scope, script)
    }

    #[test]
    fn draw_fills_whole_layer_and_shares_pixels() {
        let sink = LogSink::new();
        let layer = MapLayer::new(3, 2, Rc::new(test_resolver()), sink.clone());
        run(&layer, r#"map.Draw("Earth:Rock")"#).expect("draw should run");
        let (fg, bg) = layer.rasters();
        assert!(fg.as_bytes().iter().all(|pixel| *pixel == 1));
        assert!(bg.as_bytes().iter().all(|pixel| *pixel == 2));
        assert!(sink.is_empty());
    }

    #[test]
    fn draw_with_shapes() {
        let layer = MapLayer::new(6, 6, Rc::new(test_resolver()), LogSink::new());
        run(
            &layer,
            r#"
            map.Draw("Earth", #{ Algo: MAPALGO_Rect, X: 0, Y: 4, Wdt: 6, Hgt: 2 });
            map.Draw("Rock", #{ Algo: MAPALGO_Ellipse, X: 2, Y: 2, Wdt: 1, Hgt: 1 });
            "#,
        )
        .expect("draw should run");
        assert_eq!(layer.pixel(0, 5), 1);
        assert_eq!(layer.pixel(0, 3), 0);
        assert_eq!(layer.pixel(2, 2), 2);
        assert_eq!(layer.pixel(3, 2), 2);
        assert_eq!(layer.pixel(4, 4), 1);
    }

    #[test]
    fn accessors_resize_and_pixels() {
        let layer = MapLayer::new(4, 4, Rc::new(test_resolver()), LogSink::new());
        let result = run(
            &layer,
            r#"
            map.Resize(5, 3);
            map.SetPixel(1, 1, "Earth-earth:Rock");
            [map.Wdt, map.Hgt, map.GetPixel(1, 1), map.GetBackPixel(1, 1), map.GetPixel(9, 9)]
            "#,
        )
        .expect("script should run")
        .into_array()
        .expect("array result");
        let values = result
            .into_iter()
            .map(|value| value.as_int().expect("int"))
            .collect::<Vec<_>>();
        assert_eq!(values, vec![5, 3, 1, 2, -1]);
        assert_eq!((layer.width(), layer.height()), (5, 3));
    }

    #[test]
    fn unknown_material_goes_to_sink() {
        let sink = LogSink::new();
        let layer = MapLayer::new(2, 2, Rc::new(test_resolver()), sink.clone());
        let drawn = run(&layer, r#"map.Draw("Gold")"#)
            .expect("draw should run")
            .as_bool()
            .expect("bool result");
        assert!(!drawn);
        assert_eq!(sink.first_message().as_deref(), Some("Unknown material 'Gold'"));
    }

    #[test]
    fn bad_shape_is_a_script_error() {
        let layer = MapLayer::new(2, 2, Rc::new(test_resolver()), LogSink::new());
        let error = run(&layer, r#"map.Draw("Earth", #{ Algo: 99 })"#)
            .expect_err("unknown shape should fail");
        assert!(error.to_string().contains("Unknown shape algorithm 99"));

        let error = run(&layer, r#"map.Resize(-1, 2)"#).expect_err("negative size should fail");
        assert!(error.to_string().contains("Resize: invalid width -1"));

        let error = run(&layer, r#"map.Resize(2, 4294967295)"#).expect_err("huge size should fail");
        assert!(error.to_string().contains("Resize: invalid height 4294967295"));
    }

    #[test]
    fn extreme_shape_coordinates_do_not_overflow() {
        let layer = MapLayer::new(4, 4, Rc::new(test_resolver()), LogSink::new());
        run(
            &layer,
            r#"
            map.Draw("Earth", #{ Algo: MAPALGO_Rect, X: -9223372036854775807, Y: 0, Wdt: -10, Hgt: 10 });
            map.Draw("Earth", #{ Algo: MAPALGO_Rect, X: 9223372036854775807, Y: 9223372036854775807 });
            map.Draw("Earth", #{ Algo: MAPALGO_Ellipse, X: -9223372036854775807, Y: 9223372036854775807 });
            "#,
        )
        .expect("draw should run");
        assert!(layer.rasters().0.as_bytes().iter().all(|pixel| *pixel == 0));

        run(
            &layer,
            r#"map.Draw("Rock", #{ Algo: MAPALGO_Rect, X: 2, Y: 1, Wdt: 9223372036854775807, Hgt: 9223372036854775807 })"#,
        )
        .expect("draw should run");
        assert_eq!(layer.pixel(3, 3), 2);
        assert_eq!(layer.pixel(2, 1), 2);
        assert_eq!(layer.pixel(1, 1), 0);
        assert_eq!(layer.pixel(3, 0), 0);
    }
}
