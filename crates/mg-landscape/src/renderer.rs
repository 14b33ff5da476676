use mg_core::{LandscapeConfig, LogSink, MaterialPair, MaterialResolver, Raster, SKY_INDEX};
use mg_parser::{Algorithm, OverlayNode};
use tracing::debug;

use crate::algorithms::{evaluate, script_algorithm_function, LocalPoint};

/// Game-script side of `script` overlays.
pub trait ScriptAlgorithmHost {
    /// Calls `function(x, y)` and reports whether the pixel is set. Failures
    /// are reported through the log sink by the host, not by the renderer.
    fn evaluate(&mut self, function: &str, x: i64, y: i64) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
}

impl Rect {
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x.saturating_add(self.width)
            && y < self.y.saturating_add(self.height)
    }

    fn child(&self, node: &OverlayNode) -> Self {
        let percent = |extent: i64, value: i32| extent.saturating_mul(i64::from(value)) / 100;
        Self {
            x: self.x.saturating_add(percent(self.width, node.x)),
            y: self.y.saturating_add(percent(self.height, node.y)),
            width: percent(self.width, node.wdt).max(0),
            height: percent(self.height, node.hgt).max(0),
        }
    }
}

struct RenderNode<'a> {
    source: &'a OverlayNode,
    rect: Rect,
    material: Option<MaterialPair>,
    script_function: Option<String>,
    children: Vec<RenderNode<'a>>,
}

fn compile<'a>(
    node: &'a OverlayNode,
    rect: Rect,
    resolver: &MaterialResolver,
    sink: &LogSink,
) -> RenderNode<'a> {
    let material = node.material_spec().and_then(|spec| {
        let resolved = resolver.resolve(&spec);
        if resolved.is_none() {
            sink.push(format!(
                "{}:{}: Unknown material '{}'",
                node.location.start.line, node.location.start.column, spec
            ));
        }
        resolved
    });
    let script_function = (node.algorithm == Algorithm::Script)
        .then(|| script_algorithm_function(node));
    let children = node
        .children
        .iter()
        .map(|child| compile(child, rect.child(child), resolver, sink))
        .collect();
    RenderNode {
        source: node,
        rect,
        material,
        script_function,
        children,
    }
}

struct Painter<'h> {
    host: Option<&'h mut dyn ScriptAlgorithmHost>,
    sink: LogSink,
    reported_missing_host: bool,
}

impl<'h> Painter<'h> {
    fn hits(&mut self, node: &RenderNode<'_>, x: i64, y: i64) -> bool {
        let overlay = node.source;
        let zoom = |value: i64, zoom: i32| value.saturating_mul(100) / i64::from(zoom.max(1));
        let point = LocalPoint {
            x: zoom(x.saturating_sub(node.rect.x), overlay.zoom_x),
            y: zoom(y.saturating_sub(node.rect.y), overlay.zoom_y),
            width: zoom(node.rect.width, overlay.zoom_x),
            height: zoom(node.rect.height, overlay.zoom_y),
        };
        let hit = match &node.script_function {
            Some(function) => match self.host.as_deref_mut() {
                Some(host) => host.evaluate(function, point.x, point.y),
                None => {
                    if !self.reported_missing_host {
                        self.reported_missing_host = true;
                        self.sink
                            .push(format!("{}: no script loaded for algo=script", function));
                    }
                    false
                }
            },
            None => evaluate(overlay, point),
        };
        hit != overlay.invert
    }

    fn paint_children(
        &mut self,
        node: &RenderNode<'_>,
        x: i64,
        y: i64,
        pixel: &mut MaterialPair,
    ) {
        for child in &node.children {
            if !child.rect.contains(x, y) || !self.hits(child, x, y) {
                continue;
            }
            if !child.source.mask {
                if let Some(material) = child.material {
                    *pixel = material;
                }
            }
            self.paint_children(child, x, y, pixel);
        }
    }
}

/// Renders a `map` node into foreground and background rasters sized by
/// `config` for `player_count` players.
///
/// Children paint over their parent where their algorithm hits, inside the
/// part of the parent's rectangle they cover. `mask` overlays only restrict
/// their children. Problems such as unknown materials are pushed to `sink`;
/// rendering continues and the caller decides whether the run failed.
pub fn render(
    map: &OverlayNode,
    config: &LandscapeConfig,
    resolver: &MaterialResolver,
    player_count: u32,
    host: Option<&mut dyn ScriptAlgorithmHost>,
    sink: &LogSink,
) -> (Raster, Raster) {
    let (width, height) = config.map_size(player_count);
    debug!(width, height, player_count, "rendering landscape");
    let bounds = Rect {
        x: 0,
        y: 0,
        width: i64::from(width),
        height: i64::from(height),
    };
    let root = compile(map, bounds, resolver, sink);
    let base = root.material.unwrap_or(MaterialPair {
        foreground: SKY_INDEX,
        background: SKY_INDEX,
    });

    let mut painter = Painter {
        host,
        sink: sink.clone(),
        reported_missing_host: false,
    };
    let mut foreground = Raster::new(width, height);
    let mut background = Raster::new(width, height);
    for y in 0..bounds.height {
        for x in 0..bounds.width {
            let mut pixel = base;
            painter.paint_children(&root, x, y, &mut pixel);
            foreground.set(x, y, pixel.foreground);
            background.set(x, y, pixel.background);
        }
    }
    (foreground, background)
}

#[cfg(test)]
mod renderer_tests {
    use super::*;
    use mg_core::{MaterialMap, TextureMap};
    use mg_parser::parse_landscape;

    fn resolver() -> MaterialResolver {
        let mut materials = MaterialMap::new();
        materials.add("Earth", "earth");
        materials.add("Rock", "rock");
        let mut textures = TextureMap::new();
        textures.add_texture("earth", 0x8b4513);
        textures.add_texture("rock", 0x808080);
        textures.add_entry(1, "Earth", "earth").expect("entry");
        textures.add_entry(2, "Rock", "rock").expect("entry");
        MaterialResolver::new(&materials, &textures)
    }

    fn render_source(
        source: &str,
        width: u32,
        height: u32,
        host: Option<&mut dyn ScriptAlgorithmHost>,
        sink: &LogSink,
    ) -> (Raster, Raster) {
        let document = parse_landscape(source, "Landscape.txt").expect("landscape should parse");
        let map = document.root_map().expect("map should exist");
        render(
            map,
            &LandscapeConfig::fixed(width, height),
            &resolver(),
            1,
            host,
            sink,
        )
    }

    struct LeftHalf {
        calls: Vec<(String, i64, i64)>,
    }

    impl ScriptAlgorithmHost for LeftHalf {
        fn evaluate(&mut self, function: &str, x: i64, y: i64) -> bool {
            self.calls.push((function.to_string(), x, y));
            x < 5
        }
    }

    #[test]
    fn solid_overlay_fills_its_rectangle() {
        let sink = LogSink::new();
        let (fg, bg) = render_source(
            "map { overlay { y=50; hgt=50; mat=Earth; back=Rock; } }",
            4,
            4,
            None,
            &sink,
        );
        assert!(sink.is_empty());
        assert_eq!(fg.row(0), &[0, 0, 0, 0]);
        assert_eq!(fg.row(2), &[1, 1, 1, 1]);
        assert_eq!(bg.row(3), &[2, 2, 2, 2]);
        assert_eq!(fg.rowstride(), 4);
    }

    #[test]
    fn map_material_is_the_base_layer() {
        let sink = LogSink::new();
        let (fg, _) = render_source(
            "map { mat=Rock; overlay { wdt=50; mat=Earth; } }",
            4,
            1,
            None,
            &sink,
        );
        assert_eq!(fg.row(0), &[1, 1, 2, 2]);
    }

    #[test]
    fn mask_restricts_children_without_painting() {
        let sink = LogSink::new();
        let (fg, _) = render_source(
            "map { overlay { mask=1; mat=Rock; wdt=50; overlay { mat=Earth; } } }",
            4,
            1,
            None,
            &sink,
        );
        assert_eq!(fg.row(0), &[1, 1, 0, 0]);
    }

    #[test]
    fn invert_flips_algorithm() {
        let sink = LogSink::new();
        let (fg, _) = render_source(
            "map { overlay { algo=border; a=1; invert=1; mat=Earth; } }",
            3,
            3,
            None,
            &sink,
        );
        assert_eq!(fg.row(0), &[0, 0, 0]);
        assert_eq!(fg.row(1), &[0, 1, 0]);
    }

    #[test]
    fn script_overlay_asks_host_per_pixel() {
        let sink = LogSink::new();
        let mut host = LeftHalf { calls: Vec::new() };
        let (fg, _) = render_source(
            "map { overlay Caves { algo=script; mat=Earth; } }",
            10,
            2,
            Some(&mut host),
            &sink,
        );
        assert!(sink.is_empty());
        assert_eq!(host.calls.len(), 20);
        assert_eq!(host.calls[0], ("ScriptAlgoCaves".to_string(), 0, 0));
        assert_eq!(fg.row(1), &[1, 1, 1, 1, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn script_overlay_without_host_logs_once() {
        let sink = LogSink::new();
        let (fg, _) = render_source("map { layer { algo=script; mat=Earth; } }", 3, 3, None, &sink);
        assert_eq!(sink.count(), 1);
        assert_eq!(
            sink.first_message().as_deref(),
            Some("ScriptAlgo: no script loaded for algo=script")
        );
        assert!(fg.as_bytes().iter().all(|pixel| *pixel == 0));
    }

    #[test]
    fn unknown_material_is_reported() {
        let sink = LogSink::new();
        render_source("map {\n overlay { mat=Gold; } }", 2, 2, None, &sink);
        assert_eq!(sink.first_message().as_deref(), Some("2:2: Unknown material 'Gold'"));
    }

    #[test]
    fn player_extend_widens_output() {
        let document = parse_landscape("map { mat=Earth; }", "Landscape.txt").expect("parse");
        let mut config = LandscapeConfig::fixed(10, 5);
        config.map_width.max = 25;
        config.player_extend = 1;
        let sink = LogSink::new();
        let (fg, bg) = render(
            document.root_map().expect("map"),
            &config,
            &resolver(),
            3,
            None,
            &sink,
        );
        assert_eq!((fg.width(), fg.height()), (25, 5));
        assert_eq!(bg.width(), 25);
    }

    #[test]
    fn extreme_geometry_and_zoom_render_without_overflow() {
        let sink = LogSink::new();
        let (fg, _) = render_source(
            "map { overlay { wdt=2000000000; hgt=2000000000; \
             overlay { wdt=2000000000; hgt=2000000000; \
             overlay { x=-2000000000; y=-2000000000; wdt=2000000000; hgt=2000000000; \
             zoomX=1; algo=bozo; a=1000000000; mat=Earth; } } } \
             overlay { x=2000000000; mat=Rock; } }",
            4,
            4,
            None,
            &sink,
        );
        assert!(sink.is_empty());
        assert!(fg.as_bytes().iter().all(|pixel| *pixel != 2));
    }
}
