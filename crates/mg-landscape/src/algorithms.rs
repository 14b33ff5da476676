use mg_parser::{Algorithm, OverlayNode};

pub const SCRIPT_ALGORITHM_PREFIX: &str = "ScriptAlgo";

/// Largest `bozo` cell size; bigger `a` values render like this one.
pub const MAX_NOISE_CELL: i64 = 4096;

/// Name of the game-script function a `script` overlay calls per pixel.
pub fn script_algorithm_function(node: &OverlayNode) -> String {
    format!(
        "{}{}",
        SCRIPT_ALGORITHM_PREFIX,
        node.name.as_deref().unwrap_or_default()
    )
}

/// Pixel position inside an overlay, already scaled by the overlay's zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LocalPoint {
    pub(crate) x: i64,
    pub(crate) y: i64,
    pub(crate) width: i64,
    pub(crate) height: i64,
}

fn or_default(value: i32, default: i64) -> i64 {
    if value > 0 {
        i64::from(value)
    } else {
        default
    }
}

fn mix(seed: u32, x: i64, y: i64) -> u32 {
    let mut h = seed as u64 ^ 0x9e37_79b9_7f4a_7c15;
    h ^= (x as u64).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = h.rotate_left(31);
    h ^= (y as u64).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^= h >> 29;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 32;
    h as u32
}

/// Smoothed lattice noise in `0..256`.
fn value_noise(seed: u32, x: i64, y: i64, cell: i64) -> i64 {
    let cx = x.div_euclid(cell);
    let cy = y.div_euclid(cell);
    let fx = x.rem_euclid(cell);
    let fy = y.rem_euclid(cell);
    let corner =
        |dx: i64, dy: i64| i64::from(mix(seed, cx.wrapping_add(dx), cy.wrapping_add(dy)) & 0xff);
    let top = corner(0, 0) * (cell - fx) + corner(1, 0) * fx;
    let bottom = corner(0, 1) * (cell - fx) + corner(1, 1) * fx;
    (top * (cell - fy) + bottom * fy) / (cell * cell)
}

/// Evaluates every algorithm except `script`, which needs a host.
pub(crate) fn evaluate(node: &OverlayNode, point: LocalPoint) -> bool {
    let LocalPoint {
        x,
        y,
        width,
        height,
    } = point;
    match node.algorithm {
        Algorithm::Solid | Algorithm::Script => true,
        Algorithm::Random => {
            let density = or_default(node.a, 50);
            i64::from(mix(node.seed, x, y) % 100) < density
        }
        Algorithm::Checker => {
            let size = or_default(node.a, 10);
            (x.div_euclid(size) + y.div_euclid(size)).rem_euclid(2) == 0
        }
        Algorithm::Bozo => {
            let cell = or_default(node.a, 16).min(MAX_NOISE_CELL);
            let threshold = or_default(node.b, 50) * 256 / 100;
            value_noise(node.seed, x, y, cell) < threshold
        }
        Algorithm::Sin => {
            let period = or_default(node.a, 32) as f64;
            let amplitude = height as f64 * or_default(node.b, 25) as f64 / 100.0;
            let wave = (x as f64 * std::f64::consts::TAU / period).sin() * amplitude;
            (y as f64) >= height as f64 / 2.0 + wave
        }
        Algorithm::Boxes => {
            let size = or_default(node.a, 16);
            let border = or_default(node.b, 4).min(size - 1);
            x.rem_euclid(size) >= border && y.rem_euclid(size) >= border
        }
        Algorithm::Lines => {
            let period = or_default(node.a, 16);
            let thickness = or_default(node.b, 4);
            x.saturating_add(y).rem_euclid(period) < thickness
        }
        Algorithm::Border => {
            let thickness = or_default(node.a, 2);
            x < thickness
                || y < thickness
                || x >= width.saturating_sub(thickness)
                || y >= height.saturating_sub(thickness)
        }
    }
}
