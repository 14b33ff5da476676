use mg_core::{MapGenError, SourceSpan};

use crate::lexer::{parse_error, tokenize, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Map,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Solid,
    Random,
    Checker,
    Bozo,
    Sin,
    Boxes,
    Lines,
    Border,
    Script,
}

impl Algorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        let algorithm = match name.to_ascii_lowercase().as_str() {
            "solid" => Self::Solid,
            "random" => Self::Random,
            "checker" => Self::Checker,
            "bozo" => Self::Bozo,
            "sin" => Self::Sin,
            "boxes" => Self::Boxes,
            "lines" => Self::Lines,
            "border" => Self::Border,
            "script" => Self::Script,
            _ => return None,
        };
        Some(algorithm)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Random => "random",
            Self::Checker => "checker",
            Self::Bozo => "bozo",
            Self::Sin => "sin",
            Self::Boxes => "boxes",
            Self::Lines => "lines",
            Self::Border => "border",
            Self::Script => "script",
        }
    }
}

/// A `map` or `overlay` block. Geometry is given in percent of the parent.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayNode {
    pub kind: NodeKind,
    pub name: Option<String>,
    pub algorithm: Algorithm,
    pub material: Option<String>,
    pub texture: Option<String>,
    pub back: Option<String>,
    pub x: i32,
    pub y: i32,
    pub wdt: i32,
    pub hgt: i32,
    pub zoom_x: i32,
    pub zoom_y: i32,
    pub a: i32,
    pub b: i32,
    pub seed: u32,
    pub invert: bool,
    pub mask: bool,
    pub children: Vec<OverlayNode>,
    pub location: SourceSpan,
}

impl OverlayNode {
    fn new(kind: NodeKind, name: Option<String>, location: SourceSpan) -> Self {
        Self {
            kind,
            name,
            algorithm: Algorithm::Solid,
            material: None,
            texture: None,
            back: None,
            x: 0,
            y: 0,
            wdt: 100,
            hgt: 100,
            zoom_x: 100,
            zoom_y: 100,
            a: 0,
            b: 0,
            seed: 0,
            invert: false,
            mask: false,
            children: Vec::new(),
            location,
        }
    }

    /// `mat[-tex][:back]`, or `None` when the node inherits its material.
    pub fn material_spec(&self) -> Option<String> {
        let material = self.material.as_ref()?;
        let mut spec = match &self.texture {
            Some(texture) => format!("{}-{}", material, texture),
            None => material.clone(),
        };
        if let Some(back) = &self.back {
            spec.push(':');
            spec.push_str(back);
        }
        Some(spec)
    }

    /// Depth-first search over this node and its descendants, children
    /// before later siblings.
    pub fn any_node(&self, predicate: &dyn Fn(&OverlayNode) -> bool) -> bool {
        predicate(self) || self.children.iter().any(|child| child.any_node(predicate))
    }

    pub fn has_script_overlay(&self) -> bool {
        self.any_node(&|node| {
            node.kind == NodeKind::Overlay && node.algorithm == Algorithm::Script
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandscapeDocument {
    pub maps: Vec<OverlayNode>,
}

impl LandscapeDocument {
    /// The first `map` block; later ones are alternatives the generator ignores.
    pub fn root_map(&self) -> Option<&OverlayNode> {
        self.maps.first()
    }
}

/// Deepest `overlay` nesting accepted below a `map`.
pub const MAX_NESTING_DEPTH: usize = 256;

pub fn parse_landscape(source: &str, filename: &str) -> Result<LandscapeDocument, MapGenError> {
    let tokens = tokenize(source, filename)?;
    let mut parser = Parser {
        tokens,
        cursor: 0,
        filename,
    };
    parser.parse_document()
}

struct Parser<'a> {
    tokens: Vec<Token>,
    cursor: usize,
    filename: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.cursor < self.tokens.len() - 1 {
            self.cursor += 1;
        }
        token
    }

    fn error_at(&self, token: &Token, message: &str) -> MapGenError {
        parse_error(self.filename, token.line, token.column, message)
    }

    fn parse_document(&mut self) -> Result<LandscapeDocument, MapGenError> {
        let mut document = LandscapeDocument::default();
        loop {
            let token = self.advance();
            match &token.kind {
                TokenKind::End => return Ok(document),
                TokenKind::Semicolon => continue,
                TokenKind::Word(word) if word == "map" => {
                    let node = self.parse_block(NodeKind::Map, &token, 0)?;
                    document.maps.push(node);
                }
                other => {
                    return Err(self.error_at(
                        &token,
                        &format!("expected 'map', found {}", other.describe()),
                    ))
                }
            }
        }
    }

    fn parse_block(
        &mut self,
        kind: NodeKind,
        keyword: &Token,
        depth: usize,
    ) -> Result<OverlayNode, MapGenError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(self.error_at(
                keyword,
                &format!("overlays nested deeper than {} levels", MAX_NESTING_DEPTH),
            ));
        }
        let name = match &self.peek().kind {
            TokenKind::Word(word) => {
                let name = word.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };

        let open = self.advance();
        if open.kind != TokenKind::OpenBrace {
            return Err(self.error_at(
                &open,
                &format!("expected '{{', found {}", open.kind.describe()),
            ));
        }

        let mut node = OverlayNode::new(kind, name, SourceSpan::at(keyword.line, keyword.column));
        loop {
            let token = self.advance();
            match &token.kind {
                TokenKind::CloseBrace => return Ok(node),
                TokenKind::Semicolon => continue,
                TokenKind::End => {
                    return Err(self.error_at(&token, "expected '}' before end of file"))
                }
                TokenKind::Word(word) if word == "overlay" || word == "layer" => {
                    let child = self.parse_block(NodeKind::Overlay, &token, depth + 1)?;
                    node.children.push(child);
                }
                TokenKind::Word(key) => {
                    let key = key.clone();
                    let equals = self.advance();
                    if equals.kind != TokenKind::Equals {
                        return Err(self.error_at(
                            &equals,
                            &format!("expected '=' after '{}', found {}", key, equals.kind.describe()),
                        ));
                    }
                    let value_token = self.advance();
                    let TokenKind::Word(value) = &value_token.kind else {
                        return Err(self.error_at(
                            &value_token,
                            &format!("expected value for '{}', found {}", key, value_token.kind.describe()),
                        ));
                    };
                    self.apply_attribute(&mut node, &key, value, &token, &value_token)?;
                }
                other => {
                    return Err(self.error_at(&token, &format!("unexpected {}", other.describe())))
                }
            }
        }
    }

    fn apply_attribute(
        &self,
        node: &mut OverlayNode,
        key: &str,
        value: &str,
        key_token: &Token,
        value_token: &Token,
    ) -> Result<(), MapGenError> {
        let int = || {
            parse_int(value).ok_or_else(|| {
                self.error_at(value_token, &format!("invalid value '{}' for '{}'", value, key))
            })
        };
        let flag = || match value.to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(self.error_at(value_token, &format!("invalid value '{}' for '{}'", value, key))),
        };

        match key.to_ascii_lowercase().as_str() {
            "algo" => {
                node.algorithm = Algorithm::from_name(value).ok_or_else(|| {
                    self.error_at(value_token, &format!("unknown algorithm '{}'", value))
                })?;
            }
            "mat" => node.material = Some(value.to_string()),
            "tex" => node.texture = Some(value.to_string()),
            "back" => node.back = Some(value.to_string()),
            "x" => node.x = int()?,
            "y" => node.y = int()?,
            "wdt" => node.wdt = int()?,
            "hgt" => node.hgt = int()?,
            "zoomx" => node.zoom_x = int()?,
            "zoomy" => node.zoom_y = int()?,
            "a" => node.a = int()?,
            "b" => node.b = int()?,
            "seed" => node.seed = int()? as u32,
            "invert" => node.invert = flag()?,
            "mask" => node.mask = flag()?,
            _ => {
                return Err(self.error_at(key_token, &format!("unknown attribute '{}'", key)));
            }
        }
        Ok(())
    }
}

fn parse_int(value: &str) -> Option<i32> {
    value.trim_end_matches('%').parse::<i32>().ok()
}
