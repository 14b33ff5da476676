use mg_core::{MapGenError, SourceSpan};

pub(crate) const PARSE_ERROR_CODE: &str = "LANDSCAPE_PARSE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word(String),
    OpenBrace,
    CloseBrace,
    Semicolon,
    Equals,
    End,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Word(word) => format!("'{}'", word),
            Self::OpenBrace => "'{'".to_string(),
            Self::CloseBrace => "'}'".to_string(),
            Self::Semicolon => "';'".to_string(),
            Self::Equals => "'='".to_string(),
            Self::End => "end of file".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

pub(crate) fn parse_error(filename: &str, line: usize, column: usize, message: &str) -> MapGenError {
    MapGenError::with_span(
        PARSE_ERROR_CODE,
        format!("{}:{}:{}: {}", filename, line, column, message),
        SourceSpan::at(line, column),
    )
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | '%' | '+')
}

pub(crate) fn tokenize(source: &str, filename: &str) -> Result<Vec<Token>, MapGenError> {
    let chars = source.chars().collect::<Vec<_>>();
    let mut tokens = Vec::new();
    let mut index = 0usize;
    let mut line = 1usize;
    let mut column = 1usize;

    while index < chars.len() {
        let ch = chars[index];
        let next = chars.get(index + 1).copied();

        if ch == '\n' {
            index += 1;
            line += 1;
            column = 1;
            continue;
        }
        if ch.is_whitespace() {
            index += 1;
            column += 1;
            continue;
        }

        if ch == '/' && next == Some('/') {
            while index < chars.len() && chars[index] != '\n' {
                index += 1;
            }
            continue;
        }

        if ch == '/' && next == Some('*') {
            let (start_line, start_column) = (line, column);
            index += 2;
            column += 2;
            loop {
                match (chars.get(index), chars.get(index + 1)) {
                    (Some('*'), Some('/')) => {
                        index += 2;
                        column += 2;
                        break;
                    }
                    (Some('\n'), _) => {
                        index += 1;
                        line += 1;
                        column = 1;
                    }
                    (Some(_), _) => {
                        index += 1;
                        column += 1;
                    }
                    (None, _) => {
                        return Err(parse_error(
                            filename,
                            start_line,
                            start_column,
                            "unterminated block comment",
                        ))
                    }
                }
            }
            continue;
        }

        let punct = match ch {
            '{' => Some(TokenKind::OpenBrace),
            '}' => Some(TokenKind::CloseBrace),
            ';' => Some(TokenKind::Semicolon),
            '=' => Some(TokenKind::Equals),
            _ => None,
        };
        if let Some(kind) = punct {
            tokens.push(Token { kind, line, column });
            index += 1;
            column += 1;
            continue;
        }

        if is_word_char(ch) {
            let start_column = column;
            let mut word = String::new();
            while index < chars.len() && is_word_char(chars[index]) {
                word.push(chars[index]);
                index += 1;
                column += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Word(word),
                line,
                column: start_column,
            });
            continue;
        }

        return Err(parse_error(
            filename,
            line,
            column,
            &format!("unexpected character '{}'", ch),
        ));
    }

    tokens.push(Token {
        kind: TokenKind::End,
        line,
        column,
    });
    Ok(tokens)
}
