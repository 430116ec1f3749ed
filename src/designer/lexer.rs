/// Lexical scanning for Kotlin/Compose source
///
/// Everything structural in the designer (function bodies, argument lists,
/// lambda bodies, validation counts) goes through this module so that a
/// brace or paren inside a string literal, char literal or comment is
/// never mistaken for a delimiter.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Char,
    LineComment,
    BlockComment,
    Whitespace,
    Newline,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// Whitespace, newlines and comments
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::LineComment | TokenKind::BlockComment
        )
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.input[self.pos..].starts_with(pattern)
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            self.advance_char();
        }
    }

    fn skip_line_comment(&mut self) {
        self.skip_while(|c| c != '\n');
    }

    fn skip_block_comment(&mut self) {
        // Kotlin block comments nest
        self.advance_char();
        self.advance_char();
        let mut depth = 1;
        while self.peek_char().is_some() {
            if self.starts_with("/*") {
                depth += 1;
                self.advance_char();
                self.advance_char();
            } else if self.starts_with("*/") {
                depth -= 1;
                self.advance_char();
                self.advance_char();
                if depth == 0 {
                    break;
                }
            } else {
                self.advance_char();
            }
        }
    }

    fn skip_string(&mut self) {
        if self.starts_with("\"\"\"") {
            self.pos += 3;
            while self.peek_char().is_some() {
                if self.starts_with("\"\"\"") {
                    self.pos += 3;
                    // """"" closes on the last three quotes
                    self.skip_while(|c| c == '"');
                    return;
                }
                if self.starts_with("${") {
                    self.skip_template();
                } else {
                    self.advance_char();
                }
            }
            return;
        }

        self.advance_char(); // opening quote
        while let Some(ch) = self.peek_char() {
            match ch {
                '\\' => {
                    self.advance_char();
                    if self.peek_char() != Some('\n') {
                        self.advance_char();
                    }
                }
                '"' => {
                    self.advance_char();
                    return;
                }
                // Unterminated literal: stop at the end of the line
                '\n' => return,
                '$' if self.peek_ahead(1) == Some('{') => self.skip_template(),
                _ => self.advance_char(),
            }
        }
    }

    fn skip_template(&mut self) {
        self.advance_char(); // $
        self.advance_char(); // {
        let mut depth = 1;
        while let Some(ch) = self.peek_char() {
            match ch {
                '"' => self.skip_string(),
                '\'' => self.skip_char_literal(),
                '/' if self.peek_ahead(1) == Some('*') => self.skip_block_comment(),
                '{' => {
                    depth += 1;
                    self.advance_char();
                }
                '}' => {
                    depth -= 1;
                    self.advance_char();
                    if depth == 0 {
                        return;
                    }
                }
                _ => self.advance_char(),
            }
        }
    }

    fn skip_char_literal(&mut self) {
        self.advance_char(); // opening quote
        if self.peek_char() == Some('\\') {
            self.advance_char();
        }
        if self.peek_char().is_some_and(|c| c != '\n') {
            self.advance_char();
        }
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                return;
            }
            self.advance_char();
            if ch == '\'' {
                return;
            }
        }
    }

    fn skip_number(&mut self) {
        self.skip_while(|c| c.is_alphanumeric() || c == '_');
        if self.peek_char() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
            self.skip_while(|c| c.is_alphanumeric() || c == '_');
        }
    }
}

/// Split source text into tokens. Never fails: unterminated literals and
/// comments simply run to the end of the line or input.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer { input: source, pos: 0 };
    let mut tokens = Vec::new();

    while let Some(ch) = lexer.peek_char() {
        let start = lexer.pos;
        let kind = if ch == '\n' {
            lexer.advance_char();
            TokenKind::Newline
        } else if ch.is_whitespace() {
            lexer.skip_while(|c| c.is_whitespace() && c != '\n');
            TokenKind::Whitespace
        } else if lexer.starts_with("//") {
            lexer.skip_line_comment();
            TokenKind::LineComment
        } else if lexer.starts_with("/*") {
            lexer.skip_block_comment();
            TokenKind::BlockComment
        } else if ch == '"' {
            lexer.skip_string();
            TokenKind::Str
        } else if ch == '\'' {
            lexer.skip_char_literal();
            TokenKind::Char
        } else if ch == '`' {
            lexer.advance_char();
            lexer.skip_while(|c| c != '`' && c != '\n');
            if lexer.peek_char() == Some('`') {
                lexer.advance_char();
            }
            TokenKind::Ident
        } else if ch.is_ascii_digit() {
            lexer.skip_number();
            TokenKind::Number
        } else if ch.is_alphabetic() || ch == '_' {
            lexer.skip_while(|c| c.is_alphanumeric() || c == '_');
            TokenKind::Ident
        } else {
            lexer.advance_char();
            TokenKind::Punct
        };

        tokens.push(Token {
            kind,
            start,
            end: lexer.pos,
        });
    }

    tokens
}

fn closing_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '{' => Some('}'),
        '[' => Some(']'),
        _ => None,
    }
}

/// Tokens of one source snapshot plus precomputed delimiter pairs
pub struct TokenStream<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pairs: Vec<Option<usize>>,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        let tokens = tokenize(source);
        let mut pairs = vec![None; tokens.len()];
        let mut stack: Vec<(usize, char)> = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            if token.kind != TokenKind::Punct {
                continue;
            }
            let ch = source[token.start..].chars().next().unwrap_or('\0');
            if let Some(close) = closing_for(ch) {
                stack.push((i, close));
            } else if matches!(ch, ')' | '}' | ']') {
                // A stray closer only matches if some opener of its kind is open;
                // openers skipped on the way stay unmatched.
                if let Some(depth) = stack.iter().rposition(|(_, close)| *close == ch) {
                    let (open_idx, _) = stack[depth];
                    stack.truncate(depth);
                    pairs[open_idx] = Some(i);
                    pairs[i] = Some(open_idx);
                }
            }
        }

        TokenStream { source, tokens, pairs }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, index: usize) -> &Token {
        &self.tokens[index]
    }

    pub fn text(&self, index: usize) -> &'a str {
        let token = &self.tokens[index];
        &self.source[token.start..token.end]
    }

    pub fn kind(&self, index: usize) -> Option<TokenKind> {
        self.tokens.get(index).map(|t| t.kind)
    }

    pub fn is_punct(&self, index: usize, ch: char) -> bool {
        match self.tokens.get(index) {
            Some(token) if token.kind == TokenKind::Punct => {
                self.source[token.start..].starts_with(ch)
            }
            _ => false,
        }
    }

    pub fn is_ident(&self, index: usize, word: &str) -> bool {
        self.kind(index) == Some(TokenKind::Ident) && self.text(index) == word
    }

    /// The matching delimiter of an opener or closer
    pub fn partner(&self, index: usize) -> Option<usize> {
        self.pairs.get(index).copied().flatten()
    }

    /// First non-trivia token at or after `index`, bounded by `limit`
    pub fn next_significant(&self, index: usize, limit: usize) -> Option<usize> {
        let limit = limit.min(self.tokens.len());
        (index..limit).find(|&i| !self.tokens[i].is_trivia())
    }

    /// Like `next_significant` but stops at a newline
    pub fn next_on_line(&self, index: usize, limit: usize) -> Option<usize> {
        let limit = limit.min(self.tokens.len());
        for i in index..limit {
            match self.tokens[i].kind {
                TokenKind::Newline => return None,
                TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment => continue,
                _ => return Some(i),
            }
        }
        None
    }

    /// Last non-trivia token strictly before `index`
    pub fn prev_significant(&self, index: usize) -> Option<usize> {
        (0..index.min(self.tokens.len())).rev().find(|&i| !self.tokens[i].is_trivia())
    }

    /// Index of the token starting exactly at `offset`
    pub fn index_at_offset(&self, offset: usize) -> Option<usize> {
        self.tokens
            .binary_search_by_key(&offset, |t| t.start)
            .ok()
    }

    /// Index of the first token starting at or after `offset`
    pub fn index_from_offset(&self, offset: usize) -> usize {
        self.tokens.partition_point(|t| t.start < offset)
    }
}

/// Offset of the delimiter matching the one at `open_offset`
pub fn find_matching(source: &str, open_offset: usize) -> Option<usize> {
    let stream = TokenStream::new(source);
    let index = stream.index_at_offset(open_offset)?;
    if stream.kind(index) != Some(TokenKind::Punct) {
        return None;
    }
    stream.partner(index).map(|i| stream.token(i).start)
}

/// Inner text of the first structural `{` at or after `from` and its
/// matching `}`. Unbalanced braces yield an empty string.
pub fn extract_function_body(source: &str, from: usize) -> String {
    let stream = TokenStream::new(source);
    let start = stream.index_from_offset(from);
    let open = (start..stream.len()).find(|&i| stream.is_punct(i, '{'));

    match open.and_then(|i| stream.partner(i).map(|close| (i, close))) {
        Some((open, close)) => {
            source[stream.token(open).end..stream.token(close).start].to_string()
        }
        None => String::new(),
    }
}

/// Split `text` at separators that sit outside any (), {}, [] group.
/// With `angles` set, `<...>` type arguments are also treated as groups,
/// which is what parameter lists need (`Map<String, Int>`).
/// Returns `(offset, piece)` pairs; blank pieces are dropped.
pub fn split_top_level(text: &str, separator: char, angles: bool) -> Vec<(usize, &str)> {
    let stream = TokenStream::new(text);
    let mut pieces = Vec::new();
    let mut piece_start = 0;
    let mut angle_depth = 0usize;
    let mut i = 0;

    while i < stream.len() {
        let token = *stream.token(i);
        if token.kind == TokenKind::Punct {
            let ch = text[token.start..].chars().next().unwrap_or('\0');
            if closing_for(ch).is_some() {
                match stream.partner(i) {
                    Some(close) => {
                        i = close + 1;
                        continue;
                    }
                    None => break,
                }
            }
            if angles && ch == '<' {
                angle_depth += 1;
            } else if angles && ch == '>' && angle_depth > 0 && !(i > 0 && stream.is_punct(i - 1, '-')) {
                angle_depth -= 1;
            } else if ch == separator && angle_depth == 0 {
                pieces.push((piece_start, &text[piece_start..token.start]));
                piece_start = token.end;
            }
        }
        i += 1;
    }
    pieces.push((piece_start, &text[piece_start..]));

    pieces
        .into_iter()
        .filter(|(_, piece)| !piece.trim().is_empty())
        .collect()
}

/// Maps byte offsets to 1-based line and column numbers
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { source, line_starts }
    }

    /// Column counts characters, not bytes
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self.source[line_start..offset].chars().count() + 1;
        (line, column)
    }
}

pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_call() {
        assert_eq!(
            kinds(r#"Text("Hi", fontSize = 16.sp)"#),
            vec![
                TokenKind::Ident,
                TokenKind::Punct,
                TokenKind::Str,
                TokenKind::Punct,
                TokenKind::Ident,
                TokenKind::Punct,
                TokenKind::Number,
                TokenKind::Punct,
                TokenKind::Ident,
                TokenKind::Punct,
            ]
        );
    }

    #[test]
    fn test_string_with_braces_is_one_token() {
        let tokens = tokenize(r#""a { b ) c""#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Str);
    }

    #[test]
    fn test_string_template_with_nested_string() {
        let source = r#""${if (a) "}" else "{"}" x"#;
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(&source[tokens[0].start..tokens[0].end], r#""${if (a) "}" else "{"}""#);
    }

    #[test]
    fn test_raw_string() {
        let source = "\"\"\"\n  }\n\"\"\" }";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].end, source.len() - 2);
    }

    #[test]
    fn test_unterminated_string_stops_at_newline() {
        let tokens = tokenize("\"abc\n}");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[2].kind, TokenKind::Punct);
    }

    #[test]
    fn test_char_literals_and_comments() {
        assert_eq!(
            kinds("'{' '\\'' // }\n/* { /* } */ */ x"),
            vec![TokenKind::Char, TokenKind::Char, TokenKind::Ident]
        );
    }

    #[test]
    fn test_number_does_not_swallow_dp() {
        let source = "16.dp 1.5f 0xFF6200EE";
        let texts: Vec<&str> = tokenize(source)
            .iter()
            .filter(|t| !t.is_trivia())
            .map(|t| &source[t.start..t.end])
            .collect();
        assert_eq!(texts, vec!["16", ".", "dp", "1.5f", "0xFF6200EE"]);
    }

    #[test]
    fn test_find_matching_skips_strings() {
        let source = r#"Text(")") + x"#;
        assert_eq!(find_matching(source, 4), Some(8));
    }

    #[test]
    fn test_find_matching_unbalanced() {
        assert_eq!(find_matching("Column( {", 6), None);
    }

    #[test]
    fn test_extract_function_body() {
        let source = "fun A() {\n    Text(\"}\")\n}\n";
        assert_eq!(extract_function_body(source, 0), "\n    Text(\"}\")\n");
    }

    #[test]
    fn test_extract_function_body_unbalanced_is_empty() {
        assert_eq!(extract_function_body("fun A() {\n    Column {\n", 0), "");
        assert_eq!(extract_function_body("no braces here", 0), "");
    }

    #[test]
    fn test_split_top_level() {
        let pieces = split_top_level(r#"a = f(1, 2), b = "x, y", c = { p, q -> p }"#, ',', false);
        let texts: Vec<&str> = pieces.iter().map(|(_, p)| p.trim()).collect();
        assert_eq!(texts, vec!["a = f(1, 2)", r#"b = "x, y""#, "c = { p, q -> p }"]);
    }

    #[test]
    fn test_split_top_level_with_generics() {
        let pieces = split_top_level("items: Map<String, Int>, onClick: (Int) -> Unit", ',', true);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[1].1.trim(), "onClick: (Int) -> Unit");
    }

    #[test]
    fn test_line_index() {
        let source = "ab\ncdé\nf";
        let index = LineIndex::new(source);
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(3), (2, 1));
        assert_eq!(index.line_col(source.len() - 1), (3, 1));
        assert_eq!(index.line_col(7), (2, 4));
    }

    #[test]
    fn test_stray_closer_does_not_break_pairs() {
        let stream = TokenStream::new("( ] )");
        assert_eq!(stream.partner(0), Some(4));
        assert_eq!(stream.partner(2), None);
    }
}
