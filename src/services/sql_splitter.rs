// SQL文分割
//
// マイグレーション本文を `;` 区切りで個々の文に分割する。
// 文字列リテラル、引用符付き識別子、ドル引用（$tag$ ... $tag$）、
// 行コメント（--）とブロックコメント（/* */、入れ子可）内の `;` は区切りとして扱わない。
// 同じ字句解析を、参照テーブル抽出とパラメータ数の計算でも使う。

use std::iter::Peekable;
use std::str::CharIndices;

/// 字句の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// コメントでもリテラルでもないSQL
    Code,
    /// 文字列リテラル（`'...'` またはドル引用）
    Literal,
    /// 引用符付き識別子（`"..."`）
    QuotedIdentifier,
    /// 行コメントまたはブロックコメント
    Comment,
}

#[derive(Debug, PartialEq)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(usize),
    DollarQuoted(String),
}

impl State {
    fn kind(&self) -> TokenKind {
        match self {
            State::Normal => TokenKind::Code,
            State::SingleQuoted | State::DollarQuoted(_) => TokenKind::Literal,
            State::DoubleQuoted => TokenKind::QuotedIdentifier,
            State::LineComment | State::BlockComment(_) => TokenKind::Comment,
        }
    }
}

/// `end` より前の位置の文字を読み飛ばす
fn skip_to(chars: &mut Peekable<CharIndices<'_>>, end: usize) {
    while chars.next_if(|&(j, _)| j < end).is_some() {}
}

fn push_token<'a>(tokens: &mut Vec<(TokenKind, &'a str)>, kind: TokenKind, text: &'a str) {
    if !text.is_empty() {
        tokens.push((kind, text));
    }
}

/// SQLをコード、リテラル、引用符付き識別子、コメントに分解する
///
/// 連結すると元のSQLに戻ります。閉じられていないリテラルやコメントは末尾までを1つの字句とします。
pub fn tokenize(sql: &str) -> Vec<(TokenKind, &str)> {
    let mut tokens = Vec::new();
    let mut state = State::Normal;
    let mut start = 0;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);

        match &state {
            State::Normal => {
                let opened = match (c, next) {
                    ('-', Some('-')) => Some((State::LineComment, 2)),
                    ('/', Some('*')) => Some((State::BlockComment(1), 2)),
                    ('\'', _) => Some((State::SingleQuoted, 1)),
                    ('"', _) => Some((State::DoubleQuoted, 1)),
                    ('$', _) => dollar_tag_at(&sql[i..])
                        .map(|tag| (State::DollarQuoted(tag.to_string()), tag.len())),
                    _ => None,
                };
                if let Some((opened, width)) = opened {
                    push_token(&mut tokens, TokenKind::Code, &sql[start..i]);
                    start = i;
                    skip_to(&mut chars, i + width);
                    state = opened;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    push_token(&mut tokens, TokenKind::Comment, &sql[start..i]);
                    start = i;
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                let depth = *depth;
                if c == '/' && next == Some('*') {
                    chars.next();
                    state = State::BlockComment(depth + 1);
                } else if c == '*' && next == Some('/') {
                    chars.next();
                    if depth == 1 {
                        push_token(&mut tokens, TokenKind::Comment, &sql[start..i + 2]);
                        start = i + 2;
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
            State::SingleQuoted | State::DoubleQuoted => {
                let quote = if state == State::SingleQuoted { '\'' } else { '"' };
                if c == quote {
                    // 二重にした引用符はエスケープ
                    if next == Some(quote) {
                        chars.next();
                    } else {
                        push_token(&mut tokens, state.kind(), &sql[start..=i]);
                        start = i + 1;
                        state = State::Normal;
                    }
                }
            }
            State::DollarQuoted(tag) => {
                if c == '$' && sql[i..].starts_with(tag.as_str()) {
                    let end = i + tag.len();
                    skip_to(&mut chars, end);
                    push_token(&mut tokens, TokenKind::Literal, &sql[start..end]);
                    start = end;
                    state = State::Normal;
                }
            }
        }
    }

    push_token(&mut tokens, state.kind(), &sql[start..]);
    tokens
}

/// コメントを空白に、文字列リテラルを空リテラル（`''`）に置き換えたSQLを返す
///
/// 引用符付き識別子はそのまま残します。
pub fn mask_comments_and_literals(sql: &str) -> String {
    let mut masked = String::with_capacity(sql.len());
    for (kind, text) in tokenize(sql) {
        match kind {
            TokenKind::Code | TokenKind::QuotedIdentifier => masked.push_str(text),
            TokenKind::Literal => masked.push_str("''"),
            TokenKind::Comment => masked.push(' '),
        }
    }
    masked
}

/// SQLを文単位に分割する
///
/// 空の文とコメントだけの文は結果に含めない。
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;

    for (kind, text) in tokenize(sql) {
        match kind {
            TokenKind::Code => {
                for c in text.chars() {
                    if c == ';' {
                        if has_code {
                            statements.push(current.trim().to_string());
                        }
                        current.clear();
                        has_code = false;
                    } else {
                        has_code |= !c.is_whitespace();
                        current.push(c);
                    }
                }
            }
            TokenKind::Comment => current.push_str(text),
            TokenKind::Literal | TokenKind::QuotedIdentifier => {
                has_code = true;
                current.push_str(text);
            }
        }
    }

    if has_code {
        statements.push(current.trim().to_string());
    }

    statements
}

/// 先頭がドル引用の開始タグ（`$$` または `$tag$`）ならそのタグを返す
///
/// `$1` のような位置パラメータはタグとみなさない。
fn dollar_tag_at(s: &str) -> Option<&str> {
    let rest = &s[1..];
    let end = rest.find('$')?;
    let inner = &rest[..end];

    let valid = inner.is_empty()
        || (inner.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            && !inner.starts_with(|ch: char| ch.is_ascii_digit()));

    if valid {
        Some(&s[..end + 2])
    } else {
        None
    }
}
