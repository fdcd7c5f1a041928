//! Spoken formatting phrases to text.
//!
//! Conversion runs in two passes over the transcript words:
//!
//! - **parse**: greedy longest-prefix matching against a [`ConversionMap`],
//!   in a fixed priority (escape, symbol with "sign"/"symbol", symbol,
//!   literal symbol character, style name, template, then a plain word or
//!   number).
//! - **convert**: runs of words are joined and styled; a template node wraps
//!   everything after it, so "open tag div" nests arbitrarily deep.
//!
//! With `expression` set, a final pass spaces operators the way code is
//! usually written (`x = y + 1`, `f(a, b)`).

use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::core::contractions::restore_contractions;
use crate::core::conversion_map::{ConversionMap, Language, Phrase, Template, conversion_map};
use crate::core::numbers::convert_numbers;
use crate::core::text_style::{self, TextStyle};

/// How a slot's spoken text should come out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedTextOptions {
    /// Space operators like an expression.
    pub expression: bool,
    /// Style for plain word runs.
    pub style: TextStyle,
    /// Use this language's table instead of the caller's.
    pub language: Option<Language>,
}

impl Default for FormattedTextOptions {
    fn default() -> Self {
        FormattedTextOptions {
            expression: false,
            style: TextStyle::Lowercase,
            language: None,
        }
    }
}

impl FormattedTextOptions {
    pub fn expression() -> Self {
        FormattedTextOptions {
            expression: true,
            ..Self::default()
        }
    }

    pub fn camel_case_expression() -> Self {
        FormattedTextOptions {
            expression: true,
            style: TextStyle::CamelCase,
            language: None,
        }
    }

    pub fn camel_case_identifier() -> Self {
        FormattedTextOptions {
            style: TextStyle::CamelCase,
            ..Self::default()
        }
    }

    /// Build from option names; unknown names are ignored and the last style
    /// named wins.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut options = Self::default();
        for name in names {
            match name.as_ref() {
                "expression" => options.expression = true,
                "pascal" => options.style = TextStyle::PascalCase,
                "camel" => options.style = TextStyle::CamelCase,
                "underscores" => options.style = TextStyle::Underscores,
                "caps" => options.style = TextStyle::AllCaps,
                "capital" => options.style = TextStyle::Capitalized,
                "dashes" => options.style = TextStyle::Dashes,
                "lowercase" => options.style = TextStyle::Lowercase,
                _ => {}
            }
        }
        options
    }
}

#[derive(Debug, Clone)]
enum Node {
    Alpha(String),
    Number(String),
    OneWord,
    Style(TextStyle),
    Symbol(String),
    Template { template: Template, lowercase: bool },
}

impl Node {
    fn is_alpha(&self) -> bool {
        matches!(self, Node::Alpha(_))
    }

    fn is_number(&self) -> bool {
        matches!(self, Node::Number(_))
    }
}

struct Parser<'m> {
    words: Vec<String>,
    map: &'m ConversionMap,
    index: usize,
    nodes: Vec<Node>,
}

impl<'m> Parser<'m> {
    fn new(text: &str, map: &'m ConversionMap) -> Self {
        let words = restore_contractions(text)
            .split(' ')
            .map(str::to_string)
            .collect();
        Parser {
            words,
            map,
            index: 0,
            nodes: Vec::new(),
        }
    }

    /// Runs the first consumer that matches at each position. Plain text
    /// always matches, so every step advances.
    fn parse(mut self) -> Vec<Node> {
        let consumers: [fn(&mut Self) -> bool; 8] = [
            Self::consume_escaped,
            |p| p.consume_symbol(Some("sign")),
            |p| p.consume_symbol(Some("symbol")),
            |p| p.consume_symbol(None),
            Self::consume_symbol_character,
            Self::consume_style,
            Self::consume_template,
            Self::consume_text,
        ];
        while self.index < self.words.len() {
            if !consumers.iter().any(|consume| consume(&mut self)) {
                break;
            }
        }
        self.nodes
    }

    fn longest_prefix(&self, prefixes: &'m [Phrase]) -> Option<&'m Phrase> {
        let remaining = &self.words[self.index..];
        prefixes
            .iter()
            .find(|p| remaining.len() >= p.len() && remaining[..p.len()] == p[..])
    }

    /// `escape <word>` keeps the word literal.
    fn consume_escaped(&mut self) -> bool {
        match self.longest_prefix(self.map.escape_prefixes()) {
            Some(prefix) if self.index + prefix.len() < self.words.len() => {
                self.index += prefix.len();
                self.nodes.push(Node::Alpha(self.words[self.index].clone()));
                self.index += 1;
                true
            }
            _ => false,
        }
    }

    /// A symbol phrase, optionally followed by the word `postfix`.
    fn consume_symbol(&mut self, postfix: Option<&str>) -> bool {
        let Some(prefix) = self.longest_prefix(self.map.symbol_prefixes()) else {
            return false;
        };
        let mut consumed = prefix.len();
        if let Some(postfix) = postfix {
            if self.words.get(self.index + consumed).map(String::as_str) != Some(postfix) {
                return false;
            }
            consumed += 1;
        }
        let symbol = self.map.symbol(prefix).unwrap_or_default().to_string();
        self.nodes.push(Node::Symbol(symbol));
        self.index += consumed;
        true
    }

    fn consume_symbol_character(&mut self) -> bool {
        let word = &self.words[self.index];
        if is_symbol_character(word) {
            self.nodes.push(Node::Symbol(word.clone()));
            self.index += 1;
            return true;
        }
        false
    }

    fn consume_style(&mut self) -> bool {
        let Some(prefix) = self.longest_prefix(self.map.style_prefixes()) else {
            return false;
        };
        match self.map.style(prefix) {
            Some(style) => self.consume_prefixed(prefix.len(), Node::Style(style)),
            None => false,
        }
    }

    /// A prefix node that must be followed by one more word.
    fn consume_prefixed(&mut self, len: usize, node: Node) -> bool {
        if self.index + len >= self.words.len() {
            return false;
        }
        self.nodes.push(node);
        self.index += len;
        if !self.consume_escaped() {
            self.consume_text();
        }
        true
    }

    fn consume_template(&mut self) -> bool {
        let Some(prefix) = self.longest_prefix(self.map.template_prefixes()) else {
            return false;
        };
        let Some(template) = self.map.template(prefix) else {
            return false;
        };
        let lowercase = prefix.iter().any(|w| w == "quotes" || w == "quotations");
        self.nodes.push(Node::Template {
            template: template.clone(),
            lowercase,
        });
        self.index += prefix.len();
        true
    }

    fn consume_text(&mut self) -> bool {
        if let Some(prefix) = self.longest_prefix(self.map.one_word_prefixes()) {
            if self.consume_prefixed(prefix.len(), Node::OneWord) {
                return true;
            }
        }
        self.consume_number() || self.consume_alpha()
    }

    fn consume_number(&mut self) -> bool {
        match self.longest_prefix(self.map.numeral_prefixes()) {
            Some(prefix) if self.index + prefix.len() < self.words.len() => {
                let spoken = self.words[self.index + prefix.len()].as_str();
                let digits = match spoken {
                    "to" => "2".to_string(),
                    "for" => "4".to_string(),
                    s if is_digits(s) => s.to_string(),
                    _ => return false,
                };
                self.nodes.push(Node::Number(digits));
                self.index += prefix.len() + 1;
                true
            }
            Some(_) => false,
            None if is_digits(&self.words[self.index]) => {
                self.nodes.push(Node::Number(self.words[self.index].clone()));
                self.index += 1;
                true
            }
            None => false,
        }
    }

    fn consume_alpha(&mut self) -> bool {
        self.nodes.push(Node::Alpha(self.words[self.index].clone()));
        self.index += 1;
        true
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

struct Converter<'n> {
    nodes: &'n [Node],
    options: FormattedTextOptions,
    index: usize,
    result: String,
}

impl<'n> Converter<'n> {
    fn new(nodes: &'n [Node], options: FormattedTextOptions) -> Self {
        Converter {
            nodes,
            options,
            index: 0,
            result: String::new(),
        }
    }

    /// Join a run of words and numbers, then style it.
    ///
    /// A number sticks to the word before it. A word after an unstuck number
    /// sticks to that number. After a one-word marker nothing is spaced.
    fn consume_styled(&mut self, style: TextStyle) {
        let mut one_word = false;
        let mut stuck_left = false;
        let mut unstyled = String::new();
        let nodes = self.nodes;

        while let Some(node) = nodes.get(self.index) {
            let text = match node {
                Node::OneWord => {
                    one_word = true;
                    self.index += 1;
                    continue;
                }
                Node::Alpha(t) | Node::Number(t) => t,
                _ => break,
            };
            if !unstyled.is_empty() {
                let previous = &nodes[self.index - 1];
                if node.is_number() && previous.is_alpha() {
                    stuck_left = true;
                } else if !node.is_number() && previous.is_number() && !stuck_left {
                } else if !one_word {
                    unstyled.push(' ');
                    stuck_left = false;
                }
            }
            unstyled.push_str(text);
            self.index += 1;
        }

        if style == TextStyle::Lowercase {
            // Raw, so contractions keep their capitals.
            self.result.push_str(&unstyled);
        } else {
            self.result.push_str(&text_style::style(&unstyled, style));
        }
    }

    fn convert(mut self) -> String {
        let nodes = self.nodes;
        while let Some(node) = nodes.get(self.index) {
            match node {
                Node::Style(style) => {
                    if self.index > 0 && nodes[self.index - 1].is_alpha() {
                        self.result.push(' ');
                    }
                    self.index += 1;
                    self.consume_styled(*style);
                }
                Node::Template { template, lowercase } => {
                    let mut inner_options = self.options;
                    if *lowercase {
                        inner_options.style = TextStyle::Lowercase;
                    }
                    let inner = Converter::new(&nodes[self.index + 1..], inner_options).convert();
                    self.result.push_str(&template.apply(&inner));
                    return self.result;
                }
                Node::Symbol(symbol) => {
                    self.result.push_str(symbol);
                    self.index += 1;
                }
                Node::Alpha(_) | Node::Number(_) | Node::OneWord => {
                    let style = self.options.style;
                    self.consume_styled(style);
                }
            }
        }
        self.result
    }
}

/// Convert spoken `text` with the table `map`, or the table for
/// `options.language` when one is set.
pub fn convert(text: &str, options: &FormattedTextOptions, map: &ConversionMap) -> String {
    let overridden;
    let map = match options.language {
        Some(language) if language != map.language() => {
            overridden = conversion_map(language);
            &*overridden
        }
        _ => map,
    };

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return String::new();
    }
    let text = convert_numbers(&text);
    let nodes = Parser::new(&text, map).parse();
    let result = Converter::new(&nodes, *options).convert();
    tracing::trace!(input = %text, output = %result, "formatted text");

    if options.expression {
        apply_expression_styling(&result)
    } else {
        result
    }
}

pub fn convert_for_language(text: &str, options: &FormattedTextOptions, language: Language) -> String {
    convert(text, options, &conversion_map(language))
}

fn parse_default(text: &str, map: &ConversionMap) -> Vec<Node> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return Vec::new();
    }
    Parser::new(&text, map).parse()
}

/// Whether `text` says anything besides plain words and numbers.
pub fn contains_non_alpha_numeric(text: &str) -> bool {
    let map = conversion_map(Language::Default);
    parse_default(text, &map)
        .iter()
        .any(|n| !n.is_alpha() && !n.is_number())
}

/// Whether `text` names a style, or an underscore anywhere but first.
pub fn contains_styled_text(text: &str, language: Language) -> bool {
    let map = conversion_map(language);
    parse_default(text, &map)
        .iter()
        .enumerate()
        .any(|(i, n)| match n {
            Node::Style(_) => true,
            Node::Symbol(s) => s == "_" && i > 0,
            _ => false,
        })
}

pub fn is_enclosure_pair(s: &str) -> bool {
    matches!(s, "()" | "[]" | "{}" | "<>" | "\"\"" | "''")
}

/// A single character that is neither a letter nor a digit.
pub fn is_symbol_character(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => !c.is_alphabetic() && !c.is_numeric(),
        _ => false,
    }
}

const START_BOUNDARY: &str = r"(^|[a-zA-Z0-9_\)\]\$])";
const END_BOUNDARY: &str = r#"([a-zA-Z0-9_\(\)\[\]\{\}'"\-\+])"#;

const BETWEEN_SYMBOLS: [&str; 2] = ["=>", "->"];
const OPERATORS: [&str; 28] = [
    "==", "!=", ">=", "<=", "+=", "-=", "*=", "/=", "%=", "//=", "**=", "^=", "&=", ">>", "<<",
    "||", "&&", "=", ">", "<", "+", "*", "**", "/", "//", "|", "&", "%",
];
const LEADING_OPERATORS: [&str; 1] = ["-"];

struct SpacingRule {
    squeeze: Regex,
    symbol: &'static str,
}

struct WrapRule {
    pattern: Regex,
    symbol: &'static str,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid expression pattern")
}

static SQUEEZE: LazyLock<Vec<SpacingRule>> = LazyLock::new(|| {
    BETWEEN_SYMBOLS
        .iter()
        .chain(OPERATORS.iter())
        .chain(LEADING_OPERATORS.iter())
        .map(|&symbol| SpacingRule {
            squeeze: compile(&format!(r"\s*{}\s*", regex::escape(symbol))),
            symbol,
        })
        .collect()
});

static WRAP: LazyLock<Vec<WrapRule>> = LazyLock::new(|| {
    let operators = OPERATORS.iter().map(|&symbol| WrapRule {
        pattern: compile(&format!("{START_BOUNDARY}{}{END_BOUNDARY}", regex::escape(symbol))),
        symbol,
    });
    let leading = LEADING_OPERATORS.iter().map(|&symbol| WrapRule {
        pattern: compile(&format!(r"([a-zA-Z0-9_\)\]]){}{END_BOUNDARY}", regex::escape(symbol))),
        symbol,
    });
    operators.chain(leading).collect()
});

static EMPTY_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"([a-zA-Z0-9_\$])\[\]{END_BOUNDARY}")));
static COMMA: LazyLock<Regex> = LazyLock::new(|| compile(&format!("{START_BOUNDARY},{END_BOUNDARY}")));
static INCREMENT: LazyLock<Regex> = LazyLock::new(|| compile(r"\s*\+ \+"));
static DECREMENT: LazyLock<Regex> = LazyLock::new(|| compile(r"\s*- -"));
static ANGLE_PAIR: LazyLock<Regex> = LazyLock::new(|| compile(r"\s*<\s*(.+)\s*>\s*"));
static CLOSE_ANGLE_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"(\w+)>(\w+)"));
static ASSIGN_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"(\w+)=<(\w+)>"));
static WORD_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(\w+)\b<(\w+)>"));

/// Apply `pattern` until nothing changes; boundary characters are consumed
/// by a match, so adjacent operators need another pass.
fn replace_to_fixpoint(source: String, pattern: &Regex, replace: impl Fn(&Captures<'_>) -> String) -> String {
    let mut current = source;
    loop {
        let next = pattern.replace_all(&current, |c: &Captures<'_>| replace(c)).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn apply_expression_styling(source: &str) -> String {
    let mut s = source.to_string();
    for rule in SQUEEZE.iter() {
        s = rule.squeeze.replace_all(&s, NoExpand(rule.symbol)).into_owned();
    }
    for rule in WRAP.iter() {
        s = replace_to_fixpoint(s, &rule.pattern, |c| format!("{} {} {}", &c[1], rule.symbol, &c[2]));
    }

    s = EMPTY_BRACKETS
        .replace_all(&s, |c: &Captures<'_>| format!("{}[] {}", &c[1], &c[2]))
        .into_owned();
    s = replace_to_fixpoint(s, &COMMA, |c| format!("{}, {}", &c[1], &c[2]));
    s = INCREMENT.replace_all(&s, "++").into_owned();
    s = DECREMENT.replace_all(&s, "--").into_owned();

    // Angle brackets around a single span are generics or tags, not
    // comparisons.
    if let Some(inner) = ANGLE_PAIR.captures(&s).and_then(|c| c.get(1)) {
        let collapsed = format!("<{}>", inner.as_str().trim());
        s = ANGLE_PAIR.replace_all(&s, NoExpand(&collapsed)).into_owned();
    }
    s = CLOSE_ANGLE_WORD.replace_all(&s, "${1}> ${2}").into_owned();
    // "foo = <div>" and "return <div>"
    s = ASSIGN_TAG.replace_all(&s, "${1} = <${2}>").into_owned();
    s = WORD_TAG.replace_all(&s, "${1} <${2}>").into_owned();

    for symbol in BETWEEN_SYMBOLS {
        s = s.replace(symbol, &format!(" {symbol} "));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(text: &str, options: FormattedTextOptions) -> String {
        convert_for_language(text, &options, Language::Default)
    }

    fn plain(text: &str) -> String {
        fmt(text, FormattedTextOptions::default())
    }

    #[test]
    fn test_symbols_and_words() {
        assert_eq!(plain("x equals y plus one"), "x=y+1");
        assert_eq!(plain("equals sign"), "=");
        assert_eq!(plain("comma symbol"), ",");
        assert_eq!(plain("hello   world"), "hello world");
        assert_eq!(plain(""), "");
    }

    #[test]
    fn test_expression_spacing() {
        let e = FormattedTextOptions::expression();
        assert_eq!(fmt("x equals y plus one", e), "x = y + 1");
        assert_eq!(fmt("a plus b plus c", e), "a + b + c");
        assert_eq!(fmt("a double equals b", e), "a == b");
        assert_eq!(fmt("a is less than b", e), "a < b");
        assert_eq!(fmt("f of a comma b", e), "f(a, b)");
        assert_eq!(fmt("i plus plus", e), "i++");
        assert_eq!(fmt("i minus minus", e), "i--");
        assert_eq!(fmt("negative one", e), "-1");
    }

    #[test]
    fn test_styles() {
        assert_eq!(plain("camel case get user name"), "getUserName");
        assert_eq!(plain("snake case get user"), "get_user");
        assert_eq!(plain("all caps max size"), "MAX_SIZE");
        assert_eq!(fmt("hello world", FormattedTextOptions::camel_case_identifier()), "helloWorld");
        assert_eq!(plain("say pascal hello world"), "say HelloWorld");
    }

    #[test]
    fn test_numbers_stick_left() {
        assert_eq!(plain("foo two bar"), "foo2 bar");
        assert_eq!(plain("two bar"), "2bar");
        let snake = FormattedTextOptions::from_names(&["underscores"]);
        assert_eq!(fmt("foo two bar", snake), "foo2_bar");
        assert_eq!(plain("numeral to"), "2");
        assert_eq!(plain("numeral for"), "4");
    }

    #[test]
    fn test_escape_and_one_word() {
        assert_eq!(plain("escape equals"), "equals");
        assert_eq!(plain("one word foo bar"), "foobar");
        assert_eq!(plain("escape"), "escape");
    }

    #[test]
    fn test_first_matching_consumer_wins() {
        assert_eq!(plain("escape equals sign"), "equals sign");
        assert_eq!(plain("x equals sign y"), "x=y");
        assert_eq!(plain(&vec!["word"; 500].join(" ")), vec!["word"; 500].join(" "));
    }

    #[test]
    fn test_templates() {
        assert_eq!(plain("open tag div"), "<div>");
        assert_eq!(plain("close tag div"), "</div>");
        let camel = FormattedTextOptions::camel_case_identifier();
        assert_eq!(fmt("in quotes hello world", camel), "\"hello world\"");
        assert_eq!(fmt("call get user", camel), "(getUser)");
        assert_eq!(plain("print of in quotes hi"), "print(\"hi\")");
    }

    #[test]
    fn test_contractions_are_restored() {
        assert_eq!(plain("i ' m here"), "I'm here");
        assert_eq!(plain("don ' t"), "don't");
    }

    #[test]
    fn test_language_override() {
        let py = FormattedTextOptions {
            language: Some(Language::Python),
            ..FormattedTextOptions::default()
        };
        assert_eq!(fmt("a and b", py), "a and b");
        assert_eq!(plain("a and b"), "a&&b");
    }

    #[test]
    fn test_queries() {
        assert!(!contains_non_alpha_numeric("hello world two"));
        assert!(contains_non_alpha_numeric("hello dot world"));
        assert!(contains_styled_text("camel case foo", Language::Default));
        assert!(contains_styled_text("foo underscore bar", Language::Default));
        assert!(!contains_styled_text("underscore bar", Language::Default));
        assert!(is_enclosure_pair("[]"));
        assert!(!is_enclosure_pair("[)"));
        assert!(is_symbol_character("("));
        assert!(!is_symbol_character("a"));
        assert!(!is_symbol_character("(("));
    }

    #[test]
    fn test_options_from_names() {
        let o = FormattedTextOptions::from_names(&["expression", "camel", "sparkly"]);
        assert!(o.expression);
        assert_eq!(o.style, TextStyle::CamelCase);
        assert_eq!(FormattedTextOptions::from_names::<&str>(&[]), FormattedTextOptions::default());
    }
}
