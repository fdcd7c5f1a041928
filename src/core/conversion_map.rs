//! Per-language tables of spoken phrases.
//!
//! - One builder fills the shared base table (symbols, enclosures, styles,
//!   templates) and then applies a small per-language override record.
//! - Phrases are stored as word lists; prefix lists are sorted longest first
//!   so the parser always takes the longest match.
//! - Built tables live for the whole process in a `moka` cache.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};

use crate::core::error::LanguageError;
use crate::core::placeholder::{CURSOR, wrap_in_slot};
use crate::core::text_style::TextStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Default,
    Go,
    JavaScript,
    TypeScript,
    Python,
    Text,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Default,
        Language::Go,
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Text,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Language::Default => "default",
            Language::Go => "go",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Text => "text",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let language = match s.trim().to_ascii_lowercase().as_str() {
            "default" | "" => Language::Default,
            "go" | "golang" => Language::Go,
            "javascript" | "js" => Language::JavaScript,
            "typescript" | "ts" => Language::TypeScript,
            "python" | "py" => Language::Python,
            "text" | "none" | "plaintext" => Language::Text,
            other => return Err(LanguageError::not_supported(other, "formatted text")),
        };
        Ok(language)
    }
}

/// A wrapper built around not-yet-known inner text.
///
/// `{inner}` is replaced by the inner text, `{cursor}` and `{cursor2}` by
/// cursor placeholders of priority 0 and 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    pub fn new(pattern: impl Into<String>) -> Self {
        Template(pattern.into())
    }

    fn enclosure(start: &str, stop: &str) -> Self {
        Template(format!("{start}{{inner}}{stop}"))
    }

    pub fn apply(&self, inner: &str) -> String {
        let mut out = String::with_capacity(self.0.len() + inner.len());
        let mut rest = self.0.as_str();
        while let Some(i) = rest.find('{') {
            out.push_str(&rest[..i]);
            let tail = &rest[i..];
            if let Some(after) = tail.strip_prefix("{inner}") {
                out.push_str(inner);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{cursor2}") {
                out.push_str(&wrap_in_slot(&format!("{CURSOR}2")));
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{cursor}") {
                out.push_str(&wrap_in_slot(CURSOR));
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

pub type Phrase = Vec<String>;

fn phrase(name: &str) -> Phrase {
    name.split(' ').map(str::to_string).collect()
}

const STYLES: &[(&str, TextStyle)] = &[
    ("all caps", TextStyle::AllCaps),
    ("caps", TextStyle::AllCaps),
    ("camel case", TextStyle::CamelCase),
    ("camelcase", TextStyle::CamelCase),
    ("camel", TextStyle::CamelCase),
    ("capital", TextStyle::Capitalized),
    ("dashes", TextStyle::Dashes),
    ("lower case", TextStyle::Lowercase),
    ("lowercase", TextStyle::Lowercase),
    ("pascal case", TextStyle::PascalCase),
    ("pascal", TextStyle::PascalCase),
    ("pascalcase", TextStyle::PascalCase),
    ("snake", TextStyle::Underscores),
    ("snake case", TextStyle::Underscores),
    ("underscores", TextStyle::Underscores),
    ("title", TextStyle::TitleCase),
    ("title case", TextStyle::TitleCase),
    ("upper", TextStyle::AllCaps),
    ("uppercase", TextStyle::AllCaps),
];

const SYMBOLS: &[(&str, &str)] = &[
    ("comma", ","),
    ("colon", ":"),
    ("period", "."),
    ("semicolon", ";"),
    ("exclamation point", "!"),
    ("exclamation mark", "!"),
    ("tilde", "~"),
    ("dash", "-"),
    ("backslash", "\\"),
    ("slash", "/"),
    ("ampersand", "&"),
    ("question mark", "?"),
    ("asterisk", "*"),
    ("apostrophe", "'"),
    ("space", " "),
    ("plus", "+"),
    ("minus", "-"),
    ("binary or", "|"),
    ("binary xor", "^"),
    ("binary complement", "~"),
    ("colon colon", "::"),
    ("double colon", "::"),
    ("divided by integer", "//"),
    ("divided by", "/"),
    ("divide", "/"),
    ("equal equal", "=="),
    ("equals equals", "=="),
    ("double equals", "=="),
    ("double equal", "=="),
    ("triple equals", "==="),
    ("triple equal", "==="),
    ("dot", "."),
    ("triple dot", "..."),
    ("ellipsis", "..."),
    ("equals", "="),
    ("equal", "="),
    ("hashtag", "#"),
    ("caret", "^"),
    ("percent", "%"),
    ("double underscore", "__"),
    ("underscore", "_"),
    ("is less than or equal to", "<="),
    ("less than or equal to", "<="),
    ("is less than", "<"),
    ("less than", "<"),
    ("is greater than or equal to", ">="),
    ("greater than or equal to", ">="),
    ("is greater than", ">"),
    ("greater than", ">"),
    ("is not equal to", "!="),
    ("not equal to", "!="),
    ("not equals", "!="),
    ("not equal", "!="),
    ("is equal to", "=="),
    ("equal to", "=="),
    ("left shift", "<<"),
    ("right shift", ">>"),
    ("and", "&&"),
    ("or", "||"),
    ("point", "."),
    ("dunder", "__"),
    ("bang", "!"),
    ("exclam", "!"),
    ("negative", "-"),
    ("not", "!"),
    ("mod", "%"),
    ("modulo", "%"),
    ("times", "*"),
    ("at", "@"),
    ("dollar", "$"),
    ("right arrow", "->"),
    ("arrow", "->"),
    ("hash", "#"),
    ("star", "*"),
    ("star star", "**"),
    ("double star", "**"),
    ("to the power of", "**"),
    ("empty string", "\"\""),
    ("empty list", "[]"),
    ("diamond", "<>"),
    ("tick", "`"),
    ("forward slash", "/"),
    ("semi", ";"),
    ("plus equals", "+="),
    ("minus equals", "-="),
    ("divide equals", "/="),
    ("times equals", "*="),
    ("mod equals", "%="),
];

/// Name, opening symbol, closing symbol, plural.
const PAIRED_ENCLOSURES: &[(&str, &str, &str, &str)] = &[
    ("parenthesee", "(", ")", "parenthesees"),
    ("parenthesis", "(", ")", "parentheses"),
    ("square bracket", "[", "]", "square brackets"),
    ("angle bracket", "<", ">", "angle brackets"),
    ("curly brace", "{", "}", "curly braces"),
    ("curly bracket", "{", "}", "curly brackets"),
    ("quote", "\"", "\"", "quotes"),
    ("quotation", "\"", "\"", "quotations"),
];

/// Name and the symbol that both opens and closes.
const SYMMETRIC_ENCLOSURES: &[(&str, &str)] = &[
    ("single quote", "'"),
    ("double quote", "\""),
    ("backtick", "`"),
];

const SHORT_PAIRED_ENCLOSURES: &[(&str, &str, &str, &str)] = &[
    ("paren", "(", ")", "parens"),
    ("bracket", "[", "]", "brackets"),
    ("sub", "[", "]", "subs"),
    ("brace", "{", "}", "braces"),
    ("comparator", "<", ">", "comparators"),
];

const LATE_SYMMETRIC_ENCLOSURES: &[(&str, &str)] = &[
    ("double quotation", "\""),
    ("triple quote", "\"\"\""),
    ("triple quotation", "\"\"\""),
    ("double underscore", "__"),
    ("pipe", "|"),
];

const LAMBDA_PREFIXES: &[&str] = &["lambda", "lambda of"];

/// Differences from the base table for one language.
struct Overrides {
    symbols: &'static [(&'static str, &'static str)],
    removed_symbols: &'static [&'static str],
    removed_enclosures: &'static [&'static str],
    removed_enclosure_symbols: &'static [&'static str],
    removed_templates: &'static [&'static str],
    lambda: Option<&'static str>,
    comment_prefix: &'static str,
    indentation: usize,
    statement_terminator: &'static str,
}

const BASE: Overrides = Overrides {
    symbols: &[],
    removed_symbols: &[],
    removed_enclosures: &[],
    removed_enclosure_symbols: &[],
    removed_templates: &[],
    lambda: None,
    comment_prefix: "// ",
    indentation: 2,
    statement_terminator: ";",
};

const GO: Overrides = Overrides {
    indentation: 4,
    statement_terminator: "",
    ..BASE
};

const JAVASCRIPT: Overrides = Overrides {
    symbols: &[
        ("right arrow", "=>"),
        ("arrow", "=>"),
        ("typeof", "typeof "),
        ("instance of", " instanceof "),
        ("instanceof", " instanceof "),
        ("const", "const "),
        ("let", "let "),
        ("var", "var "),
    ],
    lambda: Some("({inner}{cursor}) => {\n}"),
    ..BASE
};

const PYTHON: Overrides = Overrides {
    symbols: &[
        ("and", " and "),
        ("or", " or "),
        ("not", "not "),
        ("is", " is "),
        ("del attr", "delattr"),
        ("get attr", "getattr"),
        ("has attr", "hasattr"),
        ("set attr", "setattr"),
        ("non local", "nonlocal"),
        ("is instance", "isinstance"),
        ("is subclass", "issubclass"),
        ("class method", "classmethod"),
        ("static method", "staticmethod"),
        ("frozen set", "frozenset"),
        ("true", "True"),
        ("false", "False"),
        ("none", "None"),
        ("exponent", "**"),
    ],
    lambda: Some("lambda {inner}{cursor}: {inner}"),
    comment_prefix: "# ",
    indentation: 4,
    statement_terminator: "",
    ..BASE
};

const TEXT: Overrides = Overrides {
    removed_symbols: &[
        "and",
        "or",
        "binary or",
        "binary xor",
        "binary complement",
        "bang",
        "exclam",
        "not",
        "mod",
        "diamond",
        "semi",
        "times",
    ],
    removed_enclosures: &["of", "call"],
    removed_enclosure_symbols: &["sub"],
    removed_templates: &["open tag", "close tag", "empty tag", "tag"],
    ..BASE
};

/// Phrase tables for one language. Immutable once built.
#[derive(Debug, Clone)]
pub struct ConversionMap {
    language: Language,
    symbols: IndexMap<Phrase, String>,
    styles: IndexMap<Phrase, TextStyle>,
    templates: IndexMap<Phrase, Template>,
    enclosures: IndexMap<String, (String, String)>,
    escape_prefixes: Vec<Phrase>,
    numeral_prefixes: Vec<Phrase>,
    one_word_prefixes: Vec<Phrase>,
    symbol_prefixes: Vec<Phrase>,
    style_prefixes: Vec<Phrase>,
    template_prefixes: Vec<Phrase>,
    comment_prefix: String,
    comment_postfix: String,
    indentation: usize,
    statement_terminator: String,
}

impl ConversionMap {
    pub fn build(language: Language) -> Self {
        let overrides = match language {
            Language::Default => &BASE,
            Language::Go => &GO,
            Language::JavaScript | Language::TypeScript => &JAVASCRIPT,
            Language::Python => &PYTHON,
            Language::Text => &TEXT,
        };

        let mut map = ConversionMap {
            language,
            symbols: IndexMap::new(),
            styles: IndexMap::new(),
            templates: IndexMap::new(),
            enclosures: IndexMap::new(),
            escape_prefixes: Vec::new(),
            numeral_prefixes: Vec::new(),
            one_word_prefixes: Vec::new(),
            symbol_prefixes: Vec::new(),
            style_prefixes: Vec::new(),
            template_prefixes: Vec::new(),
            comment_prefix: overrides.comment_prefix.to_string(),
            comment_postfix: String::new(),
            indentation: overrides.indentation,
            statement_terminator: overrides.statement_terminator.to_string(),
        };
        map.register_base();
        map.apply(overrides);
        map.sort_prefixes();
        map
    }

    fn register_base(&mut self) {
        for &(name, style) in STYLES {
            self.styles.insert(phrase(name), style);
        }
        for &(name, symbol) in SYMBOLS {
            self.register_symbol(name, symbol);
        }
        for &(name, start, stop, plural) in PAIRED_ENCLOSURES {
            self.register_enclosure_and_symbols(name, start, stop, plural);
        }
        for &(name, symbol) in SYMMETRIC_ENCLOSURES {
            self.register_symmetric_enclosure(name, symbol);
        }
        for &(name, start, stop, plural) in SHORT_PAIRED_ENCLOSURES {
            self.register_enclosure_and_symbols(name, start, stop, plural);
        }
        for &(name, symbol) in LATE_SYMMETRIC_ENCLOSURES {
            self.register_symmetric_enclosure(name, symbol);
        }

        self.register_enclosure("of", "(", ")");
        self.register_enclosure("call", "(", ")");
        // "underscores" is a style; "in underscores" wraps in dunders.
        self.register_enclosure("in underscores", "__", "__");

        self.register_template("open tag", Template::new("<{inner}>"));
        self.register_template("close tag", Template::new("</{inner}>"));
        self.register_template("empty tag", Template::new("<{inner} />"));
        self.register_template("tag", Template::new("<{inner}>{cursor2}</{inner}>"));

        self.escape_prefixes.push(phrase("escape"));
        self.one_word_prefixes.push(phrase("1 word"));
        self.register_symbol("newline", "\n");
        self.numeral_prefixes.push(phrase("numeral"));
    }

    fn apply(&mut self, overrides: &Overrides) {
        if let Some(lambda) = overrides.lambda {
            for &prefix in LAMBDA_PREFIXES {
                self.register_template(prefix, Template::new(lambda));
            }
        }
        for &(name, symbol) in overrides.symbols {
            self.register_symbol(name, symbol);
        }
        for name in overrides.removed_symbols {
            self.symbols.shift_remove(&phrase(name));
        }
        for name in overrides.removed_enclosures {
            self.remove_enclosure(name);
        }
        for name in overrides.removed_enclosure_symbols {
            let plural = format!("{name}s");
            self.remove_enclosure(&format!("in {plural}"));
            self.symbols.shift_remove(&phrase(&plural));
            self.symbols.shift_remove(&phrase(name));
        }
        for name in overrides.removed_templates {
            self.templates.shift_remove(&phrase(name));
        }
    }

    fn register_symbol(&mut self, name: &str, symbol: &str) {
        self.symbols.insert(phrase(name), symbol.to_string());
    }

    fn register_template(&mut self, name: &str, template: Template) {
        self.templates.insert(phrase(name), template);
    }

    fn register_enclosure(&mut self, name: &str, start: &str, stop: &str) {
        self.enclosures
            .insert(name.to_string(), (start.to_string(), stop.to_string()));
        self.register_template(name, Template::enclosure(start, stop));
    }

    fn remove_enclosure(&mut self, name: &str) {
        self.enclosures.shift_remove(name);
        self.templates.shift_remove(&phrase(name));
    }

    fn register_enclosure_and_symbols(&mut self, name: &str, start: &str, stop: &str, plural: &str) {
        self.register_enclosure(&format!("in {plural}"), start, stop);
        self.register_symbol(plural, &format!("{start}{stop}"));
        self.register_symbol(name, start);
        if start != stop {
            for side in ["left", "open"] {
                self.register_symbol(&format!("{side} {name}"), start);
            }
            for side in ["right", "close", "end"] {
                self.register_symbol(&format!("{side} {name}"), stop);
            }
        }
    }

    fn register_symmetric_enclosure(&mut self, name: &str, symbol: &str) {
        let plural = format!("{name}s");
        self.register_enclosure(&format!("in {plural}"), symbol, symbol);
        self.register_symbol(&plural, &symbol.repeat(2));
        self.register_symbol(name, symbol);
    }

    fn sort_prefixes(&mut self) {
        fn longest_first(prefixes: &mut [Phrase]) {
            prefixes.sort_by(|a, b| b.len().cmp(&a.len()));
        }
        self.symbol_prefixes = self.symbols.keys().cloned().collect();
        self.style_prefixes = self.styles.keys().cloned().collect();
        self.template_prefixes = self.templates.keys().cloned().collect();
        longest_first(&mut self.symbol_prefixes);
        longest_first(&mut self.style_prefixes);
        longest_first(&mut self.template_prefixes);
        longest_first(&mut self.escape_prefixes);
        longest_first(&mut self.one_word_prefixes);
        longest_first(&mut self.numeral_prefixes);
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn symbol(&self, phrase: &[String]) -> Option<&str> {
        self.symbols.get(phrase).map(String::as_str)
    }

    pub fn style(&self, phrase: &[String]) -> Option<TextStyle> {
        self.styles.get(phrase).copied()
    }

    pub fn template(&self, phrase: &[String]) -> Option<&Template> {
        self.templates.get(phrase)
    }

    /// Opening and closing symbol of a named enclosure ("in parens").
    pub fn enclosure(&self, name: &str) -> Option<(&str, &str)> {
        self.enclosures
            .get(name)
            .map(|(start, stop)| (start.as_str(), stop.as_str()))
    }

    pub fn escape_prefixes(&self) -> &[Phrase] {
        &self.escape_prefixes
    }

    pub fn numeral_prefixes(&self) -> &[Phrase] {
        &self.numeral_prefixes
    }

    pub fn one_word_prefixes(&self) -> &[Phrase] {
        &self.one_word_prefixes
    }

    pub fn symbol_prefixes(&self) -> &[Phrase] {
        &self.symbol_prefixes
    }

    pub fn style_prefixes(&self) -> &[Phrase] {
        &self.style_prefixes
    }

    pub fn template_prefixes(&self) -> &[Phrase] {
        &self.template_prefixes
    }

    pub fn comment_prefix(&self) -> &str {
        &self.comment_prefix
    }

    pub fn comment_postfix(&self) -> &str {
        &self.comment_postfix
    }

    /// Default indentation width when a file gives no evidence of its own.
    pub fn indentation(&self) -> usize {
        self.indentation
    }

    pub fn statement_terminator(&self) -> &str {
        &self.statement_terminator
    }
}

static REGISTRY: LazyLock<Cache<Language, Arc<ConversionMap>>> =
    LazyLock::new(|| Cache::new(Language::ALL.len() as u64));

/// Shared table for `language`, built on first use.
pub fn conversion_map(language: Language) -> Arc<ConversionMap> {
    REGISTRY.get_with(language, || {
        tracing::debug!(%language, "building conversion map");
        Arc::new(ConversionMap::build(language))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Phrase {
        phrase(s)
    }

    #[test]
    fn test_base_symbols_and_enclosures() {
        let map = ConversionMap::build(Language::Default);
        assert_eq!(map.symbol(&p("equals")), Some("="));
        assert_eq!(map.symbol(&p("left paren")), Some("("));
        assert_eq!(map.symbol(&p("close curly brace")), Some("}"));
        assert_eq!(map.symbol(&p("parens")), Some("()"));
        assert_eq!(map.symbol(&p("single quotes")), Some("''"));
        assert_eq!(map.symbol(&p("left quote")), None);
        assert_eq!(map.enclosure("in parens"), Some(("(", ")")));
        assert_eq!(map.enclosure("of"), Some(("(", ")")));
        assert_eq!(map.style(&p("camel case")), Some(TextStyle::CamelCase));
        assert_eq!(map.statement_terminator(), ";");
        assert_eq!(map.indentation(), 2);
    }

    #[test]
    fn test_prefixes_are_longest_first() {
        let map = ConversionMap::build(Language::Default);
        let lengths: Vec<usize> = map.symbol_prefixes().iter().map(Vec::len).collect();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(lengths[0], 6);
    }

    #[test]
    fn test_templates() {
        let map = ConversionMap::build(Language::Default);
        assert_eq!(map.template(&p("in curly braces")).unwrap().apply("x"), "{x}");
        assert_eq!(map.template(&p("open tag")).unwrap().apply("div"), "<div>");
        assert_eq!(
            map.template(&p("tag")).unwrap().apply("b"),
            format!("<b>{}</b>", wrap_in_slot(&format!("{CURSOR}2")))
        );
        assert!(map.template(&p("lambda")).is_none());
    }

    #[test]
    fn test_language_overrides() {
        let py = ConversionMap::build(Language::Python);
        assert_eq!(py.symbol(&p("and")), Some(" and "));
        assert_eq!(py.symbol(&p("true")), Some("True"));
        assert_eq!(py.comment_prefix(), "# ");
        assert_eq!(py.statement_terminator(), "");
        assert_eq!(
            py.template(&p("lambda")).unwrap().apply("e"),
            format!("lambda e{}: e", wrap_in_slot(CURSOR))
        );

        let js = ConversionMap::build(Language::TypeScript);
        assert_eq!(js.symbol(&p("arrow")), Some("=>"));
        assert_eq!(
            js.template(&p("lambda of")).unwrap().apply("x"),
            format!("(x{}) => {{\n}}", wrap_in_slot(CURSOR))
        );

        let go = ConversionMap::build(Language::Go);
        assert_eq!(go.indentation(), 4);
        assert_eq!(go.statement_terminator(), "");
        assert!(go.template(&p("lambda")).is_none());
        assert!(go.template(&p("func")).is_none());
    }

    #[test]
    fn test_text_removes_code_phrases() {
        let text = ConversionMap::build(Language::Text);
        assert_eq!(text.symbol(&p("and")), None);
        assert_eq!(text.symbol(&p("sub")), None);
        assert!(text.template(&p("tag")).is_none());
        assert!(text.enclosure("of").is_none());
        assert!(text.enclosure("in subs").is_none());
        assert_eq!(text.symbol(&p("comma")), Some(","));
    }

    #[test]
    fn test_language_names() {
        assert_eq!("py".parse::<Language>(), Ok(Language::Python));
        assert_eq!("TypeScript".parse::<Language>(), Ok(Language::TypeScript));
        let err = "cobol".parse::<Language>().unwrap_err();
        assert_eq!(err.to_string(), "formatted text is not supported for cobol");
    }

    #[test]
    fn test_registry_shares_tables() {
        let a = conversion_map(Language::Go);
        let b = conversion_map(Language::Go);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
