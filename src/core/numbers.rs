//! Spoken English numbers, both directions.
//!
//! - `from_prefix` parses the longest number phrase at the head of a word
//!   slice, digit group by digit group ("twelve o four" is 1204, "thirty
//!   twenty five" is 3025).
//! - `convert_numbers` rewrites every number phrase in a sentence to digits,
//!   honoring the escape phrases "the word" and "escape".
//! - `sample_english` goes the other way and picks one of the many ways a
//!   person might say a digit string.

use rand::Rng;

const DIGITS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

const TEENS: [&str; 10] = [
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 8] = [
    "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Scale words and the digit count they contribute.
const SCALES: [(&str, usize); 2] = [("hundred", 2), ("thousand", 3)];

pub const ESCAPE_PHRASES: [&[&str]; 2] = [&["the", "word"], &["escape"]];

fn digit(word: &str) -> Option<u64> {
    DIGITS.iter().position(|&d| d == word).map(|i| i as u64)
}

fn teen(word: &str) -> Option<u64> {
    TEENS.iter().position(|&t| t == word).map(|i| 10 + i as u64)
}

fn tens(word: &str) -> Option<u64> {
    TENS.iter().position(|&t| t == word).map(|i| 20 + 10 * i as u64)
}

fn scale(word: &str) -> Option<usize> {
    SCALES.iter().find(|(w, _)| *w == word).map(|&(_, n)| n)
}

/// The letter "o" read as zero.
fn is_letter_zero(word: &str) -> bool {
    word == "o" || word == "oh"
}

/// Result of parsing a number phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Zero-padded digit string ("o five" is "05"); empty when no number
    /// was found.
    digits: String,
    /// Words consumed from the input; zero means no number was found.
    pub num_tokens: usize,
}

impl Conversion {
    const NONE: Conversion = Conversion {
        digits: String::new(),
        num_tokens: 0,
    };

    pub fn num_digits(&self) -> usize {
        self.digits.len()
    }

    /// The digits as a number; `None` past `u64::MAX` or when empty.
    pub fn value(&self) -> Option<u64> {
        self.digits.parse().ok()
    }

    pub fn formatted(&self) -> &str {
        &self.digits
    }
}

/// One digit group: a leading number word, any scale words after it and a
/// tentative "and".
struct Group {
    /// Exactly as many digits as the leading word contributes.
    prefix: String,
    /// Digits the scale words reserve for whatever follows.
    min_postfix_digits: usize,
    consumed: usize,
    trailing_and: bool,
}

impl Group {
    fn parse(words: &[&str]) -> Option<Group> {
        let &token = words.first()?;

        let mut consumed = 1;
        let prefix = if token == "a" {
            // "a" only counts in "a hundred", "a thousand"
            if !words.get(1).is_some_and(|w| scale(w).is_some()) {
                return None;
            }
            "1".to_string()
        } else if is_letter_zero(token) {
            "0".to_string()
        } else if let Some(d) = digit(token) {
            d.to_string()
        } else if let Some(t) = tens(token) {
            match words.get(1).and_then(|w| digit(w)) {
                Some(d) => {
                    consumed += 1;
                    (t + d).to_string()
                }
                None => t.to_string(),
            }
        } else if let Some(t) = teen(token) {
            t.to_string()
        } else {
            return None;
        };

        // "hundred thousand" stacks
        let mut min_postfix_digits = 0;
        while let Some(n) = words.get(consumed).and_then(|w| scale(w)) {
            min_postfix_digits += n;
            consumed += 1;
        }
        let trailing_and = min_postfix_digits > 0 && words.get(consumed) == Some(&"and");
        if trailing_and {
            consumed += 1;
        }

        Some(Group {
            prefix,
            min_postfix_digits,
            consumed,
            trailing_and,
        })
    }
}

/// Parse the number phrase at the start of `words`.
///
/// Groups combine right to left: each group's digits go in front of the
/// digits after it, which are zero-padded to the width its scale words
/// reserve ("a hundred and five" is "1" + "05").
pub fn from_prefix(words: &[&str]) -> Conversion {
    let mut groups = Vec::new();
    let mut consumed = 0;
    while let Some(group) = Group::parse(&words[consumed..]) {
        consumed += group.consumed;
        groups.push(group);
    }
    // "and" is given back when no number follows it
    if groups.last().is_some_and(|g| g.trailing_and) {
        consumed -= 1;
    }
    if groups.is_empty() {
        return Conversion::NONE;
    }

    // Built back to front, then reversed once.
    let mut reversed = String::new();
    for group in groups.iter().rev() {
        let padding = group.min_postfix_digits.saturating_sub(reversed.len());
        reversed.extend(std::iter::repeat_n('0', padding));
        reversed.extend(group.prefix.chars().rev());
    }

    Conversion {
        digits: reversed.chars().rev().collect(),
        num_tokens: consumed,
    }
}

fn conversion_from_string(s: &str) -> Conversion {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return Conversion {
            digits: s.to_string(),
            num_tokens: 1,
        };
    }
    let words: Vec<&str> = s.split(' ').collect();
    from_prefix(&words)
}

/// Whether the whole of `s` is one number phrase (or a digit string).
pub fn is_valid(s: &str) -> bool {
    let conversion = conversion_from_string(s);
    conversion.num_tokens > 0 && conversion.num_tokens == s.split(' ').count()
}

/// Value of the number phrase at the start of `s`; 0 when there is none,
/// `u64::MAX` when the phrase has more digits than fit.
pub fn from_string(s: &str) -> u64 {
    let conversion = conversion_from_string(s);
    if conversion.num_tokens == 0 {
        return 0;
    }
    conversion.value().unwrap_or(u64::MAX)
}

/// "152" becomes "one five two". `None` if `digits` has a non-digit.
pub fn from_digits_to_text(digits: &str) -> Option<String> {
    digits
        .chars()
        .map(|c| c.to_digit(10).map(|d| DIGITS[d as usize]))
        .collect::<Option<Vec<_>>>()
        .map(|words| words.join(" "))
}

/// Strip a trailing escape phrase from `out`, reporting whether one was there.
fn pop_escaped(out: &mut Vec<(String, bool)>) -> bool {
    for phrase in ESCAPE_PHRASES {
        if out.len() >= phrase.len() {
            let tail = &out[out.len() - phrase.len()..];
            if tail.iter().map(|(w, _)| w.as_str()).eq(phrase.iter().copied()) {
                out.truncate(out.len() - phrase.len());
                return true;
            }
        }
    }
    false
}

/// Replace every number phrase in a space-separated sentence with digits.
///
/// Adjacent converted numbers are joined without a space.
pub fn convert_numbers(sentence: &str) -> String {
    let words: Vec<&str> = sentence.split(' ').collect();
    // (word, is_converted_number)
    let mut out: Vec<(String, bool)> = Vec::with_capacity(words.len());

    let mut i = 0;
    while i < words.len() {
        // "insert o" and "type o" stay letters unless a number came right before
        let after_number = out.last().is_some_and(|&(_, is_num)| is_num);
        let conversion = if is_letter_zero(words[i]) && !after_number {
            Conversion::NONE
        } else {
            from_prefix(&words[i..])
        };

        if conversion.num_tokens == 0 {
            out.push((words[i].to_string(), false));
            i += 1;
            continue;
        }

        let phrase = &words[i..i + conversion.num_tokens];
        if pop_escaped(&mut out) {
            out.extend(phrase.iter().map(|w| (w.to_string(), false)));
        } else {
            out.push((conversion.formatted().to_string(), true));
        }
        i += conversion.num_tokens;
    }

    let mut result = String::with_capacity(sentence.len());
    for (j, (word, is_num)) in out.iter().enumerate() {
        if j > 0 && !(*is_num && out[j - 1].1) {
            result.push(' ');
        }
        result.push_str(word);
    }
    result
}

fn scale_name(digits: usize) -> Option<&'static str> {
    SCALES.iter().find(|&&(_, n)| n == digits).map(|&(w, _)| w)
}

fn sample_one_alternative<R: Rng>(words: String, rng: &mut R) -> String {
    if words == "one" && rng.random_bool(0.25) {
        return "a".to_string();
    }
    words
}

/// One way to say the digit string `number` out loud.
///
/// Leading zeros are read as "zero" or "o". Longer numbers mix groupings
/// ("one o five", "twelve twenty three", "a hundred and five").
pub fn sample_english<R: Rng>(number: &str, rng: &mut R) -> String {
    if rng.random_bool(0.1) {
        return number
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| DIGITS[d as usize])
            .collect::<Vec<_>>()
            .join(" ");
    }

    let zero = if rng.random::<bool>() { "zero" } else { "o" };
    let stripped = number.trim_start_matches('0');
    let mut out = format!("{zero} ").repeat(number.len() - stripped.len());
    out.push_str(&sample_composite(stripped, false, rng));
    if let Some(rest) = out.strip_prefix("and ") {
        out = rest.to_string();
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sample_composite<R: Rng>(number: &str, and_allowed: bool, rng: &mut R) -> String {
    if number.is_empty() {
        return String::new();
    }
    if let Some(rest) = number.strip_prefix('0') {
        return sample_composite(rest, true, rng);
    }

    let bytes = number.as_bytes();
    let len = bytes.len();
    if len == 3 || (len == 4 && rng.random::<bool>()) {
        let (head, tail) = number.split_at(len - 2);
        if bytes[len - 2] == b'0' && bytes[len - 3] != b'0' && bytes[len - 1] != b'0' && rng.random::<bool>() {
            // one o five
            return format!(
                "{} o {}",
                sample_composite(head, true, rng),
                sample_composite(&number[len - 1..], false, rng)
            );
        }
        if bytes[len - 2] != b'0' && rng.random::<bool>() {
            // one twenty three, twelve twenty three
            return format!(
                "{} {}",
                sample_composite(head, true, rng),
                sample_composite(tail, false, rng)
            );
        }
        // one hundred twenty five, twelve hundred twenty five
        let head = sample_composite(head, true, rng);
        return format!(
            "{} hundred {}",
            sample_one_alternative(head, rng),
            sample_composite(tail, true, rng)
        );
    }

    if len >= 4 {
        let min_digits = ((len - 1) / 3) * 3;
        let (head, tail) = number.split_at(len - min_digits);
        let head = sample_composite(head, true, rng);
        let name = scale_name(min_digits).unwrap_or("thousand");
        return format!(
            "{} {} {}",
            sample_one_alternative(head, rng),
            name,
            sample_composite(tail, true, rng)
        );
    }

    let mut out = String::new();
    if and_allowed && rng.random::<bool>() {
        out.push_str("and ");
    }
    let value = number.parse::<usize>().unwrap_or(0);
    match value {
        20..=99 => {
            let ten = TENS[value / 10 - 2];
            if value % 10 == 0 {
                ten.to_string()
            } else {
                format!("{ten} {}", DIGITS[value % 10])
            }
        }
        10..=19 => {
            out.push_str(TEENS[value - 10]);
            out
        }
        _ => {
            out.push_str(DIGITS[value % 10]);
            out
        }
    }
}
