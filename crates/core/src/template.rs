//! Template text tokenisation.
//!
//! A template is literal text with `{name}` tokens. Three names are understood: `{value}`,
//! `{label}` and `{input}`. Any other token is kept as [`Placeholder::Unknown`] and rendered
//! back verbatim, so a typo shows up in the summary rather than vanishing; the definition
//! checks report it as well.
//!
//! A token is `{` followed by one or more characters other than `}` and then `}`. An empty
//! `{}` or an unclosed `{` is literal text.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placeholder {
    Value,
    Label,
    Input,
    Unknown(String),
}

impl Placeholder {
    fn from_name(name: &str) -> Self {
        match name {
            "value" => Placeholder::Value,
            "label" => Placeholder::Label,
            "input" => Placeholder::Input,
            other => Placeholder::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Value => f.write_str("{value}"),
            Placeholder::Label => f.write_str("{label}"),
            Placeholder::Input => f.write_str("{input}"),
            Placeholder::Unknown(name) => write!(f, "{{{name}}}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder(Placeholder),
}

/// Split template text into literal runs and placeholders.
pub fn tokenize(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find('{') {
        let open = cursor + offset;
        let Some(close_offset) = text[open + 1..].find('}') else {
            break;
        };
        let close = open + 1 + close_offset;
        if close == open + 1 {
            cursor = close;
            continue;
        }

        if literal_start < open {
            segments.push(Segment::Literal(&text[literal_start..open]));
        }
        segments.push(Segment::Placeholder(Placeholder::from_name(
            &text[open + 1..close],
        )));
        cursor = close + 1;
        literal_start = cursor;
    }

    if literal_start < text.len() {
        segments.push(Segment::Literal(&text[literal_start..]));
    }
    segments
}

/// The placeholders used by a template, in order of appearance.
pub fn placeholders(text: &str) -> impl Iterator<Item = Placeholder> + '_ {
    tokenize(text).into_iter().filter_map(|segment| match segment {
        Segment::Placeholder(placeholder) => Some(placeholder),
        Segment::Literal(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_literals_and_known_tokens() {
        assert_eq!(
            tokenize("Fever for {value}, {label}."),
            vec![
                Segment::Literal("Fever for "),
                Segment::Placeholder(Placeholder::Value),
                Segment::Literal(", "),
                Segment::Placeholder(Placeholder::Label),
                Segment::Literal("."),
            ]
        );
    }

    #[test]
    fn unknown_tokens_round_trip_verbatim() {
        let segments = tokenize("{Value} and {input}");
        assert_eq!(segments[0], Segment::Placeholder(Placeholder::Unknown("Value".into())));
        assert_eq!(Placeholder::Unknown("Value".into()).to_string(), "{Value}");
        assert_eq!(segments[2], Segment::Placeholder(Placeholder::Input));
    }

    #[test]
    fn empty_and_unclosed_braces_stay_literal() {
        assert_eq!(tokenize("a {} b"), vec![Segment::Literal("a {} b")]);
        assert_eq!(tokenize("a {value"), vec![Segment::Literal("a {value")]);
        assert_eq!(
            tokenize("{}{value}"),
            vec![
                Segment::Literal("{}"),
                Segment::Placeholder(Placeholder::Value)
            ]
        );
    }

    #[test]
    fn nested_open_brace_belongs_to_the_token_name() {
        assert_eq!(
            tokenize("{{value}"),
            vec![Segment::Placeholder(Placeholder::Unknown("{value".into()))]
        );
    }

    #[test]
    fn handles_multibyte_text() {
        let segments = tokenize("มีไข้ {value} วัน");
        assert_eq!(
            segments,
            vec![
                Segment::Literal("มีไข้ "),
                Segment::Placeholder(Placeholder::Value),
                Segment::Literal(" วัน"),
            ]
        );
    }

    #[test]
    fn lists_placeholders_in_order() {
        let found: Vec<_> = placeholders("{label} ({input}) {lable}").collect();
        assert_eq!(
            found,
            vec![
                Placeholder::Label,
                Placeholder::Input,
                Placeholder::Unknown("lable".into())
            ]
        );
    }
}
