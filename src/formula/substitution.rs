use crate::schema::Value;
use ahash::AHashMap;
use itertools::Itertools;

/// Replaces every field reference in `formula` with the field's current numeric value.
///
/// Both `{Field Id}` and bare `FieldId` references are recognised. Bare references are
/// matched longest-first against the known ids and only at identifier boundaries, so
/// `Length` never matches inside `LengthTotal`. Returns `None` when a reference is
/// unknown, empty, non-numeric, or not finite.
pub(crate) fn substitute(formula: &str, values: &AHashMap<String, Value>) -> Option<String> {
    let known_ids: Vec<&str> = values
        .keys()
        .map(String::as_str)
        .filter(|id| !id.is_empty())
        .sorted_by_key(|id| std::cmp::Reverse(id.len()))
        .collect();

    let mut output = String::with_capacity(formula.len() * 2);
    let mut rest = formula;
    let mut previous: Option<char> = None;

    while let Some(c) = rest.chars().next() {
        if c == '{' {
            let close = rest.find('}')?;
            let name = rest[1..close].trim();
            output.push_str(&render(values.get(name)?)?);
            rest = &rest[close + 1..];
            previous = Some('}');
            continue;
        }

        if !previous.is_some_and(is_identifier_char) {
            if let Some(id) = known_ids.iter().find(|id| matches_at_boundary(rest, id)) {
                output.push_str(&render(values.get(*id)?)?);
                rest = &rest[id.len()..];
                previous = id.chars().last();
                continue;
            }
            if c.is_alphabetic() || c == '_' {
                log::debug!("Formula '{}' references an unknown field near '{}'", formula, rest);
                return None;
            }
        }

        output.push(c);
        rest = &rest[c.len_utf8()..];
        previous = Some(c);
    }

    Some(output)
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn matches_at_boundary(rest: &str, id: &str) -> bool {
    rest.starts_with(id) && !rest[id.len()..].chars().next().is_some_and(is_identifier_char)
}

/// Renders a value as arithmetic text. Negative numbers are parenthesised so they stay
/// unary wherever they are spliced in.
fn render(value: &Value) -> Option<String> {
    let n = value.as_number()?;
    if n < 0.0 {
        Some(format!("({})", n))
    } else {
        Some(format!("{}", n))
    }
}
