#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Number(f64),
    Operator(Operator),
    OpenParen,
    CloseParen,
}

/// The only characters a substituted formula may contain.
pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | '+' | '-' | '*' | '/' | '(' | ')')
}

/// Splits a substituted formula into tokens.
///
/// Returns `None` on any character outside the arithmetic whitelist or a malformed
/// number such as `1.2.3`.
pub fn tokenize(input: &str) -> Option<Vec<Token>> {
    if !input.chars().all(is_allowed_char) {
        return None;
    }

    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token::OpenParen),
            ')' => tokens.push(Token::CloseParen),
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        end = i + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = input[start..end].parse::<f64>().ok()?;
                tokens.push(Token::Number(number));
            }
            c => tokens.push(Token::Operator(Operator::from_char(c)?)),
        }
    }

    Some(tokens)
}
