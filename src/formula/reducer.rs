use super::tokenizer::{Operator, Token};

/// Resolves parenthesised groups innermost first, then reduces the flat remainder.
pub fn reduce(mut tokens: Vec<Token>) -> Option<f64> {
    while let Some(open) = tokens.iter().rposition(|t| *t == Token::OpenParen) {
        // The last opening paren has no nested group, so the first closing paren after it
        // is its partner.
        let length = tokens[open + 1..]
            .iter()
            .position(|t| *t == Token::CloseParen)?;
        let close = open + 1 + length;
        let value = reduce_flat(&tokens[open + 1..close])?;
        tokens.splice(open..=close, [Token::Number(value)]);
    }

    if tokens.contains(&Token::CloseParen) {
        return None;
    }
    reduce_flat(&tokens)
}

/// Reduces a parenthesis-free token run: unary signs, then `*` and `/` left to right,
/// then `+` and `-` left to right.
fn reduce_flat(tokens: &[Token]) -> Option<f64> {
    let mut operands: Vec<f64> = Vec::new();
    let mut operators: Vec<Operator> = Vec::new();
    let mut negate = false;
    let mut expecting_operand = true;

    for token in tokens {
        match (*token, expecting_operand) {
            (Token::Operator(Operator::Subtract), true) => negate = !negate,
            (Token::Operator(Operator::Add), true) => {}
            (Token::Number(n), true) => {
                operands.push(if negate { -n } else { n });
                negate = false;
                expecting_operand = false;
            }
            (Token::Operator(op), false) => {
                operators.push(op);
                expecting_operand = true;
            }
            _ => return None,
        }
    }
    if expecting_operand {
        return None;
    }

    let mut operands = operands.into_iter();
    let mut terms = vec![operands.next()?];
    let mut additive = Vec::new();

    for (op, rhs) in operators.into_iter().zip(operands) {
        match op {
            Operator::Multiply => *terms.last_mut()? *= rhs,
            Operator::Divide => {
                if rhs == 0.0 {
                    return None;
                }
                *terms.last_mut()? /= rhs;
            }
            Operator::Add | Operator::Subtract => {
                additive.push(op);
                terms.push(rhs);
            }
        }
    }

    let mut terms = terms.into_iter();
    let mut result = terms.next()?;
    for (op, rhs) in additive.into_iter().zip(terms) {
        match op {
            Operator::Add => result += rhs,
            _ => result -= rhs,
        }
    }

    result.is_finite().then_some(result)
}
