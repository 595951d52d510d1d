use crate::ast::NumberRule;

/// `Err` carries the diagnostic message. `n` is already known to be finite.
pub fn check(n: f64, rule: &NumberRule) -> Result<(), String> {
    match *rule {
        NumberRule::Int if n.fract() != 0.0 => Err("Number is not an integer".to_string()),
        NumberRule::Positive if n < 0.0 => Err("Number is not positive".to_string()),
        NumberRule::Min(min) if n < min => Err(format!("Number is lower than '{min}'")),
        NumberRule::Max(max) if n > max => Err(format!("Number is higher than '{max}'")),
        NumberRule::Int | NumberRule::Positive | NumberRule::Min(_) | NumberRule::Max(_) => Ok(()),
    }
}
