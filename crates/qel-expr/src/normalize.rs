//! Text normalization applied before parsing.

use crate::error::ExprError;

const GREEK: &[(char, &str)] = &[
    ('α', "alpha"),
    ('β', "beta"),
    ('γ', "gamma"),
    ('δ', "delta"),
    ('ε', "epsilon"),
    ('ζ', "zeta"),
    ('η', "eta"),
    ('θ', "theta"),
    ('ι', "iota"),
    ('κ', "kappa"),
    ('λ', "lamda"),
    ('μ', "mu"),
    ('ν', "nu"),
    ('ξ', "xi"),
    ('ο', "omicron"),
    ('π', "pi"),
    ('ρ', "rho"),
    ('σ', "sigma"),
    ('τ', "tau"),
    ('υ', "upsilon"),
    ('φ', "phi"),
    ('χ', "chi"),
    ('ψ', "psi"),
    ('ω', "omega"),
    ('Γ', "Gamma"),
    ('Δ', "Delta"),
    ('Θ', "Theta"),
    ('Λ', "Lamda"),
    ('Ξ', "Xi"),
    ('Π', "Pi"),
    ('Σ', "Sigma"),
    ('Φ', "Phi"),
    ('Ψ', "Psi"),
    ('Ω', "Omega"),
    ('∞', "infty"),
];

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrites unicode operators, greek letters and `^` into the ASCII
/// grammar the parser reads.
pub fn normalize(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (idx, &c) in chars.iter().enumerate() {
        match c {
            '\u{2212}' | '\u{2013}' => out.push('-'),
            '×' | '·' | '⋅' | '∗' => out.push('*'),
            '÷' => out.push('/'),
            '^' => out.push_str("**"),
            _ => match GREEK.iter().find(|(letter, _)| *letter == c) {
                Some((_, name)) => {
                    if out.chars().last().is_some_and(is_ident_char) {
                        out.push(' ');
                    }
                    out.push_str(name);
                    if chars.get(idx + 1).is_some_and(|next| is_ident_char(*next)) {
                        out.push(' ');
                    }
                }
                None => out.push(c),
            },
        }
    }
    out
}

/// Rejects escapes, comments and characters the grammar cannot express.
pub fn check_characters(normalized: &str) -> Result<(), ExprError> {
    for (offset, c) in normalized.chars().enumerate() {
        match c {
            '\\' => return Err(ExprError::HasEscape { offset }),
            '#' => return Err(ExprError::HasComment { offset }),
            c if !c.is_ascii() => return Err(ExprError::HasInvalidSymbol { offset, symbol: c }),
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_becomes_power() {
        assert_eq!(normalize("n^2"), "n**2");
    }

    #[test]
    fn greek_letters_are_spelled_out() {
        assert_eq!(normalize("2π"), "2pi");
        assert_eq!(normalize("πr"), "pi r");
        assert_eq!(normalize("\u{2212}x"), "-x");
    }

    #[test]
    fn escapes_and_comments_are_located() {
        assert_eq!(
            check_characters("x + \\y"),
            Err(ExprError::HasEscape { offset: 4 })
        );
        assert_eq!(
            check_characters("x # note"),
            Err(ExprError::HasComment { offset: 2 })
        );
        assert!(matches!(
            check_characters("x€"),
            Err(ExprError::HasInvalidSymbol { offset: 1, .. })
        ));
    }
}
