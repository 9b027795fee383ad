//! Substitution parser

use crate::{error::SubstitutionError, substitution::types::Substitution};

/// Parse substitution string like "$(var x)" or "text $(env Y) more"
pub fn parse_substitutions(input: &str) -> Result<Vec<Substitution>, SubstitutionError> {
    let mut result = Vec::new();
    let mut chars = input.char_indices().peekable();
    let mut last_pos = 0;

    while let Some((i, ch)) = chars.next() {
        if ch != '$' || !matches!(chars.peek(), Some((_, '('))) {
            continue;
        }

        if i > last_pos {
            result.push(Substitution::Text(input[last_pos..i].to_string()));
        }

        // Skip the '('
        chars.next();

        let sub_start = i + 2;
        let sub_end = chars
            .by_ref()
            .find(|(_, c)| *c == ')')
            .map(|(pos, _)| pos)
            .ok_or_else(|| {
                SubstitutionError::InvalidSubstitution(format!(
                    "Unterminated substitution in '{}'",
                    input
                ))
            })?;

        result.push(parse_substitution_content(&input[sub_start..sub_end])?);
        last_pos = sub_end + 1;
    }

    if last_pos < input.len() {
        result.push(Substitution::Text(input[last_pos..].to_string()));
    }

    // Keep a single empty text so the expression still resolves to ""
    if result.is_empty() {
        result.push(Substitution::Text(String::new()));
    }

    Ok(result)
}

/// Parse the content inside a substitution $(...)
fn parse_substitution_content(content: &str) -> Result<Substitution, SubstitutionError> {
    let trimmed = content.trim();
    let (sub_type, args) = match trimmed.split_once(char::is_whitespace) {
        Some((sub_type, args)) => (sub_type, Some(args.trim())),
        None => (trimmed, None),
    };

    let required = |what: &str| {
        args.filter(|a| !a.is_empty()).ok_or_else(|| {
            SubstitutionError::InvalidSubstitution(format!("{} requires an argument", what))
        })
    };

    match sub_type {
        "var" => Ok(Substitution::LaunchConfiguration(required("var")?.to_string())),
        "env" => {
            let args = required("env")?;
            let (name, default) = match args.split_once(char::is_whitespace) {
                Some((name, default)) => (name, Some(default.trim().to_string())),
                None => (args, None),
            };
            Ok(Substitution::EnvironmentVariable {
                name: name.to_string(),
                default,
            })
        }
        "find-pkg-share" => Ok(Substitution::FindPackageShare(
            required("find-pkg-share")?.to_string(),
        )),
        "" => Err(SubstitutionError::InvalidSubstitution(
            "Empty substitution".to_string(),
        )),
        other => Err(SubstitutionError::InvalidSubstitution(format!(
            "Unknown substitution type: {}",
            other
        ))),
    }
}
