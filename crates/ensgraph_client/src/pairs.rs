//! Parsing of `name, name` pair input.

use crate::error::PairParseError;

const ENS_SUFFIX: &str = ".eth";

fn with_suffix(name: &str) -> String {
    if name.ends_with(ENS_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{ENS_SUFFIX}")
    }
}

/// Splits `"vitalik, nick"` into `("vitalik.eth", "nick.eth")`.
///
/// Both parts are trimmed and lowercased; `.eth` is appended when missing.
pub fn parse_pair(input: &str) -> Result<(String, String), PairParseError> {
    let parts: Vec<String> = input
        .split(',')
        .map(|part| part.trim().to_lowercase())
        .collect();
    if parts.len() != 2 {
        return Err(PairParseError::WrongArity(parts.len()));
    }
    if let Some(position) = parts.iter().position(String::is_empty) {
        return Err(PairParseError::EmptyName(position));
    }
    Ok((with_suffix(&parts[0]), with_suffix(&parts[1])))
}
