/// Split a trait attribute value into distinct trait names.
///
/// Splits on runs of whitespace, drops empty tokens and keeps the first
/// occurrence of each name. A missing attribute yields no names.
pub fn parse_trait_names(value: Option<&str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for token in value.unwrap_or_default().split_whitespace() {
        if !names.iter().any(|name| name == token) {
            names.push(token.to_string());
        }
    }

    names
}

/// Whether `value` lists `name` as one of its tokens
pub fn lists_trait(value: Option<&str>, name: &str) -> bool {
    value
        .unwrap_or_default()
        .split_whitespace()
        .any(|token| token == name)
}
