/// Replace `${ENV_VAR}` placeholders in config file text.
///
/// Unresolvable variables are left untouched so the validation pass can point
/// at them; an unterminated `${` is emitted literally.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Placeholder substitution with an injectable lookup, so tests never have to
/// mutate the process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            _ => {
                // "${" with no closing brace, or empty "${}" - emit as-is.
                out.push_str("${");
                rest = after;
            },
        }
    }

    out.push_str(rest);
    out
}
