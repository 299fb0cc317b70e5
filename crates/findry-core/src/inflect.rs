// ── Service name inflection ──
//
// Derives the conventional binding names from a service path. Only the last
// path segment matters: `api/v1/env-panos` inflects like `env-panos`.

/// Camel-cased prefix for generated binding names, first letter lowered.
///
/// `env-panos` -> `envPanos`, `TODOS` -> `tODOS`.
pub fn service_prefix(path: &str) -> String {
    lower_first(&camelize(base_name(path)))
}

/// Camel-cased service name, first letter raised.
///
/// `env-panos` -> `EnvPanos`, `TODOS` -> `TODOS`.
pub fn service_capitalization(path: &str) -> String {
    upper_first(&camelize(base_name(path)))
}

/// Last path segment of a service path.
fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Join kebab/snake segments, raising the first letter of every segment
/// after the first. Characters inside a segment are left untouched.
fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for segment in name.split(['-', '_']) {
        if segment.is_empty() {
            continue;
        }
        if out.is_empty() {
            out.push_str(segment);
        } else {
            out.push_str(&upper_first(segment));
        }
    }
    out
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflects_the_service_prefix() {
        let decision_table = [
            ("todos", "todos"),
            ("TODOS", "tODOS"),
            ("environment-Panos", "environmentPanos"),
            ("env-panos", "envPanos"),
            ("envPanos", "envPanos"),
            ("api/v1/env-panos", "envPanos"),
        ];
        for (path, prefix) in decision_table {
            assert_eq!(
                service_prefix(path),
                prefix,
                "prefix for path {path:?}"
            );
        }
    }

    #[test]
    fn inflects_the_service_capitalization() {
        let decision_table = [
            ("todos", "Todos"),
            ("TODOS", "TODOS"),
            ("environment-Panos", "EnvironmentPanos"),
            ("env-panos", "EnvPanos"),
            ("envPanos", "EnvPanos"),
            ("api/v1/env-panos", "EnvPanos"),
        ];
        for (path, capitalized) in decision_table {
            assert_eq!(
                service_capitalization(path),
                capitalized,
                "capitalization for path {path:?}"
            );
        }
    }

    #[test]
    fn empty_input_inflects_to_empty() {
        assert_eq!(service_prefix(""), "");
        assert_eq!(service_capitalization(""), "");
    }
}
