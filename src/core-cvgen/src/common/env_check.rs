/// Ensures that the listed environment variables exist and are non-empty.
/// Panics on error, after reporting every offending variable.
pub fn check_non_empty_env_vars(required_vars: &[&str]) {
    let failures = missing_or_empty(required_vars, |name| std::env::var(name).ok());
    for (var_name, present) in &failures {
        if *present {
            eprintln!("FATAL: {} environment variable is set but empty.", var_name);
        } else {
            match *var_name {
                "OPENAI_API_KEY" => eprintln!("Create a key at https://platform.openai.com/api-keys"),
                "FIRECRAWL_API_KEY" => eprintln!("Create a key at https://www.firecrawl.dev/app/api-keys"),
                _ => {}
            }
            eprintln!("FATAL: {} environment variable is required.", var_name);
        }
    }
    if !failures.is_empty() {
        panic!("{} environment variables failed checks.", failures.len());
    }
}

/// Each failing variable, paired with whether it was present (but blank).
fn missing_or_empty<'a>(required_vars: &[&'a str], lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'a str, bool)> {
    required_vars
        .iter()
        .filter_map(|name| match lookup(name) {
            Some(value) if !value.trim().is_empty() => None,
            Some(_) => Some((*name, true)),
            None => Some((*name, false)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_empty() {
        let lookup = |name: &str| match name {
            "SET" => Some("value".to_string()),
            "BLANK" => Some("   ".to_string()),
            _ => None,
        };

        let failures = missing_or_empty(&["SET", "BLANK", "UNSET"], lookup);

        assert_eq!(failures, vec![("BLANK", true), ("UNSET", false)]);
    }

    #[test]
    #[should_panic(expected = "1 environment variables failed checks")]
    fn test_check_panics_on_unset_var() {
        check_non_empty_env_vars(&["CVGEN_TEST_VARIABLE_THAT_IS_NEVER_SET"]);
    }
}
