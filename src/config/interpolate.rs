//! Variable interpolation for configuration values
//!
//! This module handles parsing and replacing variables in strings using the
//! `${var}` syntax.

use crate::error::{ConfigError, ConfigResult};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Deepest chain of variables expanding into other variables
const MAX_DEPTH: usize = 32;

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid interpolation regex"))
}

/// Interpolate variables in a string, leaving unknown variables in place.
///
/// Values may reference other variables; a variable referencing itself,
/// directly or through others, is left unexpanded at that point.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> ConfigResult<String> {
    expand(s, vars, &mut Vec::new())
}

fn expand(s: &str, vars: &HashMap<String, String>, stack: &mut Vec<String>) -> ConfigResult<String> {
    if stack.len() > MAX_DEPTH {
        return Err(ConfigError::RecursiveInterpolation);
    }

    let mut out = String::with_capacity(s.len());
    let mut last = 0;

    for caps in variable_pattern().captures_iter(s) {
        let (whole, name) = match (caps.get(0), caps.get(1)) {
            (Some(whole), Some(name)) => (whole, name.as_str()),
            _ => continue,
        };
        out.push_str(&s[last..whole.start()]);
        last = whole.end();

        match vars.get(name) {
            Some(value) if !stack.iter().any(|active| active == name) => {
                stack.push(name.to_string());
                out.push_str(&expand(value, vars, stack)?);
                stack.pop();
            }
            _ => out.push_str(whole.as_str()),
        }
    }

    out.push_str(&s[last..]);
    Ok(out)
}

/// Interpolate with strict mode - errors on undefined variables
pub fn interpolate_strict(s: &str, vars: &HashMap<String, String>) -> ConfigResult<String> {
    let result = interpolate(s, vars)?;

    if let Some(caps) = variable_pattern().captures(&result) {
        return Err(ConfigError::UndefinedVariable(caps[1].to_string()));
    }

    Ok(result)
}

/// Strictly interpolate a list of strings
pub fn interpolate_list(list: &[String], vars: &HashMap<String, String>) -> ConfigResult<Vec<String>> {
    list.iter().map(|s| interpolate_strict(s, vars)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_interpolation() {
        let result = interpolate("${HOME}/.cargo/bin/rustc", &vars(&[("HOME", "/root")])).unwrap();
        assert_eq!(result, "/root/.cargo/bin/rustc");
    }

    #[test]
    fn test_multiple_variables() {
        let vars = vars(&[("first", "John"), ("last", "Doe")]);
        assert_eq!(interpolate("${first} ${last}", &vars).unwrap(), "John Doe");
    }

    #[test]
    fn test_undefined_variable_lenient() {
        let result = interpolate("Hello, ${undefined}!", &vars(&[])).unwrap();
        assert_eq!(result, "Hello, ${undefined}!");
    }

    #[test]
    fn test_undefined_variable_strict() {
        let result = interpolate_strict("Hello, ${undefined}!", &vars(&[]));
        assert!(matches!(result, Err(ConfigError::UndefinedVariable(name)) if name == "undefined"));
    }

    #[test]
    fn test_nested_interpolation() {
        let vars = vars(&[("inner", "value"), ("outer", "${inner}")]);
        assert_eq!(interpolate("Result: ${outer}", &vars).unwrap(), "Result: value");
    }

    #[test]
    fn test_self_reference_terminates() {
        let vars = vars(&[("loop", "${loop}")]);
        let result = interpolate("${loop}", &vars).unwrap();
        assert_eq!(result, "${loop}");
    }

    #[test]
    fn test_repeated_variable() {
        let result = interpolate("${a}-${a}", &vars(&[("a", "x")])).unwrap();
        assert_eq!(result, "x-x");
        assert_eq!(interpolate_strict("${a}/${a}", &vars(&[("a", "y")])).unwrap(), "y/y");
    }

    #[test]
    fn test_mutual_reference_terminates() {
        let vars = vars(&[("a", "${b}"), ("b", "${a}")]);
        assert_eq!(interpolate("${a}", &vars).unwrap(), "${a}");
    }

    #[test]
    fn test_empty_variable_name() {
        let result = interpolate("Value: ${}", &vars(&[])).unwrap();
        assert_eq!(result, "Value: ${}");
    }

    #[test]
    fn test_interpolate_list() {
        let list = vec!["-C".to_string(), "opt-level=${LEVEL}".to_string()];
        let result = interpolate_list(&list, &vars(&[("LEVEL", "3")])).unwrap();
        assert_eq!(result, vec!["-C", "opt-level=3"]);
    }
}
