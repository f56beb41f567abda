use std::env;

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Registry behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Keep every registration for a type instead of replacing the previous one.
    pub allow_multiple: bool,
    pub enable_contravariance: bool,
    pub enable_covariance: bool,
    /// Collect targets from every matching candidate in `fetch_all`, not
    /// only the first.
    pub fetch_all_match_all_generic_targets: bool,
    /// Synthesize `IEnumerable<T>` from the targets registered for `T`.
    pub enable_enumerable_injection: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            allow_multiple: true,
            enable_contravariance: true,
            enable_covariance: true,
            fetch_all_match_all_generic_targets: false,
            enable_enumerable_injection: true,
        }
    }
}

impl RegistryOptions {
    /// Defaults overridden by `REZOLVE_*` environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            allow_multiple: env_flag("REZOLVE_ALLOW_MULTIPLE", d.allow_multiple),
            enable_contravariance: env_flag("REZOLVE_CONTRAVARIANCE", d.enable_contravariance),
            enable_covariance: env_flag("REZOLVE_COVARIANCE", d.enable_covariance),
            fetch_all_match_all_generic_targets: env_flag(
                "REZOLVE_MATCH_ALL_GENERICS",
                d.fetch_all_match_all_generic_targets,
            ),
            enable_enumerable_injection: env_flag(
                "REZOLVE_ENUMERABLES",
                d.enable_enumerable_injection,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerOptions {
    pub max_compile_depth: usize,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_compile_depth: 128,
        }
    }
}

impl ContainerOptions {
    pub fn from_env() -> Self {
        let max_compile_depth = env::var("REZOLVE_MAX_COMPILE_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::default().max_compile_depth);
        Self { max_compile_depth }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_flag_values() {
        assert!(env_flag("REZOLVE_TEST_UNSET_FLAG", true));
        assert!(!env_flag("REZOLVE_TEST_UNSET_FLAG", false));

        env::set_var("REZOLVE_TEST_FLAG_OFF", "off");
        env::set_var("REZOLVE_TEST_FLAG_YES", "YES");
        env::set_var("REZOLVE_TEST_FLAG_JUNK", "maybe");
        assert!(!env_flag("REZOLVE_TEST_FLAG_OFF", true));
        assert!(env_flag("REZOLVE_TEST_FLAG_YES", false));
        assert!(env_flag("REZOLVE_TEST_FLAG_JUNK", true));
    }

    #[test]
    fn test_defaults() {
        let options = RegistryOptions::default();
        assert!(options.allow_multiple);
        assert!(!options.fetch_all_match_all_generic_targets);
        assert_eq!(ContainerOptions::default().max_compile_depth, 128);
    }
}
