//! Reference list of popular package names for squatting detection.

use std::sync::OnceLock;

/// Top PyPI packages by download count, used as the squatting reference set.
/// Source: https://hugovk.github.io/top-pypi-packages/
const TOP_PACKAGES: &[&str] = &[
    "requests", "urllib3", "boto3", "botocore", "setuptools", "certifi",
    "python-dateutil", "six", "pip", "s3transfer", "pyyaml", "charset-normalizer",
    "numpy", "idna", "wheel", "cryptography", "pyasn1", "rsa", "awscli",
    "typing-extensions", "jmespath", "colorama", "cffi", "click", "packaging",
    "pycparser", "attrs", "pytz", "pandas", "jinja2", "markupsafe",
    "importlib-metadata", "protobuf", "zipp", "oauthlib", "pillow", "pyjwt",
    "jsonschema", "filelock", "platformdirs", "werkzeug", "scipy", "soupsieve",
    "beautifulsoup4", "wrapt", "pyparsing", "google-api-core", "pyarrow",
    "sqlalchemy", "tomli", "pluggy", "pytest", "grpcio", "pygments", "tqdm",
    "importlib-resources", "flask", "mypy-extensions", "itsdangerous",
    "exceptiongroup", "iniconfig", "docutils", "fsspec", "markdown",
    "pyasn1-modules", "greenlet", "trio", "wcwidth", "django", "decorator",
    "contourpy", "toml", "aiohttp", "google-auth", "async-timeout", "pydantic",
    "google-cloud-storage", "redis", "aiobotocore", "tabulate", "psutil",
    "ruamel-yaml", "yarl", "frozenlist", "multidict", "h11", "tornado", "anyio",
    "pyopenssl", "cachetools", "smmap", "gitdb", "gitpython", "entrypoints",
    "httpx", "lxml", "coverage", "prometheus-client", "google-api-python-client",
];

/// Immutable ordered set of known-popular package names.
///
/// Loaded once at first use and read-only thereafter; safe to share across
/// concurrent scans.
#[derive(Debug, Clone)]
pub struct ReferencePackages {
    names: Vec<String>,
}

impl ReferencePackages {
    /// Build a reference list from arbitrary names (for callers with their own
    /// popularity table).
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// The built-in top-PyPI list, constructed once per process.
    pub fn builtin() -> &'static ReferencePackages {
        static BUILTIN: OnceLock<ReferencePackages> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            ReferencePackages::new(TOP_PACKAGES.iter().map(|s| s.to_string()))
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_list_is_populated() {
        let refs = ReferencePackages::builtin();
        assert!(refs.len() >= 90);
        assert!(refs.contains("requests"));
        assert!(refs.contains("numpy"));
    }

    #[test]
    fn contains_is_case_insensitive() {
        let refs = ReferencePackages::builtin();
        assert!(refs.contains("Flask"));
    }
}
