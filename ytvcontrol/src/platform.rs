use std::fmt;

/// Operating system the backend table is keyed by.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other(String),
}

impl Platform {
    /// Platform of the running binary.
    pub fn current() -> Self {
        Self::from_os_str(std::env::consts::OS)
    }

    pub fn from_os_str(os: &str) -> Self {
        match os.trim().to_ascii_lowercase().as_str() {
            "linux" => Platform::Linux,
            "macos" | "darwin" => Platform::MacOs,
            "windows" => Platform::Windows,
            other => Platform::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Other(os) => os.as_str(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os_str() {
        assert_eq!(Platform::from_os_str("linux"), Platform::Linux);
        assert_eq!(Platform::from_os_str("darwin"), Platform::MacOs);
        assert_eq!(Platform::from_os_str("MacOS"), Platform::MacOs);
        assert_eq!(Platform::from_os_str("windows"), Platform::Windows);
        assert_eq!(
            Platform::from_os_str("freebsd"),
            Platform::Other("freebsd".to_string())
        );
    }
}
