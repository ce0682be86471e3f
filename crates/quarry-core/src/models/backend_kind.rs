use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of retrieval backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hosted file-search index reached over HTTP.
    HostedIndex,
    /// Relational store holding document embeddings.
    RelationalVector,
    /// In-process store, always available.
    InMemory,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::HostedIndex,
        BackendKind::RelationalVector,
        BackendKind::InMemory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostedIndex => "hosted_index",
            Self::RelationalVector => "relational_vector",
            Self::InMemory => "in_memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "hosted_index" | "hosted" => Ok(Self::HostedIndex),
            "relational_vector" | "vector" => Ok(Self::RelationalVector),
            "in_memory" | "memory" => Ok(Self::InMemory),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_and_display_names() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
        }
        assert_eq!(
            "hosted-index".parse::<BackendKind>().unwrap(),
            BackendKind::HostedIndex
        );
        assert!("elastic".parse::<BackendKind>().is_err());
    }
}
