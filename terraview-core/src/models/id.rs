use serde::{Deserialize, Serialize};

/// Account ID type (integer, assigned by the upstream system)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl AccountId {
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AccountId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Terrarium ID type (integer, assigned by the upstream system)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerrariumId(pub i64);

impl TerrariumId {
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TerrariumId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TerrariumId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_serde() {
        let id = TerrariumId(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let id: AccountId = serde_json::from_str("7").unwrap();
        assert_eq!(id, AccountId(7));
    }

    #[test]
    fn test_display() {
        assert_eq!(TerrariumId(5).to_string(), "5");
        assert_eq!(AccountId(1).to_string(), "1");
    }
}
