use std::fmt;
use std::str::FromStr;

pub const FREE_DAILY_LIMIT: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Free,
    Premium,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Premium => "Premium",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "premium" | "pro" => Ok(Tier::Premium),
            other => Err(format!("unknown tier '{other}' (expected free or premium)")),
        }
    }
}

/// Decides whether another generation is allowed today.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsagePolicy {
    pub free_daily_limit: u32,
}

impl Default for UsagePolicy {
    fn default() -> Self {
        Self {
            free_daily_limit: FREE_DAILY_LIMIT,
        }
    }
}

impl UsagePolicy {
    pub fn can_generate(&self, usage_count: u32, tier: Tier) -> bool {
        match tier {
            Tier::Premium => true,
            Tier::Free => usage_count < self.free_daily_limit,
        }
    }

    /// Generations left today, `None` meaning unlimited.
    pub fn remaining(&self, usage_count: u32, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Premium => None,
            Tier::Free => Some(self.free_daily_limit.saturating_sub(usage_count)),
        }
    }
}
