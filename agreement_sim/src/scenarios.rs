//! Built-in agreement scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// BA-001: four loyal generals, one tolerated fault
    LoyalArmy,

    /// BA-002: one equivocating lieutenant among four
    TraitorLieutenant,

    /// BA-003: traitor commander with only three generals
    TraitorCommander,

    /// BA-004: traitor commander splitting four generals
    SplitCommander,

    /// BA-005: 1000 generals, two traitors
    LargeArmy,

    /// BA-006: the maximum number of traitors, all silent
    SilentTraitors,

    /// BA-007: full oral-messages relay against a traitor commander
    OralMessages,

    /// BA-008: randomized setups checked against the guarantees
    RandomSweep,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::LoyalArmy,
            ScenarioId::TraitorLieutenant,
            ScenarioId::TraitorCommander,
            ScenarioId::SplitCommander,
            ScenarioId::LargeArmy,
            ScenarioId::SilentTraitors,
            ScenarioId::OralMessages,
            ScenarioId::RandomSweep,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::LoyalArmy => "loyal_army",
            ScenarioId::TraitorLieutenant => "traitor_lieutenant",
            ScenarioId::TraitorCommander => "traitor_commander",
            ScenarioId::SplitCommander => "split_commander",
            ScenarioId::LargeArmy => "large_army",
            ScenarioId::SilentTraitors => "silent_traitors",
            ScenarioId::OralMessages => "oral_messages",
            ScenarioId::RandomSweep => "random_sweep",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::LoyalArmy => "n=4, f=1, no traitors: everyone attacks",
            ScenarioId::TraitorLieutenant => {
                "n=4, f=1, lieutenant 3 equivocates: loyal generals still attack"
            }
            ScenarioId::TraitorCommander => {
                "n=3, f=1, traitor commander: no decision is possible"
            }
            ScenarioId::SplitCommander => {
                "n=4, f=1, traitor commander sends mixed orders: loyal generals agree"
            }
            ScenarioId::LargeArmy => {
                "n=1000, f=2, two traitors under flat relay: loyal generals follow the commander"
            }
            ScenarioId::SilentTraitors => {
                "f=(n-1)/3 traitors that never send: loyal generals follow the commander"
            }
            ScenarioId::OralMessages => {
                "n=7, f=2, traitor commander and lieutenant under OM(2): loyal generals agree"
            }
            ScenarioId::RandomSweep => {
                "random armies, traitors and strategies against the guarantees"
            }
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loyal_army" | "loyalarmy" | "ba-001" => Ok(ScenarioId::LoyalArmy),
            "traitor_lieutenant" | "traitorlieutenant" | "ba-002" => {
                Ok(ScenarioId::TraitorLieutenant)
            }
            "traitor_commander" | "traitorcommander" | "ba-003" => Ok(ScenarioId::TraitorCommander),
            "split_commander" | "splitcommander" | "ba-004" => Ok(ScenarioId::SplitCommander),
            "large_army" | "largearmy" | "ba-005" => Ok(ScenarioId::LargeArmy),
            "silent_traitors" | "silenttraitors" | "ba-006" => Ok(ScenarioId::SilentTraitors),
            "oral_messages" | "oralmessages" | "om" | "ba-007" => Ok(ScenarioId::OralMessages),
            "random_sweep" | "randomsweep" | "sweep" | "ba-008" => Ok(ScenarioId::RandomSweep),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
            assert_eq!(scenario.to_string(), scenario.name());
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("BA-003".parse::<ScenarioId>(), Ok(ScenarioId::TraitorCommander));
        assert_eq!("sweep".parse::<ScenarioId>(), Ok(ScenarioId::RandomSweep));
        assert!("time_warp".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_descriptions_are_distinct() {
        let mut descriptions: Vec<&str> =
            ScenarioId::all().iter().map(ScenarioId::description).collect();
        descriptions.sort_unstable();
        descriptions.dedup();
        assert_eq!(descriptions.len(), ScenarioId::all().len());
    }
}
