use jobcore::error::ValueError;
use std::{
    fmt,
    str::FromStr,
};
use super::RankAccess;

impl From<RankAccess> for &'static str {
    fn from(level: RankAccess) -> &'static str {
        match level {
            RankAccess::Own => "Own",
            RankAccess::SameRank => "Same_Rank",
            RankAccess::LowerRank => "Lower_Rank",
            RankAccess::Any => "Any",
            RankAccess::All => "All",
        }
    }
}

impl fmt::Display for RankAccess {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(<&'static str>::from(*self))
    }
}

impl FromStr for RankAccess {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Own" => Ok(RankAccess::Own),
            "Same_Rank" => Ok(RankAccess::SameRank),
            "Lower_Rank" => Ok(RankAccess::LowerRank),
            "Any" => Ok(RankAccess::Any),
            "All" => Ok(RankAccess::All),
            s => Err(ValueError::Unsupported(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use enumset::EnumSet;
    use super::*;

    #[test]
    fn smoke() -> anyhow::Result<()> {
        for level in EnumSet::<RankAccess>::all() {
            assert_eq!(RankAccess::from_str(&level.to_string())?, level);
        }
        assert!(matches!(
            RankAccess::from_str("same_rank"),
            Err(ValueError::Unsupported(s)) if s == "same_rank",
        ));
        Ok(())
    }
}
