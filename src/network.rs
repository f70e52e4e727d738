//! Network selection and the naming conventions the remote services use for it.

use crate::util::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Bitcoin SV network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
    /// Scaling test network.
    STN,
}

impl Network {
    /// Name used by the REST blockchain service (`main`, `test`, `stn`).
    #[must_use]
    pub fn api_name(&self) -> &'static str {
        match self {
            Network::Mainnet => "main",
            Network::Testnet => "test",
            Network::STN => "stn",
        }
    }

    /// Name used by bsv tooling (`mainnet`, `testnet`, `stn`).
    #[must_use]
    pub fn bsv_name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::STN => "stn",
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    /// Accepts either naming; anything unknown falls back to testnet, the way the REST service
    /// treats unrecognized network names.
    fn from_str(s: &str) -> Result<Network> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(Network::Mainnet),
            "stn" => Ok(Network::STN),
            "" => Err(Error::BadArgument("Empty network name".to_string())),
            _ => Ok(Network::Testnet),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_names() {
        assert_eq!("main".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("stn".parse::<Network>().unwrap(), Network::STN);
        assert_eq!("test".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("regtest".parse::<Network>().unwrap(), Network::Testnet);
        assert!("".parse::<Network>().is_err());
    }

    #[test]
    fn bsv_name() {
        assert_eq!(Network::Mainnet.bsv_name(), "mainnet");
        assert_eq!(Network::Testnet.bsv_name(), "testnet");
        assert_eq!(Network::STN.bsv_name(), "stn");
    }
}
