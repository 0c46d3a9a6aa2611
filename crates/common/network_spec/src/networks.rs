use std::sync::{Arc, LazyLock, Once, OnceLock};

use alloy_primitives::{aliases::B32, fixed_bytes};
use ream_consensus_misc::fork::ForkName;
use serde::Deserialize;

pub static HAS_NETWORK_SPEC_BEEN_INITIALIZED: Once = Once::new();

pub fn initialize_test_network_spec() {
    HAS_NETWORK_SPEC_BEEN_INITIALIZED.call_once(|| {
        set_beacon_network_spec(DEV.clone());
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Sepolia,
    Hoodi,
    Dev,
    Custom(String),
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match String::deserialize(deserializer)?.as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "sepolia" => Ok(Network::Sepolia),
            "hoodi" => Ok(Network::Hoodi),
            "dev" => Ok(Network::Dev),
            custom => Ok(Network::Custom(custom.to_string())),
        }
    }
}

static BEACON_NETWORK_SPEC: OnceLock<Arc<BeaconNetworkSpec>> = OnceLock::new();

/// MUST be called only once at the start of the application to initialize static
/// [BeaconNetworkSpec].
///
/// The static `BeaconNetworkSpec` can be accessed using [beacon_network_spec].
///
/// # Panics
///
/// Panics if this function is called more than once.
pub fn set_beacon_network_spec(network_spec: Arc<BeaconNetworkSpec>) {
    BEACON_NETWORK_SPEC
        .set(network_spec)
        .expect("BeaconNetworkSpec should be set only once at the start of the application");
}

/// Returns the static [BeaconNetworkSpec] initialized by [set_beacon_network_spec].
///
/// # Panics
///
/// Panics if [set_beacon_network_spec] wasn't called before this function.
pub fn beacon_network_spec() -> Arc<BeaconNetworkSpec> {
    BEACON_NETWORK_SPEC
        .get()
        .expect("BeaconNetworkSpec wasn't set")
        .clone()
}

/// The subset of a consensus `config.yaml` needed to tell which attestation layout and signing
/// domain apply at a given epoch. Unknown keys are ignored, so full client configs parse.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct BeaconNetworkSpec {
    pub preset_base: String,
    #[serde(rename = "CONFIG_NAME")]
    pub network: Network,

    // Genesis
    #[serde(deserialize_with = "crate::b32_hex::deserialize")]
    pub genesis_fork_version: B32,

    // Forking
    #[serde(deserialize_with = "crate::b32_hex::deserialize")]
    pub altair_fork_version: B32,
    pub altair_fork_epoch: u64,
    #[serde(deserialize_with = "crate::b32_hex::deserialize")]
    pub bellatrix_fork_version: B32,
    pub bellatrix_fork_epoch: u64,
    #[serde(deserialize_with = "crate::b32_hex::deserialize")]
    pub capella_fork_version: B32,
    pub capella_fork_epoch: u64,
    #[serde(deserialize_with = "crate::b32_hex::deserialize")]
    pub deneb_fork_version: B32,
    pub deneb_fork_epoch: u64,
    #[serde(deserialize_with = "crate::b32_hex::deserialize")]
    pub electra_fork_version: B32,
    pub electra_fork_epoch: u64,

    // Time parameters
    pub seconds_per_slot: u64,
}

impl BeaconNetworkSpec {
    pub fn fork_epoch(&self, fork: ForkName) -> u64 {
        match fork {
            ForkName::Phase0 => 0,
            ForkName::Altair => self.altair_fork_epoch,
            ForkName::Bellatrix => self.bellatrix_fork_epoch,
            ForkName::Capella => self.capella_fork_epoch,
            ForkName::Deneb => self.deneb_fork_epoch,
            ForkName::Electra => self.electra_fork_epoch,
        }
    }

    pub fn fork_version(&self, fork: ForkName) -> B32 {
        match fork {
            ForkName::Phase0 => self.genesis_fork_version,
            ForkName::Altair => self.altair_fork_version,
            ForkName::Bellatrix => self.bellatrix_fork_version,
            ForkName::Capella => self.capella_fork_version,
            ForkName::Deneb => self.deneb_fork_version,
            ForkName::Electra => self.electra_fork_version,
        }
    }

    /// Returns the latest fork activated at or before `epoch`.
    pub fn fork_at_epoch(&self, epoch: u64) -> ForkName {
        ForkName::ALL
            .into_iter()
            .rev()
            .find(|&fork| epoch >= self.fork_epoch(fork))
            .unwrap_or_default()
    }
}

pub static MAINNET: LazyLock<Arc<BeaconNetworkSpec>> = LazyLock::new(|| {
    BeaconNetworkSpec {
        preset_base: "mainnet".to_string(),
        network: Network::Mainnet,
        genesis_fork_version: fixed_bytes!("0x00000000"),
        altair_fork_version: fixed_bytes!("0x01000000"),
        altair_fork_epoch: 74240,
        bellatrix_fork_version: fixed_bytes!("0x02000000"),
        bellatrix_fork_epoch: 144896,
        capella_fork_version: fixed_bytes!("0x03000000"),
        capella_fork_epoch: 194048,
        deneb_fork_version: fixed_bytes!("0x04000000"),
        deneb_fork_epoch: 269568,
        electra_fork_version: fixed_bytes!("0x05000000"),
        electra_fork_epoch: 364032,
        seconds_per_slot: 12,
    }
    .into()
});

pub static SEPOLIA: LazyLock<Arc<BeaconNetworkSpec>> = LazyLock::new(|| {
    BeaconNetworkSpec {
        preset_base: "mainnet".to_string(),
        network: Network::Sepolia,
        genesis_fork_version: fixed_bytes!("0x90000069"),
        altair_fork_version: fixed_bytes!("0x90000070"),
        altair_fork_epoch: 50,
        bellatrix_fork_version: fixed_bytes!("0x90000071"),
        bellatrix_fork_epoch: 100,
        capella_fork_version: fixed_bytes!("0x90000072"),
        capella_fork_epoch: 56832,
        deneb_fork_version: fixed_bytes!("0x90000073"),
        deneb_fork_epoch: 132608,
        electra_fork_version: fixed_bytes!("0x90000074"),
        electra_fork_epoch: 222464,
        seconds_per_slot: 12,
    }
    .into()
});

pub static HOODI: LazyLock<Arc<BeaconNetworkSpec>> = LazyLock::new(|| {
    BeaconNetworkSpec {
        preset_base: "mainnet".to_string(),
        network: Network::Hoodi,
        genesis_fork_version: fixed_bytes!("0x10000910"),
        altair_fork_version: fixed_bytes!("0x20000910"),
        altair_fork_epoch: 0,
        bellatrix_fork_version: fixed_bytes!("0x30000910"),
        bellatrix_fork_epoch: 0,
        capella_fork_version: fixed_bytes!("0x40000910"),
        capella_fork_epoch: 0,
        deneb_fork_version: fixed_bytes!("0x50000910"),
        deneb_fork_epoch: 0,
        electra_fork_version: fixed_bytes!("0x60000910"),
        electra_fork_epoch: 2048,
        seconds_per_slot: 12,
    }
    .into()
});

/// Local network with every fork active from genesis.
pub static DEV: LazyLock<Arc<BeaconNetworkSpec>> = LazyLock::new(|| {
    BeaconNetworkSpec {
        preset_base: "mainnet".to_string(),
        network: Network::Dev,
        genesis_fork_version: fixed_bytes!("0x00000000"),
        altair_fork_version: fixed_bytes!("0x01000000"),
        altair_fork_epoch: 0,
        bellatrix_fork_version: fixed_bytes!("0x02000000"),
        bellatrix_fork_epoch: 0,
        capella_fork_version: fixed_bytes!("0x03000000"),
        capella_fork_epoch: 0,
        deneb_fork_version: fixed_bytes!("0x04000000"),
        deneb_fork_epoch: 0,
        electra_fork_version: fixed_bytes!("0x05000000"),
        electra_fork_epoch: 0,
        seconds_per_slot: 12,
    }
    .into()
});
