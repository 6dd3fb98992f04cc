// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The two managed assets and their lookup table.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Managed asset variants.
///
/// - `Token` is quota-controlled and priced through the averaging pool
///   against wrapped ether.
/// - `Stable` is priced directly from its USD feed and has no quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Token,
    Stable,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Token => write!(f, "token"),
            AssetKind::Stable => write!(f, "stable"),
        }
    }
}

/// Token handle, decimals and quota flag for one managed asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetInfo {
    pub kind: AssetKind,
    pub address: Address,
    pub decimals: u8,
    pub quota_controlled: bool,
}

impl AssetInfo {
    pub fn token(address: Address, decimals: u8) -> Self {
        Self {
            kind: AssetKind::Token,
            address,
            decimals,
            quota_controlled: true,
        }
    }

    pub fn stable(address: Address, decimals: u8) -> Self {
        Self {
            kind: AssetKind::Stable,
            address,
            decimals,
            quota_controlled: false,
        }
    }
}

/// Fixed lookup from asset address to its [`AssetInfo`].
#[derive(Debug, Clone)]
pub struct AssetTable {
    entries: [AssetInfo; 2],
}

impl AssetTable {
    pub fn new(token: AssetInfo, stable: AssetInfo) -> Self {
        Self {
            entries: [token, stable],
        }
    }

    /// Resolve an asset address. Unknown and zero addresses return `None`.
    pub fn lookup(&self, asset: &Address) -> Option<&AssetInfo> {
        if asset.is_zero() {
            return None;
        }
        self.entries.iter().find(|info| &info.address == asset)
    }

    pub fn get(&self, kind: AssetKind) -> &AssetInfo {
        match kind {
            AssetKind::Token => &self.entries[0],
            AssetKind::Stable => &self.entries[1],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetInfo> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_resolves_only_managed_assets() {
        let table = AssetTable::new(
            AssetInfo::token(Address::repeat_byte(0x01), 18),
            AssetInfo::stable(Address::repeat_byte(0x02), 6),
        );

        let token = table.lookup(&Address::repeat_byte(0x01)).unwrap();
        assert_eq!(token.kind, AssetKind::Token);
        assert!(token.quota_controlled);

        let stable = table.lookup(&Address::repeat_byte(0x02)).unwrap();
        assert_eq!(stable.decimals, 6);
        assert!(!stable.quota_controlled);

        assert!(table.lookup(&Address::repeat_byte(0x03)).is_none());
        assert!(table.lookup(&Address::ZERO).is_none());
    }
}
