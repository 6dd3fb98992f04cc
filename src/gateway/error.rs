// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gateway error taxonomy.
//!
//! Every variant aborts the whole operation. Variants carry the actor, the
//! attempted value and the bound that was hit so a caller can rebuild a
//! valid request without a second round-trip.

use alloy::primitives::{Address, I256, U256};

use crate::chain::ChainError;
use crate::ledger::LedgerError;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    // Input validation
    #[error("Recipient must not be the zero address")]
    ZeroRecipient,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("{field} must not be the zero address")]
    ZeroAddress { field: &'static str },

    #[error("Unsupported asset {asset}")]
    UnsupportedAsset { asset: Address },

    // Authorization
    #[error("Signature expired at {deadline} (now {now})")]
    SignatureExpired { deadline: u64, now: u64 },

    #[error("Malformed signature: {0}")]
    InvalidSignature(String),

    #[error("Recovered signer {recovered} is not trusted")]
    InvalidSigner { recovered: Address },

    #[error("{actor} is not allowed to administer this gateway")]
    Unauthorized { actor: Address },

    #[error("{setting} must be greater than zero")]
    ZeroSetting { setting: &'static str },

    // Quota
    #[error("Daily limit exceeded for {user}: {attempted} > {limit}")]
    DailyLimitExceeded {
        user: Address,
        attempted: U256,
        limit: U256,
    },

    // Oracle
    #[error("Averaging window must be greater than zero")]
    WindowTooSmall,

    #[error("Oracle {feed} answered non-positive value {answer}")]
    OracleAnswerNotPositive { feed: Address, answer: I256 },

    #[error("Oracle {feed} is stale: updated at {updated_at}, now {now}, max delay {max_delay}s")]
    OracleDataStale {
        feed: Address,
        updated_at: u64,
        now: u64,
        max_delay: u64,
    },

    #[error("Tick {tick} is outside the representable range")]
    TickOutOfRange { tick: i32 },

    #[error("Derived USD price for {asset} is zero")]
    ZeroTokenPrice { asset: Address },

    // Fee sanity
    #[error("Fee {fee} must be lower than amount {amount}")]
    FeeTooLarge { fee: U256, amount: U256 },

    // Queries
    #[error("Usage entry {index} out of bounds for {user} on day {day} (count {count})")]
    DailyUsageEntryOutOfBounds {
        user: Address,
        day: u64,
        index: u64,
        count: u64,
    },

    // Execution
    #[error("A withdrawal is already in flight on this gateway")]
    ReentrantCall,

    #[error("Arithmetic overflow: {context}")]
    ArithmeticOverflow { context: &'static str },

    /// The net amount reached the recipient but the fee transfer failed.
    /// The nonce is consumed regardless.
    #[error("Withdrawal with nonce {nonce} paid out, fee {fee} unsettled: {reason}")]
    FeeUnsettled {
        nonce: u64,
        fee: U256,
        reason: ChainError,
    },

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl GatewayError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::ZeroRecipient => "zero_recipient",
            GatewayError::ZeroAmount => "zero_amount",
            GatewayError::ZeroAddress { .. } => "zero_address",
            GatewayError::UnsupportedAsset { .. } => "unsupported_asset",
            GatewayError::SignatureExpired { .. } => "signature_expired",
            GatewayError::InvalidSignature(_) => "invalid_signature",
            GatewayError::InvalidSigner { .. } => "invalid_signer",
            GatewayError::Unauthorized { .. } => "unauthorized",
            GatewayError::ZeroSetting { .. } => "zero_setting",
            GatewayError::DailyLimitExceeded { .. } => "daily_limit_exceeded",
            GatewayError::WindowTooSmall => "window_too_small",
            GatewayError::OracleAnswerNotPositive { .. } => "oracle_answer_not_positive",
            GatewayError::OracleDataStale { .. } => "oracle_data_stale",
            GatewayError::TickOutOfRange { .. } => "tick_out_of_range",
            GatewayError::ZeroTokenPrice { .. } => "zero_token_price",
            GatewayError::FeeTooLarge { .. } => "fee_too_large",
            GatewayError::DailyUsageEntryOutOfBounds { .. } => "daily_usage_entry_out_of_bounds",
            GatewayError::ReentrantCall => "reentrant_call",
            GatewayError::ArithmeticOverflow { .. } => "arithmetic_overflow",
            GatewayError::FeeUnsettled { .. } => "fee_unsettled",
            GatewayError::Chain(_) => "chain_error",
            GatewayError::Ledger(_) => "ledger_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_structured_detail() {
        let err = GatewayError::DailyLimitExceeded {
            user: Address::repeat_byte(0xab),
            attempted: U256::from(150u8),
            limit: U256::from(100u8),
        };
        let message = err.to_string();
        assert!(message.contains("150 > 100"));
        assert_eq!(err.error_code(), "daily_limit_exceeded");
    }

    #[test]
    fn chain_errors_keep_their_message() {
        let err: GatewayError = ChainError::Rpc("connection reset".into()).into();
        assert_eq!(err.to_string(), "RPC error: connection reset");
        assert_eq!(err.error_code(), "chain_error");
    }
}
