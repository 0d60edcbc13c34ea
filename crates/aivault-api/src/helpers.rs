//! Request field validation shared by the handlers.

use aivault_chain::parse_address;
use aivault_strategy::MAX_SLIPPAGE_BPS;
use ethers::types::Address;
use uuid::Uuid;

use crate::errors::ApiError;

const MAX_PERCENTAGE: i64 = 1000;
const UINT24_LIMIT: i64 = 1 << 24;
const INT24_MIN: i64 = -(1 << 23);
const INT24_MAX: i64 = (1 << 23) - 1;

pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("Invalid {what} id '{raw}'")))
}

pub fn address(field: &str, raw: &str) -> Result<Address, ApiError> {
    parse_address(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {field} '{raw}'")))
}

pub fn non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

/// Non-empty and at most `max` characters, trimmed.
pub fn bounded<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str, ApiError> {
    let trimmed = non_empty(field, value)?;
    let length = trimmed.chars().count();
    if length > max {
        return Err(ApiError::BadRequest(format!(
            "{field} must be at most {max} characters, got {length}"
        )));
    }
    Ok(trimmed)
}

pub fn adapter_index(value: i64) -> Result<u32, ApiError> {
    u32::try_from(value).map_err(|_| {
        ApiError::BadRequest(format!(
            "adapter_index must be between 0 and {}, got {value}",
            u32::MAX
        ))
    })
}

/// Allocation share in tenths of a percent.
pub fn percentage(field: &str, value: i64) -> Result<u16, ApiError> {
    if !(0..=MAX_PERCENTAGE).contains(&value) {
        return Err(ApiError::BadRequest(format!(
            "{field} must be between 0 and {MAX_PERCENTAGE}, got {value}"
        )));
    }
    Ok(value as u16)
}

pub fn slippage(value: i64) -> Result<u32, ApiError> {
    if !(0..=i64::from(MAX_SLIPPAGE_BPS)).contains(&value) {
        return Err(ApiError::BadRequest(format!(
            "slippage_tolerance must be between 0 and {MAX_SLIPPAGE_BPS} bps, got {value}"
        )));
    }
    Ok(value as u32)
}

pub fn fee_tier(value: i64) -> Result<u32, ApiError> {
    if !(0..UINT24_LIMIT).contains(&value) {
        return Err(ApiError::BadRequest(format!(
            "fee_tier must fit in uint24, got {value}"
        )));
    }
    Ok(value as u32)
}

pub fn tick(field: &str, value: i64) -> Result<i32, ApiError> {
    if !(INT24_MIN..=INT24_MAX).contains(&value) {
        return Err(ApiError::BadRequest(format!(
            "{field} must fit in int24, got {value}"
        )));
    }
    Ok(value as i32)
}
