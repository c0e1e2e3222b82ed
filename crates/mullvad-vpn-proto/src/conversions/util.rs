// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use super::error::ConversionError;

pub(crate) fn timestamp_from_offset_datetime(
    datetime: time::OffsetDateTime,
) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: datetime.unix_timestamp(),
        nanos: datetime.nanosecond() as i32,
    }
}

pub(crate) fn offset_datetime_from_timestamp(
    timestamp: prost_types::Timestamp,
) -> Result<time::OffsetDateTime, ConversionError> {
    let datetime = time::OffsetDateTime::from_unix_timestamp(timestamp.seconds)
        .map_err(|_| ConversionError::Timestamp)?;
    Ok(datetime + time::Duration::nanoseconds(i64::from(timestamp.nanos)))
}

pub(crate) fn key_from_bytes(bytes: &[u8], field: &'static str) -> Result<[u8; 32], ConversionError> {
    <[u8; 32]>::try_from(bytes).map_err(|_| ConversionError::InvalidValue(field))
}

pub(crate) fn arg_from_str<T: std::str::FromStr>(
    s: &str,
    field: &'static str,
) -> Result<T, ConversionError> {
    s.parse().map_err(|_| ConversionError::InvalidValue(field))
}
