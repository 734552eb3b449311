// Serde helpers for the JSON wire format

/// Serialize big amounts (`u128`) as decimal strings.
///
/// JSON numbers lose precision above 2^53 in most clients, so balances,
/// values and fees always travel as strings.
pub mod amount_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Format an atomic amount with the given number of decimals ("1.5" for 15 with 1 decimal).
pub fn format_amount(amount: u128, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }

    // Past 38 decimals the unit exceeds u128, so every amount is below one unit
    let (integer, fraction) = match 10u128.checked_pow(decimals) {
        Some(unit) => (amount / unit, amount % unit),
        None => (0, amount),
    };
    if fraction == 0 {
        return integer.to_string();
    }

    let fraction = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", integer, fraction.trim_end_matches('0'))
}
