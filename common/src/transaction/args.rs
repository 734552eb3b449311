// Contract call data: `function@arg1@arg2...` with hex-encoded arguments.
// Deployments use `code@vmType@codeMetadata@args...` in the same layout.

use std::fmt;
use thiserror::Error;

use crate::config::{
    CODE_METADATA_PAYABLE, CODE_METADATA_PAYABLE_BY_CONTRACT, CODE_METADATA_READABLE,
    CODE_METADATA_UPGRADEABLE, VM_TYPE_WASM,
};
use crate::crypto::Address;

pub const ARGS_SEPARATOR: char = '@';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    #[error("Data field is not valid UTF-8")]
    InvalidUtf8,
    #[error("Empty function name")]
    EmptyFunction,
    #[error("Argument #{index} is not valid hex: '{segment}'")]
    InvalidHex { index: usize, segment: String },
    #[error("Value of {len} bytes does not fit in {target}")]
    Overflow { len: usize, target: &'static str },
}

/// Minimal big-endian encoding of an unsigned integer (zero encodes as empty)
pub fn top_encode_biguint(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

pub fn top_decode_biguint(bytes: &[u8]) -> Result<u128, ArgsError> {
    let significant = strip_leading_zeros(bytes);
    if significant.len() > 16 {
        return Err(ArgsError::Overflow {
            len: significant.len(),
            target: "u128",
        });
    }
    Ok(significant
        .iter()
        .fold(0u128, |acc, b| (acc << 8) | *b as u128))
}

pub fn top_decode_u64(bytes: &[u8]) -> Result<u64, ArgsError> {
    let significant = strip_leading_zeros(bytes);
    if significant.len() > 8 {
        return Err(ArgsError::Overflow {
            len: significant.len(),
            target: "u64",
        });
    }
    Ok(significant.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

/// A typed contract argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractArg {
    BigUint(u128),
    U64(u64),
    Bool(bool),
    Bytes(Vec<u8>),
    Str(String),
    Address(Address),
}

impl ContractArg {
    pub fn to_top_bytes(&self) -> Vec<u8> {
        match self {
            ContractArg::BigUint(v) => top_encode_biguint(*v),
            ContractArg::U64(v) => top_encode_biguint(*v as u128),
            ContractArg::Bool(true) => vec![1],
            ContractArg::Bool(false) => Vec::new(),
            ContractArg::Bytes(b) => b.clone(),
            ContractArg::Str(s) => s.as_bytes().to_vec(),
            ContractArg::Address(a) => a.as_bytes().to_vec(),
        }
    }
}

impl From<u64> for ContractArg {
    fn from(v: u64) -> Self {
        ContractArg::U64(v)
    }
}

impl From<u128> for ContractArg {
    fn from(v: u128) -> Self {
        ContractArg::BigUint(v)
    }
}

impl From<bool> for ContractArg {
    fn from(v: bool) -> Self {
        ContractArg::Bool(v)
    }
}

impl From<&str> for ContractArg {
    fn from(v: &str) -> Self {
        ContractArg::Str(v.to_string())
    }
}

impl From<Address> for ContractArg {
    fn from(v: Address) -> Self {
        ContractArg::Address(v)
    }
}

impl From<Vec<u8>> for ContractArg {
    fn from(v: Vec<u8>) -> Self {
        ContractArg::Bytes(v)
    }
}

/// Function name plus raw (already top-encoded) arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallData {
    function: String,
    args: Vec<Vec<u8>>,
}

impl CallData {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<ContractArg>) -> Self {
        self.args.push(arg.into().to_top_bytes());
        self
    }

    pub fn raw_arg(mut self, bytes: Vec<u8>) -> Self {
        self.args.push(bytes);
        self
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Parse a data field. Fails on non UTF-8 data, a missing function name or non-hex arguments.
    pub fn parse(data: &[u8]) -> Result<Self, ArgsError> {
        let text = std::str::from_utf8(data).map_err(|_| ArgsError::InvalidUtf8)?;
        let mut parts = text.split(ARGS_SEPARATOR);
        let function = parts.next().unwrap_or_default();
        if function.is_empty() {
            return Err(ArgsError::EmptyFunction);
        }

        let args = parts
            .enumerate()
            .map(|(index, segment)| {
                hex::decode(segment).map_err(|_| ArgsError::InvalidHex {
                    index,
                    segment: segment.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            function: function.to_string(),
            args,
        })
    }
}

impl fmt::Display for CallData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function)?;
        for arg in &self.args {
            write!(f, "{}{}", ARGS_SEPARATOR, hex::encode(arg))?;
        }
        Ok(())
    }
}

/// Decode a `@<hex>@<hex>...` result string, as found in contract results.
pub fn split_result_data(data: &str) -> Result<Vec<Vec<u8>>, ArgsError> {
    data.strip_prefix(ARGS_SEPARATOR)
        .unwrap_or(data)
        .split(ARGS_SEPARATOR)
        .enumerate()
        .map(|(index, segment)| {
            hex::decode(segment).map_err(|_| ArgsError::InvalidHex {
                index,
                segment: segment.to_string(),
            })
        })
        .collect()
}

/// Contract code metadata flags, two bytes on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeMetadata {
    pub upgradeable: bool,
    pub readable: bool,
    pub payable: bool,
    pub payable_by_contract: bool,
}

impl CodeMetadata {
    pub fn to_bytes(&self) -> [u8; 2] {
        let mut bytes = [0u8; 2];
        if self.upgradeable {
            bytes[0] |= CODE_METADATA_UPGRADEABLE;
        }
        if self.readable {
            bytes[0] |= CODE_METADATA_READABLE;
        }
        if self.payable {
            bytes[1] |= CODE_METADATA_PAYABLE;
        }
        if self.payable_by_contract {
            bytes[1] |= CODE_METADATA_PAYABLE_BY_CONTRACT;
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let first = bytes.first().copied().unwrap_or_default();
        let second = bytes.get(1).copied().unwrap_or_default();
        Self {
            upgradeable: first & CODE_METADATA_UPGRADEABLE != 0,
            readable: first & CODE_METADATA_READABLE != 0,
            payable: second & CODE_METADATA_PAYABLE != 0,
            payable_by_contract: second & CODE_METADATA_PAYABLE_BY_CONTRACT != 0,
        }
    }
}

/// Data field of a deployment: `<code>@<vm type>@<metadata>@<args...>`
pub fn deploy_data(code: &[u8], metadata: CodeMetadata, args: &[ContractArg]) -> CallData {
    let mut data = CallData::new(hex::encode(code))
        .raw_arg(VM_TYPE_WASM.to_vec())
        .raw_arg(metadata.to_bytes().to_vec());
    for arg in args {
        data = data.raw_arg(arg.to_top_bytes());
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biguint_top_encoding() {
        assert_eq!(top_encode_biguint(0), Vec::<u8>::new());
        assert_eq!(top_encode_biguint(3), vec![3]);
        assert_eq!(top_encode_biguint(256), vec![1, 0]);
        assert_eq!(top_decode_biguint(&[0, 0, 1, 0]).unwrap(), 256);
        assert_eq!(top_decode_biguint(&[]).unwrap(), 0);
        assert!(top_decode_biguint(&[1; 17]).is_err());
        assert!(top_decode_u64(&[1; 9]).is_err());
    }

    #[test]
    fn test_call_data_format() {
        let data = CallData::new("add").arg(3u64).arg("ab").arg(true);
        assert_eq!(data.to_string(), "add@03@6162@01");

        let parsed = CallData::parse(data.to_string().as_bytes()).unwrap();
        assert_eq!(parsed.function(), "add");
        assert_eq!(parsed.args(), &[vec![3], b"ab".to_vec(), vec![1]]);
    }

    #[test]
    fn test_call_data_rejects_malformed() {
        assert_eq!(
            CallData::parse(b"hello@aa.bb.cc"),
            Err(ArgsError::InvalidHex {
                index: 0,
                segment: "aa.bb.cc".to_string()
            })
        );
        assert_eq!(CallData::parse(b"@01"), Err(ArgsError::EmptyFunction));
        assert_eq!(CallData::parse(&[0xff, 0xfe]), Err(ArgsError::InvalidUtf8));
        assert_eq!(CallData::parse(b"hello").unwrap().args().len(), 0);
    }

    #[test]
    fn test_zero_arg_is_empty_segment() {
        let data = CallData::new("add").arg(0u64);
        assert_eq!(data.to_string(), "add@");
        let parsed = CallData::parse(b"add@").unwrap();
        assert_eq!(parsed.args(), &[Vec::<u8>::new()]);
    }

    #[test]
    fn test_split_result_data() {
        let parts = split_result_data("@6f6b@2a").unwrap();
        assert_eq!(parts, vec![b"ok".to_vec(), vec![0x2a]]);
    }

    #[test]
    fn test_deploy_data() {
        let metadata = CodeMetadata {
            upgradeable: true,
            ..Default::default()
        };
        let data = deploy_data(b"\x00asm", metadata, &[ContractArg::BigUint(42)]);
        assert_eq!(data.to_string(), "0061736d@0500@0100@2a");
        assert_eq!(CodeMetadata::from_bytes(&metadata.to_bytes()), metadata);
    }
}
