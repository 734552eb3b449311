use serde::{Deserialize, Serialize};

use super::ReturnCode;
use crate::{
    crypto::Address,
    transaction::{args::top_decode_biguint, ArgsError, ContractArg},
    utils::amount_string,
};

/// Read-only contract call, executed without a transaction
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContractQuery {
    pub sc_address: Address,
    pub func_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<Address>,
    #[serde(default, with = "amount_string")]
    pub value: u128,
    // hex encoded arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl ContractQuery {
    pub fn new(address: Address, function: impl Into<String>) -> Self {
        Self {
            sc_address: address,
            func_name: function.into(),
            caller: None,
            value: 0,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<ContractArg>) -> Self {
        self.args.push(hex::encode(arg.into().to_top_bytes()));
        self
    }

    pub fn with_caller(mut self, caller: Address) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn args_bytes(&self) -> Result<Vec<Vec<u8>>, ArgsError> {
        self.args
            .iter()
            .enumerate()
            .map(|(index, a)| {
                hex::decode(a).map_err(|_| ArgsError::InvalidHex {
                    index,
                    segment: a.clone(),
                })
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub return_code: ReturnCode,
    #[serde(default)]
    pub return_message: String,
    // hex encoded values
    #[serde(default)]
    pub return_data: Vec<String>,
}

impl QueryResponse {
    pub fn is_success(&self) -> bool {
        self.return_code.is_success()
    }

    pub fn return_data_bytes(&self) -> Result<Vec<Vec<u8>>, ArgsError> {
        self.return_data
            .iter()
            .enumerate()
            .map(|(index, d)| {
                hex::decode(d).map_err(|_| ArgsError::InvalidHex {
                    index,
                    segment: d.clone(),
                })
            })
            .collect()
    }

    /// First returned value decoded as an unsigned integer (missing value is zero)
    pub fn first_as_biguint(&self) -> Result<u128, ArgsError> {
        let data = self.return_data_bytes()?;
        match data.first() {
            Some(bytes) => top_decode_biguint(bytes),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_args() {
        let query = ContractQuery::new(Address::new([5; 32]), "getSum").arg(256u64);
        assert_eq!(query.args, vec!["0100".to_string()]);
        assert_eq!(query.args_bytes().unwrap(), vec![vec![1, 0]]);
    }

    #[test]
    fn test_response_decoding() {
        let response = QueryResponse {
            return_code: ReturnCode::Ok,
            return_message: String::new(),
            return_data: vec!["2a".to_string()],
        };
        assert!(response.is_success());
        assert_eq!(response.first_as_biguint().unwrap(), 42);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["returnCode"], "ok");
    }
}
