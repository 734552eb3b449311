// File: testing-framework/src/testnet/programs.rs
//
// Contract programs for the in-process network
//
// A deployment carries code bytes; the network maps them to a registered
// `ContractProgram`. Programs work on a plain key/value storage.

use shardnet_common::{
    api::ReturnCode,
    crypto::Address,
    transaction::args::{top_decode_biguint, top_encode_biguint},
};
use std::collections::BTreeMap;

/// Code bytes of the adder demo contract
pub const ADDER_CODE: &[u8] = b"\0asm\x01\0\0\0adder";

// Gas consumed by one call, unless a program says otherwise
pub const DEFAULT_EXECUTION_GAS: u64 = 1_000_000;

pub type ContractStorage = BTreeMap<Vec<u8>, Vec<u8>>;

/// Failed contract execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    pub code: ReturnCode,
    pub message: String,
}

impl ContractError {
    pub fn new(code: ReturnCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ReturnCode::UserError, message)
    }

    pub fn function_not_found() -> Self {
        Self::new(ReturnCode::FunctionNotFound, "invalid function (not found)")
    }

    pub fn wrong_signature(message: impl Into<String>) -> Self {
        Self::new(ReturnCode::FunctionWrongSignature, message)
    }
}

pub type ContractResult = Result<Vec<Vec<u8>>, ContractError>;

/// State visible to a state-changing execution
pub struct CallContext<'a> {
    pub caller: Address,
    pub contract: Address,
    pub value: u128,
    pub storage: &'a mut ContractStorage,
}

/// State visible to a read-only query
pub struct QueryContext<'a> {
    pub caller: Option<Address>,
    pub contract: Address,
    pub storage: &'a ContractStorage,
}

pub trait ContractProgram: Send + Sync {
    /// Constructor, run once at deployment
    fn init(&self, ctx: &mut CallContext<'_>, args: &[Vec<u8>]) -> ContractResult;

    /// Whether `function` is an endpoint of this program
    fn has_function(&self, function: &str) -> bool;

    fn call(&self, ctx: &mut CallContext<'_>, function: &str, args: &[Vec<u8>]) -> ContractResult;

    fn query(&self, ctx: &QueryContext<'_>, function: &str, args: &[Vec<u8>]) -> ContractResult;

    /// Gas consumed by one execution of `function`
    fn gas_used(&self, _function: &str) -> u64 {
        DEFAULT_EXECUTION_GAS
    }
}

/// Adder: keeps a sum, `add(value)` increases it, `getSum` reads it.
/// No endpoint accepts payments.
pub struct AdderProgram;

const SUM_KEY: &[u8] = b"sum";

impl AdderProgram {
    fn read_sum(storage: &ContractStorage) -> Result<u128, ContractError> {
        match storage.get(SUM_KEY) {
            Some(bytes) => {
                top_decode_biguint(bytes).map_err(|e| ContractError::user(e.to_string()))
            }
            None => Ok(0),
        }
    }

    fn single_biguint(args: &[Vec<u8>]) -> Result<u128, ContractError> {
        match args {
            [value] => top_decode_biguint(value).map_err(|e| ContractError::user(e.to_string())),
            _ => Err(ContractError::wrong_signature("wrong number of arguments")),
        }
    }

    fn reject_payment(ctx: &CallContext<'_>) -> Result<(), ContractError> {
        if ctx.value > 0 {
            return Err(ContractError::user("function does not accept native payment"));
        }
        Ok(())
    }
}

impl ContractProgram for AdderProgram {
    fn init(&self, ctx: &mut CallContext<'_>, args: &[Vec<u8>]) -> ContractResult {
        Self::reject_payment(ctx)?;
        let initial = Self::single_biguint(args)?;
        ctx.storage.insert(SUM_KEY.to_vec(), top_encode_biguint(initial));
        Ok(Vec::new())
    }

    fn has_function(&self, function: &str) -> bool {
        matches!(function, "add" | "getSum")
    }

    fn call(&self, ctx: &mut CallContext<'_>, function: &str, args: &[Vec<u8>]) -> ContractResult {
        match function {
            "add" => {
                Self::reject_payment(ctx)?;
                let value = Self::single_biguint(args)?;
                let sum = Self::read_sum(ctx.storage)?
                    .checked_add(value)
                    .ok_or_else(|| ContractError::user("sum overflow"))?;
                ctx.storage.insert(SUM_KEY.to_vec(), top_encode_biguint(sum));
                Ok(Vec::new())
            }
            "getSum" => Ok(vec![top_encode_biguint(Self::read_sum(ctx.storage)?)]),
            _ => Err(ContractError::function_not_found()),
        }
    }

    fn query(&self, ctx: &QueryContext<'_>, function: &str, _args: &[Vec<u8>]) -> ContractResult {
        match function {
            "getSum" => Ok(vec![top_encode_biguint(Self::read_sum(ctx.storage)?)]),
            _ => Err(ContractError::function_not_found()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_ctx(storage: &mut ContractStorage, value: u128) -> CallContext<'_> {
        CallContext {
            caller: Address::new([1; 32]),
            contract: Address::new([2; 32]),
            value,
            storage,
        }
    }

    #[test]
    fn test_adder_init_add_query() {
        let program = AdderProgram;
        let mut storage = ContractStorage::new();

        program.init(&mut call_ctx(&mut storage, 0), &[vec![42]]).unwrap();
        program
            .call(&mut call_ctx(&mut storage, 0), "add", &[vec![3]])
            .unwrap();

        let ctx = QueryContext {
            caller: None,
            contract: Address::new([2; 32]),
            storage: &storage,
        };
        assert_eq!(program.query(&ctx, "getSum", &[]).unwrap(), vec![vec![45]]);
    }

    #[test]
    fn test_adder_rejects_payment() {
        let program = AdderProgram;
        let mut storage = ContractStorage::new();
        let err = program
            .call(&mut call_ctx(&mut storage, 1), "add", &[vec![1]])
            .unwrap_err();
        assert_eq!(err.code, ReturnCode::UserError);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_adder_wrong_arguments() {
        let program = AdderProgram;
        let mut storage = ContractStorage::new();
        let err = program
            .call(&mut call_ctx(&mut storage, 0), "add", &[])
            .unwrap_err();
        assert_eq!(err.code, ReturnCode::FunctionWrongSignature);
        assert!(!program.has_function("hello"));
    }
}
