// Relayed transactions: a relayer pays the fee of a transaction signed by
// another account.
//
// v1: `relayedTx@<json of the signed inner transaction>` from the relayer to the inner sender
// v2: `relayedTxV2@<receiver>@<nonce>@<data>@<signature>`; the inner transaction is signed
//     with a zero gas limit and runs on the relayer's gas
// v3: the transaction itself carries `relayer` and `relayerSignature`

use shardnet_common::{
    config::{BUILTIN_RELAYED_V1, BUILTIN_RELAYED_V2},
    crypto::{Address, Signature},
    transaction::{args::top_decode_u64, CallData, Transaction},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Relaying {
    Direct,
    V1,
    V2,
    V3,
}

impl Relaying {
    /// Whether the inner sender signed a transaction of its own (and spends a nonce for it)
    pub(crate) fn has_inner_nonce(self) -> bool {
        matches!(self, Relaying::V1 | Relaying::V2)
    }
}

/// What a transaction executes and who pays for it
pub(crate) struct Unwrapped {
    pub(crate) relaying: Relaying,
    // Sender, receiver, value, data and nonce of the execution; gas is the outer transaction's
    pub(crate) inner: Transaction,
    pub(crate) payer: Address,
}

fn is_relayed_data(data: &[u8]) -> bool {
    CallData::parse(data)
        .map(|d| d.function() == BUILTIN_RELAYED_V1 || d.function() == BUILTIN_RELAYED_V2)
        .unwrap_or(false)
}

/// Decode the transaction to execute. The outer signature has been checked already.
pub(crate) fn unwrap(tx: &Transaction) -> Result<Unwrapped, String> {
    if let Some(relayer) = tx.relayer {
        tx.verify_relayer_signature()
            .map_err(|_| "invalid relayer signature".to_string())?;
        return Ok(Unwrapped {
            relaying: Relaying::V3,
            inner: tx.clone(),
            payer: relayer,
        });
    }

    let direct = || Unwrapped {
        relaying: Relaying::Direct,
        inner: tx.clone(),
        payer: tx.sender,
    };
    let Ok(data) = CallData::parse(&tx.data) else {
        return Ok(direct());
    };

    let (relaying, inner) = match (data.function(), data.args()) {
        (BUILTIN_RELAYED_V1, [payload]) => {
            let inner: Transaction = serde_json::from_slice(payload)
                .map_err(|e| format!("invalid relayed transaction: {}", e))?;
            (Relaying::V1, inner)
        }
        (BUILTIN_RELAYED_V2, [receiver, nonce, inner_data, signature]) => {
            let receiver = Address::from_slice(receiver)
                .map_err(|_| "invalid relayed transaction receiver".to_string())?;
            let nonce = top_decode_u64(nonce)
                .map_err(|_| "invalid relayed transaction nonce".to_string())?;
            let signature = Signature::from_slice(signature)
                .map_err(|_| "invalid inner transaction signature".to_string())?;
            let inner = Transaction {
                nonce,
                value: 0,
                receiver,
                sender: tx.receiver,
                gas_price: tx.gas_price,
                gas_limit: 0,
                data: inner_data.clone(),
                chain_id: tx.chain_id.clone(),
                version: tx.version,
                signature: Some(signature),
                relayer: None,
                relayer_signature: None,
            };
            (Relaying::V2, inner)
        }
        (BUILTIN_RELAYED_V1 | BUILTIN_RELAYED_V2, _) => {
            return Err("invalid relayed transaction arguments".to_string())
        }
        _ => return Ok(direct()),
    };

    if tx.value != 0 {
        return Err("relayed transaction must not carry value".to_string());
    }
    if inner.sender != tx.receiver {
        return Err("relayed transaction sender mismatch".to_string());
    }
    if inner.chain_id != tx.chain_id {
        return Err("invalid inner transaction chain ID".to_string());
    }
    if inner.relayer.is_some() || is_relayed_data(&inner.data) {
        return Err("nested relayed transaction".to_string());
    }
    inner
        .verify_signature()
        .map_err(|_| "invalid inner transaction signature".to_string())?;

    Ok(Unwrapped {
        relaying,
        inner: Transaction {
            gas_limit: tx.gas_limit,
            gas_price: tx.gas_price,
            ..inner
        },
        payer: tx.sender,
    })
}
