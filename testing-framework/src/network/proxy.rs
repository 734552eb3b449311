// File: testing-framework/src/network/proxy.rs
//
// HTTP network provider
//
// Talks to a network proxy over REST. Every response is wrapped in the
// `{ data, error, code }` envelope.

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shardnet_common::{
    api::{
        AccountOnNetwork, ApiResponse, BatchReceipt, ContractQuery, NetworkConfig, NetworkStatus,
        QueryResponse, TokenBalance, TransactionOnNetwork,
    },
    crypto::{Address, Hash},
    transaction::Transaction,
};
use std::time::Duration;

use super::{NetworkProvider, ProviderError, ProviderResult};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct ConfigPayload {
    config: NetworkConfig,
}

#[derive(Deserialize)]
struct StatusPayload {
    status: NetworkStatus,
}

#[derive(Deserialize)]
struct AccountPayload {
    account: AccountOnNetwork,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPayload {
    token_data: TokenBalance,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendPayload {
    tx_hash: Hash,
}

#[derive(Deserialize)]
struct TransactionPayload {
    transaction: TransactionOnNetwork,
}

#[derive(Deserialize)]
struct QueryPayload {
    data: QueryResponse,
}

/// Network provider backed by a REST proxy.
///
/// # Example
///
/// ```rust,ignore
/// let provider = ProxyNetworkProvider::new("http://localhost:7950")?;
/// let config = provider.get_network_config().await?;
/// ```
pub struct ProxyNetworkProvider {
    client: reqwest::Client,
    url: String,
}

impl ProxyNetworkProvider {
    pub fn new(url: impl Into<String>) -> ProviderResult<Self> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Malformed(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ProviderResult<T> {
        let url = format!("{}/{}", self.url, path);
        trace!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Transient(format!("GET {}: {}", path, e)))?;

        Self::handle_response(path, response, false).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ProviderResult<T> {
        let url = format!("{}/{}", self.url, path);
        trace!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Transient(format!("POST {}: {}", path, e)))?;

        Self::handle_response(path, response, true).await
    }

    // Map HTTP status and envelope errors onto ProviderError
    async fn handle_response<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
        is_submission: bool,
    ) -> ProviderResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transient(format!("{}: reading body: {}", path, e)))?;

        if log::log_enabled!(log::Level::Trace) {
            trace!("{} -> {} {}", path, status, body);
        }

        let envelope: Option<ApiResponse<T>> = serde_json::from_str(&body).ok();
        let error_text = envelope
            .as_ref()
            .map(|e| e.error.clone())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status));

        if status.is_server_error() {
            return Err(ProviderError::Transient(format!("{}: {}", path, error_text)));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(format!("{}: {}", path, error_text)));
        }
        if status == StatusCode::BAD_REQUEST && is_submission {
            return Err(ProviderError::Rejected(error_text));
        }
        if !status.is_success() {
            return Err(ProviderError::Malformed(format!("{}: {}", path, error_text)));
        }

        let envelope = envelope.ok_or_else(|| {
            ProviderError::Malformed(format!("{}: unexpected body '{}'", path, body))
        })?;
        if !envelope.error.is_empty() {
            return Err(if is_submission {
                ProviderError::Rejected(envelope.error)
            } else {
                ProviderError::Malformed(format!("{}: {}", path, envelope.error))
            });
        }

        envelope
            .data
            .ok_or_else(|| ProviderError::Malformed(format!("{}: missing data", path)))
    }
}

#[async_trait]
impl NetworkProvider for ProxyNetworkProvider {
    async fn get_network_config(&self) -> ProviderResult<NetworkConfig> {
        let payload: ConfigPayload = self.get("network/config").await?;
        Ok(payload.config)
    }

    async fn get_network_status(&self, shard: u32) -> ProviderResult<NetworkStatus> {
        let payload: StatusPayload = self.get(&format!("network/status/{}", shard)).await?;
        Ok(payload.status)
    }

    async fn get_account(&self, address: &Address) -> ProviderResult<AccountOnNetwork> {
        let payload: AccountPayload = self.get(&format!("address/{}", address)).await?;
        Ok(payload.account)
    }

    async fn get_token_balance(
        &self,
        address: &Address,
        identifier: &str,
        nonce: u64,
    ) -> ProviderResult<u128> {
        let path = format!("address/{}/token/{}/nonce/{}", address, identifier, nonce);
        match self.get::<TokenPayload>(&path).await {
            Ok(payload) => Ok(payload.token_data.balance),
            // An account never credited with the token holds none of it
            Err(ProviderError::NotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }

    async fn send_transaction(&self, tx: &Transaction) -> ProviderResult<Hash> {
        let payload: SendPayload = self.post("transaction/send", tx).await?;
        debug!("Sent transaction {} (nonce {} from {})", payload.tx_hash, tx.nonce, tx.sender);
        Ok(payload.tx_hash)
    }

    async fn send_transactions(&self, txs: &[Transaction]) -> ProviderResult<BatchReceipt> {
        let receipt: BatchReceipt = self.post("transaction/send-multiple", txs).await?;
        debug!(
            "Sent {} transactions, {} accepted",
            txs.len(),
            receipt.num_of_sent_txs
        );
        Ok(receipt)
    }

    async fn get_transaction(&self, hash: &Hash) -> ProviderResult<TransactionOnNetwork> {
        let payload: TransactionPayload = self
            .get(&format!("transaction/{}?withResults=true", hash))
            .await?;
        Ok(payload.transaction)
    }

    async fn query_contract(&self, query: &ContractQuery) -> ProviderResult<QueryResponse> {
        let payload: QueryPayload = self.post("vm-values/query", query).await?;
        Ok(payload.data)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a random local port
    async fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = vec![0u8; 4096];
            let mut received = Vec::new();
            loop {
                let n = socket.read(&mut buffer).await.unwrap();
                received.extend_from_slice(&buffer[..n]);
                if n == 0 || received.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_get_account_unwraps_envelope() {
        let address = Address::new([7; 32]);
        let body = serde_json::json!({
            "data": {
                "account": {
                    "address": address.to_hex(),
                    "nonce": 12,
                    "balance": "1000000000000000000000",
                    "shard": 1
                }
            },
            "error": "",
            "code": "successful"
        })
        .to_string();

        let url = serve_once("200 OK", body).await;
        let provider = ProxyNetworkProvider::new(url).unwrap();
        let account = provider.get_account(&address).await.unwrap();

        assert_eq!(account.nonce, 12);
        assert_eq!(account.balance, 1_000_000_000_000_000_000_000);
        assert_eq!(account.shard, 1);
    }

    #[tokio::test]
    async fn test_not_found_maps_to_not_found() {
        let body =
            r#"{"data":null,"error":"transaction not found","code":"not_found"}"#.to_string();
        let url = serve_once("404 Not Found", body).await;
        let provider = ProxyNetworkProvider::new(url).unwrap();

        let err = provider.get_transaction(&Hash::zero()).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("transaction not found"));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let url = serve_once("503 Service Unavailable", String::new()).await;
        let provider = ProxyNetworkProvider::new(url).unwrap();

        let err = provider.get_network_config().await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_envelope_error_on_read_is_malformed() {
        let body = r#"{"data":null,"error":"bad address","code":"internal_issue"}"#.to_string();
        let url = serve_once("200 OK", body).await;
        let provider = ProxyNetworkProvider::new(url).unwrap();

        let err = provider.get_network_status(0).await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_proxy_is_transient() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = ProxyNetworkProvider::with_timeout(
            format!("http://{}", addr),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = provider.get_network_config().await.unwrap_err();
        assert!(err.is_transient());
    }
}
