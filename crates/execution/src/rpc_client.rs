use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{Block, BlockId, BlockNumber, Transaction, H160, H256, U256 as EthU256},
};
use payloadscan_types::{ExecutionBlock, ExecutionTransaction};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{error::ExecutionClientError, traits::ExecutionClientTrait};

/// Execution node reached over JSON-RPC on HTTP.
#[derive(Clone, Debug)]
pub struct ExecutionRpcClient {
    provider: Provider<Http>,
    pub endpoint: Url,
}

impl ExecutionRpcClient {
    pub fn new(http: Client, endpoint: Url) -> Self {
        let provider = Provider::new(Http::new_with_client(endpoint.clone(), http));
        Self { provider, endpoint }
    }

    /// Client whose every request is bounded by `timeout`.
    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, ExecutionClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http, endpoint))
    }

    pub fn from_endpoint_str(endpoint: &str) -> Result<Self, ExecutionClientError> {
        Ok(Self::new(Client::new(), Url::parse(endpoint)?))
    }

    async fn get_block(
        &self,
        id: BlockId,
        full_transactions: bool,
    ) -> Result<Option<ExecutionBlock>, ExecutionClientError> {
        debug!(endpoint = %self.endpoint, ?id, full_transactions, "fetching block");

        if full_transactions {
            let Some(mut block) = self.provider.get_block_with_txs(id).await? else {
                return Ok(None)
            };
            let transactions = std::mem::take(&mut block.transactions)
                .into_iter()
                .map(to_execution_transaction)
                .collect();
            to_execution_block(block, transactions).map(Some)
        } else {
            match self.provider.get_block(id).await? {
                Some(block) => to_execution_block(block, Vec::new()).map(Some),
                None => Ok(None),
            }
        }
    }
}

#[async_trait]
impl ExecutionClientTrait for ExecutionRpcClient {
    async fn get_block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Option<ExecutionBlock>, ExecutionClientError> {
        self.get_block(BlockId::Hash(H256::from_slice(hash.as_slice())), full_transactions).await
    }

    async fn get_block_by_number(
        &self,
        number: u64,
        full_transactions: bool,
    ) -> Result<Option<ExecutionBlock>, ExecutionClientError> {
        self.get_block(block_id(number), full_transactions).await
    }

    async fn get_balance(&self, address: Address, number: u64) -> Result<U256, ExecutionClientError> {
        let balance = self
            .provider
            .get_balance(H160::from_slice(address.as_slice()), Some(block_id(number)))
            .await?;
        Ok(to_u256(balance))
    }

    fn get_uri(&self) -> String {
        self.endpoint.to_string()
    }
}

fn block_id(number: u64) -> BlockId {
    BlockId::Number(BlockNumber::Number(number.into()))
}

fn to_u256(value: EthU256) -> U256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    U256::from_be_bytes(bytes)
}

fn to_execution_transaction(tx: Transaction) -> ExecutionTransaction {
    ExecutionTransaction {
        hash: B256::from(tx.hash.0),
        from: Address::from(tx.from.0),
        to: tx.to.map(|to| Address::from(to.0)),
        value: to_u256(tx.value),
    }
}

/// Pending blocks have no number or hash yet and are rejected.
fn to_execution_block<TX>(
    block: Block<TX>,
    transactions: Vec<ExecutionTransaction>,
) -> Result<ExecutionBlock, ExecutionClientError> {
    let number = block.number.ok_or(ExecutionClientError::IncompleteBlock { field: "number" })?;
    let hash = block.hash.ok_or(ExecutionClientError::IncompleteBlock { field: "hash" })?;
    let miner = block.author.ok_or(ExecutionClientError::IncompleteBlock { field: "miner" })?;

    Ok(ExecutionBlock {
        number: number.as_u64(),
        hash: B256::from(hash.0),
        miner: Address::from(miner.0),
        uncles: block.uncles.into_iter().map(|uncle| B256::from(uncle.0)).collect(),
        transactions,
    })
}

#[cfg(test)]
mod rpc_client_tests {
    use alloy_primitives::{address, b256};
    use mockito::Matcher;
    use serde_json::{json, Value};

    use super::*;

    const BLOCK_HASH: &str = "0xa917fcc721a5465a484e9be17cda0cc5493933dd3bc70c9adbee192cb419c9d7";
    const UNCLE_HASH: &str = "0x88e96d4537bea4d9c05d12549907b32561d3bf31f45aae734cdc119f13406cb6";
    const MINER: &str = "0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5";

    fn rpc_result(result: Value) -> String {
        json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
    }

    fn block_json(transactions: Value) -> Value {
        json!({
            "baseFeePerGas": "0x7",
            "difficulty": "0x0",
            "extraData": "0x",
            "gasLimit": "0x1c9c380",
            "gasUsed": "0xa410",
            "hash": BLOCK_HASH,
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "miner": MINER,
            "mixHash": format!("0x{}", "0".repeat(64)),
            "nonce": "0x0000000000000000",
            "number": "0x10d4f",
            "parentHash": "0xf1009b1ca7be5f9ff2b47402e47ef876641e8f4e479ff21826476663d018cbed",
            "receiptsRoot": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
            "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
            "size": "0x2c4",
            "stateRoot": "0xf0dd85c94810e2c5b606c4c337b9a8b961b45196cda3bd656db8d669189036f5",
            "timestamp": "0x6553f100",
            "totalDifficulty": "0xc70d815d562d3cfa955",
            "transactions": transactions,
            "transactionsRoot": "0xb0476286e5cb428531b4d941958a3ae3c5ea01eeb773a9d3c3fd83f097c44afb",
            "uncles": [UNCLE_HASH],
        })
    }

    fn transaction_json(hash: &str, to: &str, value: &str) -> Value {
        json!({
            "blockHash": BLOCK_HASH,
            "blockNumber": "0x10d4f",
            "from": MINER,
            "gas": "0x5208",
            "gasPrice": "0x4a817c800",
            "hash": hash,
            "input": "0x",
            "nonce": "0x15",
            "to": to,
            "transactionIndex": "0x0",
            "value": value,
            "type": "0x0",
            "chainId": "0x1",
            "v": "0x25",
            "r": "0x1b5e176d927f8e9ab405058b2d2457392da3e20f328b16ddabcebc33eaac5fea",
            "s": "0x4ba69724e8f69de52f0125ad8b3c5c2cef33019bac3249e2c0a2192766d1721c",
        })
    }

    #[tokio::test]
    async fn test_get_balance_ok() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBalance",
                "params": [MINER, "0x10d4f"],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_result(json!("0xde0b6b3a7640000")))
            .create_async()
            .await;

        let client = ExecutionRpcClient::from_endpoint_str(&server.url()).unwrap();
        let balance = client
            .get_balance(address!("95222290dd7278aa3ddd389cc1e1d165cc4bafe5"), 68943)
            .await
            .unwrap();

        assert_eq!(balance, U256::from(1_000_000_000_000_000_000u64));
    }

    #[tokio::test]
    async fn test_get_block_by_hash_with_transactions() {
        let mut server = mockito::Server::new_async().await;
        let transactions = json!([
            transaction_json(
                "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060",
                "0x5df9b87991262f6ba471f09758cde1c0fc1de734",
                "0x7a69",
            ),
            transaction_json(
                "0x6c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060",
                "0xfefefefefefefefefefefefefefefefefefefefe",
                "0xde0b6b3a7640000",
            ),
        ]);
        let _mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBlockByHash",
                "params": [BLOCK_HASH, true],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_result(block_json(transactions)))
            .create_async()
            .await;

        let client = ExecutionRpcClient::from_endpoint_str(&server.url()).unwrap();
        let block = client
            .get_block_by_hash(
                b256!("a917fcc721a5465a484e9be17cda0cc5493933dd3bc70c9adbee192cb419c9d7"),
                true,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(block.number, 68943);
        assert_eq!(block.miner, address!("95222290dd7278aa3ddd389cc1e1d165cc4bafe5"));
        assert_eq!(block.transactions.len(), 2);

        let last = block.last_transaction().unwrap();
        assert_eq!(last.value, U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(last.to, Some(Address::repeat_byte(0xfe)));
        assert_eq!(last.from, block.miner);
    }

    #[tokio::test]
    async fn test_get_block_by_hash_without_transactions() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBlockByHash",
                "params": [BLOCK_HASH, false],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_result(block_json(json!([
                "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060"
            ]))))
            .create_async()
            .await;

        let client = ExecutionRpcClient::from_endpoint_str(&server.url()).unwrap();
        let block = client
            .get_block_by_hash(
                b256!("a917fcc721a5465a484e9be17cda0cc5493933dd3bc70c9adbee192cb419c9d7"),
                false,
            )
            .await
            .unwrap()
            .unwrap();

        assert!(block.transactions.is_empty());
        assert!(block.last_transaction().is_none());
        assert!(block.has_uncle(&b256!(
            "88e96d4537bea4d9c05d12549907b32561d3bf31f45aae734cdc119f13406cb6"
        )));
    }

    #[tokio::test]
    async fn test_get_block_by_number_null_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBlockByNumber",
                "params": ["0x1c9c380", false],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_result(Value::Null))
            .create_async()
            .await;

        let client = ExecutionRpcClient::from_endpoint_str(&server.url()).unwrap();
        let block = client.get_block_by_number(30_000_000, false).await.unwrap();

        assert!(block.is_none());
    }

    #[tokio::test]
    async fn test_pending_block_is_rejected() {
        let mut pending = block_json(json!([]));
        pending["number"] = Value::Null;
        pending["hash"] = Value::Null;

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_result(pending))
            .create_async()
            .await;

        let client = ExecutionRpcClient::from_endpoint_str(&server.url()).unwrap();
        let err = client.get_block_by_number(68943, false).await.unwrap_err();

        assert!(matches!(err, ExecutionClientError::IncompleteBlock { field: "number" }));
    }

    #[tokio::test]
    async fn test_rpc_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"header not found"}}"#)
            .create_async()
            .await;

        let client = ExecutionRpcClient::from_endpoint_str(&server.url()).unwrap();
        let err = client.get_balance(Address::ZERO, 1).await.unwrap_err();

        match err {
            ExecutionClientError::Rpc { code, message } => {
                assert_eq!(code, -32000);
                assert_eq!(message, "header not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_gateway() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(502)
            .with_body("502 Bad Gateway")
            .create_async()
            .await;

        let client = ExecutionRpcClient::from_endpoint_str(&server.url()).unwrap();
        let err = client.get_block_by_number(1, false).await.unwrap_err();

        assert!(matches!(err, ExecutionClientError::Provider(_)));
    }
}
