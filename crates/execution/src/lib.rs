pub mod error;
pub mod mock_execution_client;
pub mod multi_execution_client;
pub mod rpc_client;
pub mod traits;

pub use error::ExecutionClientError;
pub use mock_execution_client::MockExecutionClient;
pub use multi_execution_client::MultiExecutionClient;
pub use rpc_client::ExecutionRpcClient;
pub use traits::*;
