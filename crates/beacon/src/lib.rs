pub mod beacon_client;
pub mod error;
pub mod mock_beacon_client;
pub mod traits;
pub mod types;

pub use beacon_client::BeaconClient;
pub use error::BeaconClientError;
pub use mock_beacon_client::MockBeaconClient;
pub use traits::*;
