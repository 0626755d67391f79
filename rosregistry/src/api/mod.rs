pub use self::master::Master;
pub use self::node::Node;
pub use self::slave::{ServerState, Slave, Topic};

pub mod client;
pub mod error;
pub mod master;
mod node;
pub mod resolve;
pub mod slave;
