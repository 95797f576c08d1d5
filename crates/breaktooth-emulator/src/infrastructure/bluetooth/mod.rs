//! Linux Bluetooth adapters: BlueZ over D-Bus, kernel L2CAP sockets and the
//! `l2ping` utility.

pub mod bluez;
pub mod l2cap_probe;
pub mod l2ping;

pub use bluez::{BluezPlatform, L2capChannel};
pub use l2cap_probe::{L2capProbeSocket, L2capProbeSockets};
pub use l2ping::L2pingProbe;
