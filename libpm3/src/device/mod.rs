// libpm3/src/device/mod.rs

pub mod builder;
pub mod handle;
pub mod hf14a;
pub mod middleware;
pub mod session;

pub use builder::DeviceBuilder;
pub use handle::{Connected, Device, Disconnected};
pub use hf14a::{Activate, RawOptions, RawResponse};
pub use middleware::{Interceptor, ReceiveNext, SendNext, TrafficLogger};
pub use session::{CancelToken, Expect, Session, SessionConfig, WaitRequest};
