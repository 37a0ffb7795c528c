mod adapter;
mod dispatch;
mod reachable;
mod serial;
mod ssh;

pub use adapter::DeviceAdapter;
pub use dispatch::{profile_for, DeviceProfile, SshMode};
