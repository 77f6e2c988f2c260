//! Client side of the procedure API: a typed HTTP client and the auth state
//! hook built on top of it.

pub mod api;
pub mod hook;
pub mod login;
pub mod navigator;
pub mod storage;

pub use api::{ApiError, AuthApi, RpcClient};
pub use hook::{AuthHook, AuthOptions, AuthState, USER_INFO_KEY};
pub use login::LoginUrl;
pub use navigator::{Headless, Navigator};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};
