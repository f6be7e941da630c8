pub mod proxy;

pub use proxy::{ECHO_HEADER, RelayState, SPECIALIZED_HEADER, build_matchers, relay_router, request_hints};
