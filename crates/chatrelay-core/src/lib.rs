pub mod consume;
pub mod context;
pub mod error;
pub mod fragment;
pub mod matcher;
pub mod response;
pub mod sink;
pub mod tokens;
pub mod validate;

pub use consume::{wait_message, wait_response};
pub use context::{RequestContext, RequestHints};
pub use error::{RelayError, RelayResult};
pub use fragment::{Fragment, FragmentReceiver, FragmentSender, fragment_channel};
pub use matcher::{MatchOutput, Matcher, MatcherChain, ReplaceMatcher, StopSequenceMatcher};
pub use sink::{ResponseHead, ResponseReceiver, ResponseSink};
pub use tokens::{TokenEstimator, usage_for};
pub use validate::validate_messages;
