use tokio::sync::mpsc;

const ERROR_PREFIX: &str = "error: ";
const TEXT_PREFIX: &str = "text: ";

/// One unit delivered by a backend connector.
///
/// End-of-stream is not a variant: the producer signals it by dropping its
/// sender, after which every receive observes closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Error(String),
}

impl Fragment {
    /// Reads the legacy `"error: "` / `"text: "` prefix convention.
    ///
    /// Unprefixed values are plain text; a prefix with nothing after it is
    /// empty text or an empty error message, never a parse failure.
    pub fn parse(raw: &str) -> Self {
        if let Some(message) = raw.strip_prefix(ERROR_PREFIX) {
            return Fragment::Error(message.to_string());
        }
        Fragment::Text(raw.strip_prefix(TEXT_PREFIX).unwrap_or(raw).to_string())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Fragment::Text(value.into())
    }

    pub fn error(value: impl Into<String>) -> Self {
        Fragment::Error(value.into())
    }
}

impl From<String> for Fragment {
    fn from(value: String) -> Self {
        Fragment::parse(&value)
    }
}

impl From<&str> for Fragment {
    fn from(value: &str) -> Self {
        Fragment::parse(value)
    }
}

pub type FragmentSender = mpsc::Sender<Fragment>;
pub type FragmentReceiver = mpsc::Receiver<Fragment>;

pub fn fragment_channel(capacity: usize) -> (FragmentSender, FragmentReceiver) {
    mpsc::channel(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_prefixes() {
        assert_eq!(Fragment::parse("text: Hel"), Fragment::text("Hel"));
        assert_eq!(Fragment::parse("error: quota exceeded"), Fragment::error("quota exceeded"));
        assert_eq!(Fragment::parse("plain"), Fragment::text("plain"));
        assert_eq!(Fragment::parse("text: "), Fragment::text(""));
        assert_eq!(Fragment::parse("error: "), Fragment::error(""));
    }

    #[test]
    fn prefix_only_stripped_once() {
        assert_eq!(Fragment::parse("text: text: x"), Fragment::text("text: x"));
    }
}
