//! Stateful text transformers applied to backend output in arrival order.

/// What a matcher lets through for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutput {
    pub text: String,
    /// End the stream after forwarding `text`.
    pub stop: bool,
}

impl MatchOutput {
    pub fn forward(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            stop: false,
        }
    }

    pub fn stop(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            stop: true,
        }
    }
}

pub trait Matcher: Send {
    /// `final_flush` is true exactly once, after the backend closed its
    /// channel; buffered text must be released then.
    fn transform(&mut self, fragment: &str, final_flush: bool) -> MatchOutput;
}

/// Ordered matchers; each one sees the previous one's output.
#[derive(Default)]
pub struct MatcherChain {
    matchers: Vec<Box<dyn Matcher>>,
    flushed: bool,
}

impl MatcherChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<M: Matcher + 'static>(&mut self, matcher: M) -> &mut Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    pub fn with<M: Matcher + 'static>(mut self, matcher: M) -> Self {
        self.push(matcher);
        self
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn apply(&mut self, fragment: &str) -> MatchOutput {
        let mut text = fragment.to_string();
        for index in 0..self.matchers.len() {
            if text.is_empty() {
                return MatchOutput::default();
            }
            let out = self.matchers[index].transform(&text, false);
            if out.stop {
                // Matchers after the cut get their one final call now.
                return MatchOutput::stop(self.flush_from(index + 1, out.text));
            }
            text = out.text;
        }
        MatchOutput::forward(text)
    }

    /// Final flush; every matcher is called with `final_flush=true` at most once.
    pub fn flush(&mut self) -> MatchOutput {
        if self.flushed {
            return MatchOutput::default();
        }
        let mut text = String::new();
        for index in 0..self.matchers.len() {
            let out = self.matchers[index].transform(&text, true);
            if out.stop {
                self.flushed = true;
                return MatchOutput::stop(out.text);
            }
            text = out.text;
        }
        self.flushed = true;
        MatchOutput::forward(text)
    }

    fn flush_from(&mut self, start: usize, mut text: String) -> String {
        self.flushed = true;
        for matcher in self.matchers.iter_mut().skip(start) {
            text = matcher.transform(&text, true).text;
        }
        text
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of a needle.
fn partial_suffix_len<S: AsRef<str>>(text: &str, needles: &[S]) -> usize {
    let mut best = 0;
    for needle in needles {
        let needle = needle.as_ref();
        for len in (1..needle.len()).rev() {
            if len <= best {
                break;
            }
            if needle.is_char_boundary(len) && text.ends_with(&needle[..len]) {
                best = len;
                break;
            }
        }
    }
    best
}

/// Cuts the stream at the first stop sequence, across fragment boundaries.
#[derive(Debug, Clone)]
pub struct StopSequenceMatcher {
    stops: Vec<String>,
    pending: String,
}

impl StopSequenceMatcher {
    pub fn new<I, S>(stops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stops: stops
                .into_iter()
                .map(Into::into)
                .filter(|stop: &String| !stop.is_empty())
                .collect(),
            pending: String::new(),
        }
    }

    fn earliest_match(&self) -> Option<usize> {
        self.stops
            .iter()
            .filter_map(|stop| self.pending.find(stop.as_str()))
            .min()
    }
}

impl Matcher for StopSequenceMatcher {
    fn transform(&mut self, fragment: &str, final_flush: bool) -> MatchOutput {
        self.pending.push_str(fragment);
        if let Some(pos) = self.earliest_match() {
            let text = self.pending[..pos].to_string();
            self.pending.clear();
            return MatchOutput::stop(text);
        }
        if final_flush {
            return MatchOutput::forward(std::mem::take(&mut self.pending));
        }
        let keep = partial_suffix_len(&self.pending, &self.stops);
        let split = self.pending.len() - keep;
        MatchOutput::forward(self.pending.drain(..split).collect::<String>())
    }
}

/// Replaces every occurrence of a literal pattern, across fragment boundaries.
#[derive(Debug, Clone)]
pub struct ReplaceMatcher {
    pattern: String,
    replacement: String,
    pending: String,
}

impl ReplaceMatcher {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            pending: String::new(),
        }
    }
}

impl Matcher for ReplaceMatcher {
    fn transform(&mut self, fragment: &str, final_flush: bool) -> MatchOutput {
        if self.pattern.is_empty() {
            return MatchOutput::forward(fragment);
        }
        self.pending.push_str(fragment);
        let mut out = String::new();
        while let Some(pos) = self.pending.find(self.pattern.as_str()) {
            out.push_str(&self.pending[..pos]);
            out.push_str(&self.replacement);
            self.pending.drain(..pos + self.pattern.len());
        }
        let keep = if final_flush {
            0
        } else {
            partial_suffix_len(&self.pending, std::slice::from_ref(&self.pattern))
        };
        let split = self.pending.len() - keep;
        out.extend(self.pending.drain(..split));
        MatchOutput::forward(out)
    }
}
