use chatrelay_core::{RelayError, RelayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Coze,
    Lmsys,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Coze => "coze",
            BackendKind::Lmsys => "lmsys",
        }
    }
}

/// Backend selected for a request plus the backend-native model name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    pub kind: BackendKind,
    /// Empty for plain `coze`, which uses the connector's default bot.
    pub model: String,
}

impl BackendTarget {
    /// Reads `coze`, `coze/<bot>` or `lmsys/<model>`.
    pub fn resolve(model: &str) -> RelayResult<Self> {
        let (prefix, rest) = match model.split_once('/') {
            Some((prefix, rest)) => (prefix, Some(rest)),
            None => (model, None),
        };
        match (prefix, rest) {
            ("coze", None) => Ok(Self {
                kind: BackendKind::Coze,
                model: String::new(),
            }),
            ("coze", Some(bot)) if !bot.is_empty() => Ok(Self {
                kind: BackendKind::Coze,
                model: bot.to_string(),
            }),
            ("lmsys", Some(name)) if !name.is_empty() => Ok(Self {
                kind: BackendKind::Lmsys,
                model: name.to_string(),
            }),
            _ => Err(RelayError::Unsupported(format!(
                "model '{model}' is not supported"
            ))),
        }
    }
}
