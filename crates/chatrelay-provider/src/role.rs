/// Trailing text every tagged turn ends with.
pub const TAGGED_TERMINATOR: &str = "<|end|>\n\n";

const HUMAN_PREFIX: &str = "\n\nHuman: ";
const ASSISTANT_PREFIX: &str = "\n\nAssistant: ";

pub fn is_claude(model: &str) -> bool {
    model.to_ascii_lowercase().contains("claude")
}

/// How a role becomes text inside a flattened transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTemplate {
    /// `Human:` / `Assistant:` turns with no terminator; system text is bare.
    Claude,
    /// `<|role|>` header line and `<|end|>` terminator.
    Tagged,
}

impl RoleTemplate {
    pub fn for_model(model: &str) -> Self {
        if is_claude(model) {
            RoleTemplate::Claude
        } else {
            RoleTemplate::Tagged
        }
    }

    pub fn is_claude(self) -> bool {
        self == RoleTemplate::Claude
    }

    /// Prefix and terminator for one turn of `role`.
    pub fn convert(self, role: &str) -> (String, &'static str) {
        match self {
            RoleTemplate::Claude => {
                let prefix = match role {
                    "system" => "",
                    "assistant" => ASSISTANT_PREFIX,
                    _ => HUMAN_PREFIX,
                };
                (prefix.to_string(), "")
            }
            RoleTemplate::Tagged => (format!("<|{role}|>\n"), TAGGED_TERMINATOR),
        }
    }

    pub fn render(self, role: &str, content: &str) -> String {
        let (prefix, terminator) = self.convert(role);
        format!("{prefix}{content}{terminator}")
    }
}
