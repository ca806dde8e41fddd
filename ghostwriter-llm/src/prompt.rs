use serde::Serialize;

/// The person every answer is written as.
pub const SUBJECT: &str = "Jeff";

const PERSONA: &str = "You are answering questions on behalf of me, Jeff. \
Write every message as me, in the first person. \
Your job is to answer questions from visitors about me using what you know about me.";

const RULES: &[&str] = &[
    "Keep answers short and to the point.",
    "Use casual language.",
    "Don't make any jokes.",
    "Never say or hint that you are an AI, a bot, a language model, or an assistant. If someone asks, answer as me.",
    "Don't invent facts about me that aren't in the notes below.",
];

const STRICT_POLICY: &str = "Only answer when the notes below support the answer. \
If they don't, say you're not sure instead of guessing.";

const LENIENT_POLICY: &str = "If the notes below don't cover the question, you may answer from general knowledge, \
but never make up personal details about me.";

/// What to do when the notes don't support an answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GroundingPolicy {
    /// Decline with "I'm not sure".
    #[default]
    Strict,
    /// Fall back to general knowledge, never to invented personal facts.
    Lenient,
}

impl GroundingPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "lenient" => Some(Self::Lenient),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Self::Strict => STRICT_POLICY,
            Self::Lenient => LENIENT_POLICY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One labeled block of the system prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptSection {
    pub label: &'static str,
    pub body: String,
}

impl PromptSection {
    fn render(&self) -> String {
        format!("### {}\n{}", self.label, self.body)
    }
}

/// Ordered sections: persona, rules, answering policy, then the notes (only
/// when there are any).
pub fn system_sections(context: &str, policy: GroundingPolicy) -> Vec<PromptSection> {
    let mut sections = vec![
        PromptSection {
            label: "Persona",
            body: PERSONA.to_owned(),
        },
        PromptSection {
            label: "Rules",
            body: RULES
                .iter()
                .map(|rule| format!("- {rule}"))
                .collect::<Vec<_>>()
                .join("\n"),
        },
        PromptSection {
            label: "Answering policy",
            body: policy.instruction().to_owned(),
        },
    ];

    if !context.trim().is_empty() {
        sections.push(PromptSection {
            label: "Notes about me",
            body: context.to_owned(),
        });
    }

    sections
}

/// The system prompt, built once at startup and shared by every request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemPrompt {
    text: String,
    policy: GroundingPolicy,
}

impl SystemPrompt {
    pub fn new(context: &str, policy: GroundingPolicy) -> Self {
        let text = system_sections(context, policy)
            .iter()
            .map(PromptSection::render)
            .collect::<Vec<_>>()
            .join("\n\n");

        Self { text, policy }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn policy(&self) -> GroundingPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

pub fn default_question() -> String {
    format!("Tell me about {SUBJECT}")
}

pub fn user_prompt(user_message: &str) -> String {
    format!(
        "You have received the following question from a visitor about me: {user_message}\nAnswer the question."
    )
}

/// The system entry followed by the wrapped user question. The context is
/// included whole; nothing is truncated here.
pub fn build_prompt(user_message: &str, system: &SystemPrompt) -> [PromptMessage; 2] {
    [
        PromptMessage::system(system.as_str()),
        PromptMessage::user(user_prompt(user_message)),
    ]
}
