//! Prompt rendering for every generation step.
//!
//! Templates live in `io/prompts/` and are embedded at compile time. Each step
//! renders a system message and a user message.

use minijinja::{Environment, context};

use crate::backend::ChatMessage;
use crate::core::types::SpecItem;

const TEMPLATES: [(&str, &str); 8] = [
    (
        "specification_system",
        include_str!("prompts/specification_system.md"),
    ),
    (
        "specification_user",
        include_str!("prompts/specification_user.md"),
    ),
    ("case_list_system", include_str!("prompts/case_list_system.md")),
    ("case_list_user", include_str!("prompts/case_list_user.md")),
    ("cases_system", include_str!("prompts/cases_system.md")),
    ("cases_user", include_str!("prompts/cases_user.md")),
    ("code_system", include_str!("prompts/code_system.md")),
    ("code_user", include_str!("prompts/code_user.md")),
];

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
    extra: Option<String>,
}

impl PromptEngine {
    /// Build the engine. `extra` is appended to every user prompt.
    pub fn new(extra: Option<String>) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        let extra = extra
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        Ok(Self { env, extra })
    }

    pub fn specification(
        &self,
        subject: &str,
        code: &str,
    ) -> Result<Vec<ChatMessage>, minijinja::Error> {
        self.pair(
            "specification",
            context! {
                subject => subject,
                code => code,
                extra => self.extra.as_deref(),
            },
        )
    }

    pub fn case_list(
        &self,
        subject: &str,
        code: &str,
        description: Option<&str>,
    ) -> Result<Vec<ChatMessage>, minijinja::Error> {
        self.pair(
            "case_list",
            context! {
                subject => subject,
                code => code,
                description => description.map(str::trim).filter(|s| !s.is_empty()),
                extra => self.extra.as_deref(),
            },
        )
    }

    pub fn cases(
        &self,
        subject: &str,
        code: &str,
        list: &str,
    ) -> Result<Vec<ChatMessage>, minijinja::Error> {
        self.pair(
            "cases",
            context! {
                subject => subject,
                code => code,
                list => list.trim(),
                extra => self.extra.as_deref(),
            },
        )
    }

    pub fn code(
        &self,
        item: &SpecItem,
        subject: &str,
        code: &str,
        package: &str,
    ) -> Result<Vec<ChatMessage>, minijinja::Error> {
        let instructions: Vec<&str> = item
            .instructions
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect();
        self.pair(
            "code",
            context! {
                name => &item.name,
                instructions => instructions,
                subject => subject,
                code => code,
                package => package,
                extra => self.extra.as_deref(),
            },
        )
    }

    fn pair(
        &self,
        step: &str,
        ctx: minijinja::Value,
    ) -> Result<Vec<ChatMessage>, minijinja::Error> {
        let system = self
            .env
            .get_template(&format!("{step}_system"))?
            .render(&ctx)?;
        let user = self
            .env
            .get_template(&format!("{step}_user"))?
            .render(&ctx)?;
        Ok(vec![
            ChatMessage::system(system.trim()),
            ChatMessage::user(user.trim()),
        ])
    }
}
