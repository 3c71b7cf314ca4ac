//! Prompt templates for each session kind.
//!
//! Prompt content is opaque to the loop controller; this module only knows
//! how to produce the string for a given [`SessionKind`]. Templates are
//! embedded at compile time and rendered with minijinja so the checklist and
//! spec file names stay in one place.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::types::SessionKind;
use crate::io::checklist_store::FEATURE_LIST_FILE;
use crate::io::spec_seed::{APP_SPEC_FILE, ENHANCEMENT_SPEC_FILE};

const INITIALIZER_TEMPLATE: &str = include_str!("prompts/initializer.md");
const ADOPTION_TEMPLATE: &str = include_str!("prompts/adoption.md");
const ENHANCEMENT_TEMPLATE: &str = include_str!("prompts/enhancement.md");
const CODING_TEMPLATE: &str = include_str!("prompts/coding.md");
const APP_SPEC_TEMPLATE: &str = include_str!("prompts/app_spec.md");

/// Template engine wrapper around minijinja.
pub struct PromptSet {
    env: Environment<'static>,
}

impl PromptSet {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("initializer", INITIALIZER_TEMPLATE)
            .expect("initializer template should be valid");
        env.add_template("adoption", ADOPTION_TEMPLATE)
            .expect("adoption template should be valid");
        env.add_template("enhancement", ENHANCEMENT_TEMPLATE)
            .expect("enhancement template should be valid");
        env.add_template("coding", CODING_TEMPLATE)
            .expect("coding template should be valid");
        env.add_template("app_spec", APP_SPEC_TEMPLATE)
            .expect("app spec template should be valid");
        Self { env }
    }

    /// Render the prompt for a session kind.
    pub fn prompt_for(&self, kind: SessionKind) -> Result<String> {
        let name = match kind {
            SessionKind::Initializer => "initializer",
            SessionKind::AdoptionInitializer => "adoption",
            SessionKind::EnhancementInitializer => "enhancement",
            SessionKind::Coding => "coding",
        };
        let template = self
            .env
            .get_template(name)
            .with_context(|| format!("load {name} template"))?;
        let rendered = template
            .render(context! {
                feature_list => FEATURE_LIST_FILE,
                app_spec => APP_SPEC_FILE,
                enhancement_spec => ENHANCEMENT_SPEC_FILE,
            })
            .with_context(|| format!("render {name} template"))?;
        Ok(rendered)
    }

    /// Expand a free-text description into a full app specification.
    pub fn render_app_spec(&self, description: &str, feature_count: u32) -> Result<String> {
        let template = self.env.get_template("app_spec").context("load app spec template")?;
        let rendered = template
            .render(context! {
                description => description,
                feature_count => feature_count,
            })
            .context("render app spec template")?;
        Ok(rendered)
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new()
    }
}
