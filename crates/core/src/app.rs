//! Cloud assembly output.
//!
//! [`App`] is the synthesis entry point: it holds stacks, renders each to
//! a template file under the output directory, and writes a manifest
//! naming the templates and their content digests. The assembly is what
//! an operator feeds to the provisioning engine's deploy command.

use crate::config::{NbstackConfig, TemplateFormat};
use crate::stack::Stack;
use crate::synth::synthesize;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

const MANIFEST_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize)]
pub struct TemplateArtifact {
    pub file: String,
    pub digest: String,
}

#[derive(Debug, Serialize)]
struct Manifest {
    version: String,
    artifacts: BTreeMap<String, TemplateArtifact>,
}

/// Paths and digests of a completed synthesis.
#[derive(Debug)]
pub struct CloudAssembly {
    pub directory: PathBuf,
    pub templates: BTreeMap<String, TemplateArtifact>,
}

pub struct App {
    out_dir: PathBuf,
    format: TemplateFormat,
    stacks: Vec<Stack>,
}

impl App {
    pub fn new() -> Self {
        let config = NbstackConfig::default();
        Self {
            out_dir: config.out_dir,
            format: config.format,
            stacks: Vec::new(),
        }
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn with_format(mut self, format: TemplateFormat) -> Self {
        self.format = format;
        self
    }

    pub fn add_stack(&mut self, stack: Stack) {
        self.stacks.push(stack);
    }

    pub fn synth(&self) -> Result<CloudAssembly> {
        fs::create_dir_all(&self.out_dir).with_context(|| {
            format!("failed to create output directory {}", self.out_dir.display())
        })?;

        let mut templates = BTreeMap::new();
        for stack in &self.stacks {
            let template = synthesize(stack)?;
            let rendered = match self.format {
                TemplateFormat::Json => template.to_json()?,
                TemplateFormat::Yaml => template.to_yaml()?,
            };
            let file = format!("{}.template.{}", stack.name(), self.format.extension());
            let path = self.out_dir.join(&file);
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write template {}", path.display()))?;

            let digest = template.digest()?;
            info!(stack = stack.name(), file = %path.display(), %digest, "wrote template");
            templates.insert(stack.name().to_string(), TemplateArtifact { file, digest });
        }

        let manifest = Manifest {
            version: MANIFEST_VERSION.to_string(),
            artifacts: templates.clone(),
        };
        let manifest_path = self.out_dir.join("manifest.json");
        let mut manifest_json = serde_json::to_string_pretty(&manifest)
            .context("failed to serialize assembly manifest")?;
        manifest_json.push('\n');
        fs::write(&manifest_path, manifest_json)
            .with_context(|| format!("failed to write manifest {}", manifest_path.display()))?;

        Ok(CloudAssembly {
            directory: self.out_dir.clone(),
            templates,
        })
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
