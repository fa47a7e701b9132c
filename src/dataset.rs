use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::graph::{ServiceLink, ServiceNode};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub nodes: Vec<ServiceNode>,
    #[serde(default)]
    pub links: Vec<ServiceLink>,
}

impl Dataset {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("dataset is not a valid topology document")
    }
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let dataset = Dataset::from_json(&text)
        .with_context(|| format!("failed to parse dataset {}", path.display()))?;

    info!(
        path = %path.display(),
        nodes = dataset.nodes.len(),
        links = dataset.links.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

pub fn describe_node(node: &ServiceNode) -> String {
    let mut text = format!(
        "{}\nNamespace: {}\nCluster: {}\nInvocations: {}\nErrors: {}",
        node.name, node.namespace, node.cluster, node.invocations, node.errors
    );
    if let Some(port) = node.port {
        text.push_str(&format!("\nPort: {port}"));
    }
    text
}
