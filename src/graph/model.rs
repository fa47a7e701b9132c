use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use super::GraphError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ServiceType {
    Http,
    MySql,
    Redis,
    Grpc,
    #[default]
    Unknown,
    Other(String),
}

impl From<String> for ServiceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "HTTP" => Self::Http,
            "MySQL" => Self::MySql,
            "Redis" => Self::Redis,
            "gRPC" => Self::Grpc,
            "" => Self::Unknown,
            _ => Self::Other(value),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("HTTP"),
            Self::MySql => f.write_str("MySQL"),
            Self::Redis => f.write_str("Redis"),
            Self::Grpc => f.write_str("gRPC"),
            Self::Unknown => f.write_str("unknown"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ServiceNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "k8namespace")]
    pub namespace: String,
    #[serde(default, alias = "k8cluster", alias = "clusters")]
    pub cluster: String,
    #[serde(default, rename = "serviceType")]
    pub service_type: ServiceType,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub invocations: u64,
    #[serde(default)]
    pub errors: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ServiceLink {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub invocations: u64,
    /// Milliseconds. Only used for the link tint.
    #[serde(default)]
    pub latency: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEnd {
    Source,
    Target,
}

impl fmt::Display for LinkEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedLink {
    pub source: usize,
    pub target: usize,
    pub invocations: u64,
    pub latency: f64,
}

pub(super) fn resolve_links(
    nodes: &[ServiceNode],
    links: &[ServiceLink],
) -> Result<Vec<ResolvedLink>, GraphError> {
    let mut index_by_id = HashMap::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        if index_by_id.insert(node.id.as_str(), index).is_some() {
            return Err(GraphError::DuplicateNode {
                id: node.id.clone(),
            });
        }
    }

    let lookup = |link_index: usize, end: LinkEnd, id: &str| {
        index_by_id
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode {
                link: link_index,
                end,
                id: id.to_owned(),
            })
    };

    links
        .iter()
        .enumerate()
        .map(|(link_index, link)| {
            Ok(ResolvedLink {
                source: lookup(link_index, LinkEnd::Source, &link.source)?,
                target: lookup(link_index, LinkEnd::Target, &link.target)?,
                invocations: link.invocations,
                latency: link.latency,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn node(id: &str, invocations: u64, errors: u64) -> ServiceNode {
    ServiceNode {
        id: id.to_owned(),
        name: id.to_owned(),
        namespace: "default".to_owned(),
        cluster: "local".to_owned(),
        service_type: ServiceType::Http,
        port: None,
        invocations,
        errors,
    }
}

#[cfg(test)]
pub(crate) fn link(source: &str, target: &str, invocations: u64, latency: f64) -> ServiceLink {
    ServiceLink {
        source: source.to_owned(),
        target: target.to_owned(),
        invocations,
        latency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_type_matches_exact_names_only() {
        assert_eq!(ServiceType::from("HTTP".to_owned()), ServiceType::Http);
        assert_eq!(ServiceType::from("MySQL".to_owned()), ServiceType::MySql);
        assert_eq!(ServiceType::from("Redis".to_owned()), ServiceType::Redis);
        assert_eq!(ServiceType::from("gRPC".to_owned()), ServiceType::Grpc);
        assert_eq!(ServiceType::from(String::new()), ServiceType::Unknown);
        assert_eq!(
            ServiceType::from("http".to_owned()),
            ServiceType::Other("http".to_owned())
        );
        assert_eq!(
            ServiceType::from("GRPC-web".to_owned()),
            ServiceType::Other("GRPC-web".to_owned())
        );
    }

    #[test]
    fn resolves_links_to_indices() {
        let nodes = vec![node("a", 1, 0), node("b", 1, 0), node("c", 1, 0)];
        let links = vec![link("c", "a", 4, 20.0), link("a", "b", 9, 300.0)];

        let resolved = resolve_links(&nodes, &links).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!((resolved[0].source, resolved[0].target), (2, 0));
        assert_eq!((resolved[1].source, resolved[1].target), (0, 1));
        assert_eq!(resolved[1].invocations, 9);
    }

    #[test]
    fn unknown_target_is_a_construction_error() {
        let nodes = vec![node("a", 1, 0)];
        let links = vec![link("a", "ghost", 1, 1.0)];

        let error = resolve_links(&nodes, &links).unwrap_err();
        assert_eq!(
            error,
            GraphError::UnknownNode {
                link: 0,
                end: LinkEnd::Target,
                id: "ghost".to_owned(),
            }
        );
    }

    #[test]
    fn unknown_source_is_reported_before_target() {
        let nodes = vec![node("a", 1, 0)];
        let links = vec![link("a", "a", 1, 1.0), link("x", "y", 1, 1.0)];

        let error = resolve_links(&nodes, &links).unwrap_err();
        assert!(matches!(
            error,
            GraphError::UnknownNode { link: 1, end: LinkEnd::Source, .. }
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let nodes = vec![node("a", 1, 0), node("a", 2, 0)];
        let error = resolve_links(&nodes, &[]).unwrap_err();
        assert_eq!(error, GraphError::DuplicateNode { id: "a".to_owned() });
    }
}
