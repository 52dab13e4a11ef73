//! Resolution of peer services to network endpoints
//!
//! Peers are looked up in a static table which carries a local and a clustered address for
//! every service. The [`Environment`] the process runs in decides which one is used. Resolution
//! is deterministic and never touches the network.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Entity which describes a service that can be resolved
pub trait ServiceDescriptor: Clone {
    /// Unique identifier of the service type
    fn service_identifier(&self) -> String;
}

/// Deployment flavour which selects the address set used for peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Services run next to each other on a single host
    Development,
    /// Services run in a cluster and are addressed by their service hostnames
    Production,
}

impl Environment {
    /// Interprets the environment flag, anything but `production` is treated as development
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_flag(s))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Network location of a peer's remote call contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    service_name: String,
    contract_name: String,
    host: String,
    port: u16,
}

impl ServiceEndpoint {
    /// Creates a new instance from raw parts
    pub fn new(
        service_name: impl Into<String>,
        contract_name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            contract_name: contract_name.into(),
            host: host.into(),
            port,
        }
    }

    /// Logical name of the service
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Name of the contract served at this endpoint
    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    /// Hostname or IP address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` representation
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.contract_name, self.authority())
    }
}

/// Table entry of a [`StaticServiceResolver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPeer {
    /// Contract the peer serves
    pub contract: String,
    /// Hostname used in [`Environment::Development`]
    pub local_host: String,
    /// Hostname used in [`Environment::Production`]
    pub cluster_host: String,
    /// Port, identical in both environments
    pub port: u16,
}

/// Errors raised during resolution
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Service is not contained in the table
    #[error("no endpoint known for service {0:?}")]
    UnknownService(String),
}

/// Resolver backed by a static `service name -> address` table
#[derive(Debug, Clone)]
pub struct StaticServiceResolver {
    environment: Environment,
    peers: HashMap<String, StaticPeer>,
}

impl StaticServiceResolver {
    /// Creates an empty resolver for the given environment
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            peers: HashMap::new(),
        }
    }

    /// Adds or replaces a table entry
    pub fn with_peer(mut self, service_name: impl Into<String>, peer: StaticPeer) -> Self {
        self.peers.insert(service_name.into(), peer);
        self
    }

    /// Environment the resolver selects addresses for
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Looks up the endpoint of a service by name
    pub fn resolve(&self, service_name: &str) -> Result<ServiceEndpoint, ResolveError> {
        let peer = self
            .peers
            .get(service_name)
            .ok_or_else(|| ResolveError::UnknownService(service_name.to_owned()))?;

        let host = match self.environment {
            Environment::Development => &peer.local_host,
            Environment::Production => &peer.cluster_host,
        };

        Ok(ServiceEndpoint::new(
            service_name,
            peer.contract.clone(),
            host.clone(),
            peer.port,
        ))
    }

    /// Looks up the endpoint of a described service
    pub fn resolve_service<D: ServiceDescriptor>(
        &self,
        service: &D,
    ) -> Result<ServiceEndpoint, ResolveError> {
        self.resolve(&service.service_identifier())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver(environment: Environment) -> StaticServiceResolver {
        StaticServiceResolver::new(environment).with_peer(
            "inventory",
            StaticPeer {
                contract: "inventory.Inventory".into(),
                local_host: "localhost".into(),
                cluster_host: "inventory-svc".into(),
                port: 7000,
            },
        )
    }

    #[test]
    fn select_clustered_address_in_production() {
        let endpoint = resolver(Environment::Production)
            .resolve("inventory")
            .unwrap();

        assert_eq!(
            endpoint,
            ServiceEndpoint::new("inventory", "inventory.Inventory", "inventory-svc", 7000)
        );
    }

    #[test]
    fn select_local_address_otherwise() {
        let endpoint = resolver(Environment::Development)
            .resolve("inventory")
            .unwrap();

        assert_eq!(endpoint.authority(), "localhost:7000");
        assert_eq!(endpoint.to_string(), "inventory.Inventory@localhost:7000");
    }

    #[test]
    fn fail_closed_on_unknown_services() {
        for environment in [Environment::Development, Environment::Production] {
            assert_eq!(
                resolver(environment).resolve("billing"),
                Err(ResolveError::UnknownService("billing".into()))
            );
        }
    }

    #[test]
    fn parse_environment_flags() {
        assert_eq!(Environment::from_flag("production"), Environment::Production);
        assert_eq!(Environment::from_flag(" PRODUCTION "), Environment::Production);
        assert_eq!(Environment::from_flag("staging"), Environment::Development);
        assert_eq!(Environment::from_flag(""), Environment::Development);
        assert_eq!("development".parse::<Environment>(), Ok(Environment::Development));
    }
}
