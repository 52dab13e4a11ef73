//! Static locations of the services

use super::contract::{PRODUCT_CONTRACT, USER_CONTRACT};
use library::communication::discovery::{
    Environment, ServiceDescriptor, StaticPeer, StaticServiceResolver,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Services which serve a remote call contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerService {
    /// Owner of user resources
    Users,
    /// Owner of product resources
    Products,
}

impl PeerService {
    /// Every known peer
    pub const ALL: [PeerService; 2] = [PeerService::Users, PeerService::Products];

    fn peer(&self) -> StaticPeer {
        let (contract, cluster_host, port) = match self {
            PeerService::Users => (USER_CONTRACT, "service1", 5000),
            PeerService::Products => (PRODUCT_CONTRACT, "service2", 5001),
        };

        StaticPeer {
            contract: contract.into(),
            local_host: "localhost".into(),
            cluster_host: cluster_host.into(),
            port,
        }
    }

    /// Port the service listens on for remote calls
    pub fn port(&self) -> u16 {
        self.peer().port
    }
}

impl ServiceDescriptor for PeerService {
    fn service_identifier(&self) -> String {
        match self {
            PeerService::Users => "user-service".into(),
            PeerService::Products => "product-service".into(),
        }
    }
}

/// Raised when parsing an unknown service name
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown service {0:?}, expected one of user-service, product-service")]
pub struct UnknownPeerService(String);

impl FromStr for PeerService {
    type Err = UnknownPeerService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PeerService::ALL
            .iter()
            .find(|service| service.service_identifier() == s)
            .copied()
            .ok_or_else(|| UnknownPeerService(s.to_owned()))
    }
}

/// Resolver containing every [`PeerService`]
pub fn resolver(environment: Environment) -> StaticServiceResolver {
    PeerService::ALL
        .iter()
        .fold(StaticServiceResolver::new(environment), |resolver, service| {
            resolver.with_peer(service.service_identifier(), service.peer())
        })
}

#[cfg(test)]
mod does {
    use super::*;
    use library::communication::discovery::ResolveError;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolve_local_addresses_in_development() {
        let resolver = resolver(Environment::Development);

        let users = resolver.resolve_service(&PeerService::Users).unwrap();
        let products = resolver.resolve_service(&PeerService::Products).unwrap();

        assert_eq!(users.authority(), "localhost:5000");
        assert_eq!(users.contract_name(), "user.UserService");
        assert_eq!(products.authority(), "localhost:5001");
        assert_eq!(products.contract_name(), "product.ProductService");
    }

    #[test]
    fn resolve_cluster_addresses_in_production() {
        let resolver = resolver(Environment::Production);

        assert_eq!(
            resolver.resolve("user-service").unwrap().authority(),
            "service1:5000"
        );
        assert_eq!(
            resolver.resolve("product-service").unwrap().authority(),
            "service2:5001"
        );
    }

    #[test]
    fn fail_on_unknown_services() {
        assert_eq!(
            resolver(Environment::Production).resolve("order-service"),
            Err(ResolveError::UnknownService("order-service".into()))
        );
        assert!("order-service".parse::<PeerService>().is_err());
    }

    #[test]
    fn parse_service_names() {
        assert_eq!("user-service".parse(), Ok(PeerService::Users));
        assert_eq!("product-service".parse(), Ok(PeerService::Products));
    }
}
